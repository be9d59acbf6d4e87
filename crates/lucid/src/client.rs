//! `LucidClient` builder and the session context object.
//!
//! This is the entry point for applications. It ties the layers together:
//! transport → protocol → session → gateway, plus persistence.

use std::sync::Arc;
use std::time::Duration;

use lucid_gateway::RequestGateway;
use lucid_protocol::ServerAddress;
use lucid_session::{
    Credential, HttpEndpointValidator, HttpTokenValidator, NavigationReceiver,
    ResumeOutcome, Session, SessionStore,
};
use lucid_transport::HttpTransport;
use tokio::task::JoinHandle;

use crate::persistence::{hydrate, spawn_autosave};
use crate::{ClientConfig, LucidError, PersistenceAdapter, RouteGuard};

/// The session store type a [`LucidClient`] runs, probing over HTTP.
pub type HttpSessionStore<T> = SessionStore<HttpEndpointValidator<T>, HttpTokenValidator<T>>;

/// Builder for configuring and starting a [`LucidClient`].
///
/// # Example
///
/// ```rust,no_run
/// use lucid::prelude::*;
///
/// # async fn run() -> Result<(), LucidError> {
/// let config = ClientConfig::from_env()?;
/// let transport = ReqwestTransport::new(config.request_timeout)?;
/// let (client, _intents) = LucidClientBuilder::new()
///     .config(config)
///     .build(transport, MemoryStateStore::new())
///     .await;
/// client.resume().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct LucidClientBuilder {
    config: ClientConfig,
}

impl LucidClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address offered when none is remembered.
    pub fn server_uri(mut self, address: ServerAddress) -> Self {
        self.config.server_uri = address;
        self
    }

    /// Sets the upper bound on each validator probe.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    /// Hydrates the session from `persistence` and starts autosaving.
    ///
    /// Must be called inside a Tokio runtime. A projection that can't be
    /// loaded is logged and replaced by a logged-out session.
    ///
    /// Returns the client and the receiver its navigation intents are
    /// queued on. Call [`LucidClient::resume`] next to re-validate a
    /// restored session.
    pub async fn build<T, P>(
        self,
        transport: T,
        persistence: P,
    ) -> (LucidClient<T, P>, NavigationReceiver)
    where
        T: HttpTransport + Clone,
        P: PersistenceAdapter,
    {
        let persistence = Arc::new(persistence);
        let initial = hydrate(&*persistence).await;
        tracing::debug!(logged_in = initial.is_logged_in(), "session hydrated");

        let (store, intents) = SessionStore::new(
            self.config.session_config(),
            initial,
            HttpEndpointValidator::new(transport.clone()),
            HttpTokenValidator::new(transport.clone()),
        );
        let gateway = RequestGateway::new(transport, store.subscribe());
        let autosave = spawn_autosave(Arc::clone(&persistence), store.subscribe());

        let client = LucidClient {
            store,
            gateway,
            persistence,
            autosave,
            config: self.config,
        };
        (client, intents)
    }
}

/// The session context object: owns the session store, the request
/// gateway and the persistence backend.
///
/// Create one at the application root with [`LucidClientBuilder`] and
/// pass it (or references to it) to whatever needs the session.
pub struct LucidClient<T, P> {
    store: HttpSessionStore<T>,
    gateway: RequestGateway<T>,
    persistence: Arc<P>,
    autosave: JoinHandle<()>,
    config: ClientConfig,
}

impl<T, P> LucidClient<T, P>
where
    T: HttpTransport + Clone,
    P: PersistenceAdapter,
{
    /// Validates `address` and `credential`, then logs in.
    ///
    /// # Errors
    /// [`LucidError::Protocol`] for an unparsable address, otherwise the
    /// session error from [`SessionStore::login`].
    pub async fn login(
        &self,
        address: &str,
        credential: impl Into<Credential>,
        remember: bool,
    ) -> Result<Session, LucidError> {
        let address = ServerAddress::parse(address)?;
        Ok(self.store.login(address, credential.into(), remember).await?)
    }

    /// Validates and records an endpoint without logging in.
    pub async fn set_endpoint(
        &self,
        address: &str,
        remember: bool,
    ) -> Result<Session, LucidError> {
        let address = ServerAddress::parse(address)?;
        Ok(self.store.set_endpoint(address, remember).await?)
    }

    pub async fn logout(&self) -> Session {
        self.store.logout().await
    }

    /// Re-validates the restored session. Call once after building.
    pub async fn resume(&self) -> ResumeOutcome {
        self.store.resume_check().await
    }

    /// The address to show on the login view: the remembered one, or the
    /// configured default.
    pub fn login_prefill(&self) -> ServerAddress {
        RouteGuard::login_prefill(&self.store.snapshot())
            .unwrap_or_else(|| self.config.server_uri.clone())
    }

    /// A guard that follows this client's session.
    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(self.store.subscribe())
    }

    pub fn store(&self) -> &HttpSessionStore<T> {
        &self.store
    }

    pub fn gateway(&self) -> &RequestGateway<T> {
        &self.gateway
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Saves the current projection right away instead of waiting for
    /// the autosave task.
    pub async fn persist(&self) -> Result<(), LucidError> {
        let projection = self.store.snapshot().to_persisted();
        self.persistence.save(&projection).await?;
        Ok(())
    }

    /// Closes the store, stops autosaving and writes the final projection.
    ///
    /// Validations still in flight elsewhere are discarded by the store.
    pub async fn shutdown(self) -> Result<(), LucidError> {
        self.store.close();
        self.autosave.abort();
        match self.autosave.await {
            Err(e) if !e.is_cancelled() => {
                tracing::warn!(error = %e, "autosave task failed");
            }
            _ => {}
        }

        let projection = self.store.snapshot().to_persisted();
        self.persistence.save(&projection).await?;
        tracing::debug!("client shut down");
        Ok(())
    }
}
