//! The session store: the one owner of the session record.
//!
//! Responsibilities:
//! - Running validators during `login`, `set_endpoint` and `resume_check`
//! - Committing the results, or leaving the session untouched on failure
//! - Queueing navigation intents for whoever renders views
//! - Publishing every committed change to read-only subscribers
//!
//! # Concurrency note
//!
//! At most one transition runs at a time. A second `login` or
//! `set_endpoint` while one is in flight is rejected with
//! [`SessionError::SessionBusy`]; `logout` and `resume_check` wait their
//! turn instead. Either way two transitions never interleave, so an older
//! login can't land on top of a newer one.
//!
//! The record itself lives in a `tokio::sync::watch` channel. Read views
//! borrow it synchronously and never wait on a transition.

use std::sync::atomic::{AtomicBool, Ordering};

use lucid_protocol::ServerAddress;
use tokio::sync::{mpsc, watch, Mutex};

use crate::{
    Credential, EndpointValidator, NavigationIntent, ResumeOutcome, Session,
    SessionConfig, SessionError, SessionState, TokenValidator,
};

/// Receiving half of the navigation intent queue.
pub type NavigationReceiver = mpsc::UnboundedReceiver<NavigationIntent>;

/// Owns the [`Session`] and every transition that changes it.
///
/// ## Lifecycle
///
/// ```text
///            set_endpoint()
///               ┌────┐
///               ▼    │
/// [LoggedOut] ──────login()──────→ [LoggedIn]
///      ▲                               │
///      └────logout() / failed resume───┘
/// ```
pub struct SessionStore<E, T> {
    session: watch::Sender<Session>,

    /// Held for the whole duration of a transition.
    transition: Mutex<()>,

    closed: AtomicBool,
    navigation: mpsc::UnboundedSender<NavigationIntent>,
    endpoint_validator: E,
    token_validator: T,
    config: SessionConfig,
}

impl<E: EndpointValidator, T: TokenValidator> SessionStore<E, T> {
    /// Creates a store around an initial session (restored or default).
    ///
    /// Returns the store and the receiver its navigation intents are
    /// queued on.
    pub fn new(
        config: SessionConfig,
        initial: Session,
        endpoint_validator: E,
        token_validator: T,
    ) -> (Self, NavigationReceiver) {
        let (session, _) = watch::channel(initial);
        let (navigation, intents) = mpsc::unbounded_channel();
        let store = Self {
            session,
            transition: Mutex::new(()),
            closed: AtomicBool::new(false),
            navigation,
            endpoint_validator,
            token_validator,
            config,
        };
        (store, intents)
    }

    // =====================================================================
    // Transitions
    // =====================================================================

    /// Validates `address` and `credential`, then logs in.
    ///
    /// On success the session holds the credential, the address, the
    /// fresh version banner and `remember`, and a [`NavigationIntent::Home`]
    /// is queued. On failure nothing changes.
    ///
    /// # Errors
    /// - [`SessionError::SessionBusy`]: another transition is running
    /// - [`SessionError::AlreadyLoggedIn`]: log out first
    /// - any validator error, unchanged
    /// - [`SessionError::Closed`]: the store was closed
    pub async fn login(
        &self,
        address: ServerAddress,
        credential: Credential,
        remember: bool,
    ) -> Result<Session, SessionError> {
        let _guard = self
            .transition
            .try_lock()
            .map_err(|_| SessionError::SessionBusy)?;
        self.ensure_open()?;
        if self.is_logged_in() {
            return Err(SessionError::AlreadyLoggedIn);
        }

        tracing::info!(%address, remember, "login started");

        let version = match self.validate(&address, &credential).await {
            Ok(version) => version,
            Err(e) => {
                tracing::warn!(%address, error = %e, "login failed");
                return Err(e);
            }
        };
        self.ensure_open()?;

        self.session.send_modify(|s| {
            s.commit_login(address.clone(), version, credential, remember);
        });
        tracing::info!(%address, "logged in");
        self.navigate(NavigationIntent::Home);

        Ok(self.snapshot())
    }

    /// Validates and records an endpoint without logging in.
    ///
    /// This is the first half of a two-step login screen: pick a server,
    /// see its version, then enter a credential.
    ///
    /// # Errors
    /// Same as [`login`](Self::login), minus credential failures.
    pub async fn set_endpoint(
        &self,
        address: ServerAddress,
        remember: bool,
    ) -> Result<Session, SessionError> {
        let _guard = self
            .transition
            .try_lock()
            .map_err(|_| SessionError::SessionBusy)?;
        self.ensure_open()?;
        if self.is_logged_in() {
            return Err(SessionError::AlreadyLoggedIn);
        }

        let version = self.probe_endpoint(&address).await?;
        self.ensure_open()?;

        self.session
            .send_modify(|s| s.commit_endpoint(address.clone(), version, remember));
        tracing::info!(%address, remember, "endpoint set");

        Ok(self.snapshot())
    }

    /// Re-validates a restored session. Call once at startup.
    ///
    /// Never fails: a validation error is turned into a logout plus a
    /// [`NavigationIntent::Login`] carrying the reason. Waits for any
    /// in-flight transition before starting.
    pub async fn resume_check(&self) -> ResumeOutcome {
        let _guard = self.transition.lock().await;
        if self.is_closed() {
            return ResumeOutcome::Discarded;
        }

        let (address, credential) = {
            let session = self.session.borrow();
            match (session.current_address(), session.credential()) {
                (Some(address), Some(credential)) => {
                    (address.clone(), credential.clone())
                }
                _ => {
                    tracing::debug!("nothing to resume");
                    return ResumeOutcome::Skipped;
                }
            }
        };

        tracing::info!(%address, "resuming session");
        let result = self.validate(&address, &credential).await;

        if self.is_closed() {
            tracing::debug!(%address, "store closed during resume, discarding result");
            return ResumeOutcome::Discarded;
        }

        match result {
            Ok(version) => {
                self.session.send_modify(|s| s.refresh_version(version.clone()));
                tracing::info!(%address, "session resumed");
                ResumeOutcome::Resumed { version }
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(%address, error = %reason, "resume failed, logging out");
                self.session.send_modify(Session::reset);
                self.navigate(NavigationIntent::Login {
                    reason: Some(reason.clone()),
                });
                ResumeOutcome::LoggedOut { reason }
            }
        }
    }

    /// Logs out. Waits for any in-flight transition, then always succeeds.
    ///
    /// Clears the credential and version; clears the address and the
    /// remember flag too unless the address was remembered.
    pub async fn logout(&self) -> Session {
        let _guard = self.transition.lock().await;
        self.session.send_modify(Session::reset);
        tracing::info!("logged out");
        self.navigate(NavigationIntent::Login { reason: None });
        self.snapshot()
    }

    /// Toggles the busy flag. Independent of authentication and never
    /// blocked by a running transition.
    pub fn set_loading(&self, loading: bool) {
        self.session.send_if_modified(|s| s.set_loading(loading));
    }

    /// Tears the store down. Validations still in flight finish, but
    /// their results are thrown away.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("session store closed");
        }
    }

    // =====================================================================
    // Read views
    // =====================================================================

    pub fn is_logged_in(&self) -> bool {
        self.session.borrow().is_logged_in()
    }

    pub fn current_address(&self) -> Option<ServerAddress> {
        self.session.borrow().current_address().cloned()
    }

    pub fn current_version(&self) -> Option<String> {
        self.session.borrow().current_version().map(str::to_owned)
    }

    pub fn is_loading(&self) -> bool {
        self.session.borrow().is_loading()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// A copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.session.borrow().clone()
    }

    /// `Validating` while a transition holds the lock, otherwise derived
    /// from the session.
    pub fn state(&self) -> SessionState {
        if self.transition.try_lock().is_err() {
            SessionState::Validating
        } else if self.is_logged_in() {
            SessionState::LoggedIn
        } else {
            SessionState::LoggedOut
        }
    }

    /// A read-only handle that sees every committed change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // =====================================================================
    // Internals
    // =====================================================================

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_closed() {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    fn navigate(&self, intent: NavigationIntent) {
        if self.navigation.send(intent).is_err() {
            tracing::debug!("navigation receiver dropped, intent ignored");
        }
    }

    /// Endpoint probe, then credential probe. Returns the banner.
    async fn validate(
        &self,
        address: &ServerAddress,
        credential: &Credential,
    ) -> Result<String, SessionError> {
        let version = self.probe_endpoint(address).await?;
        self.probe_token(address, credential).await?;
        Ok(version)
    }

    async fn probe_endpoint(
        &self,
        address: &ServerAddress,
    ) -> Result<String, SessionError> {
        let timeout = self.config.probe_timeout;
        match tokio::time::timeout(timeout, self.endpoint_validator.validate(address))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(SessionError::EndpointUnreachable {
                address: address.clone(),
                reason: format!("no answer within {timeout:?}"),
            }),
        }
    }

    async fn probe_token(
        &self,
        address: &ServerAddress,
        credential: &Credential,
    ) -> Result<(), SessionError> {
        let timeout = self.config.probe_timeout;
        match tokio::time::timeout(
            timeout,
            self.token_validator.validate(address, credential),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SessionError::TokenInvalid {
                status: None,
                message: format!("credential check timed out after {timeout:?}"),
            }),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
