//! Validation hooks: is this a Lucid server, and does it accept us?
//!
//! The store doesn't probe the network itself. It calls an
//! [`EndpointValidator`] and a [`TokenValidator`], which lets production
//! use the HTTP probes below and tests use stubs that count calls.

use std::future::Future;
use std::sync::Arc;

use lucid_protocol::{
    bearer, error_message, ServerAddress, CHECK_TOKEN_PATH, VERSION_PATH,
    VERSION_SIGNATURE,
};
use lucid_transport::{HttpRequest, HttpTransport, Method};

use crate::{Credential, SessionError};

/// Confirms that an address serves the Lucid API and reports its version.
pub trait EndpointValidator: Send + Sync + 'static {
    /// Probes `address` and returns the full version banner.
    ///
    /// # Errors
    /// - [`SessionError::EndpointUnreachable`]: no response at all
    /// - [`SessionError::EndpointInvalid`]: a response, but not a Lucid one
    fn validate(
        &self,
        address: &ServerAddress,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;
}

/// Confirms that a server accepts a bearer credential.
pub trait TokenValidator: Send + Sync + 'static {
    /// # Errors
    /// [`SessionError::TokenInvalid`] when the server answers non-2xx.
    fn validate(
        &self,
        address: &ServerAddress,
        credential: &Credential,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;
}

impl<V: EndpointValidator> EndpointValidator for Arc<V> {
    fn validate(
        &self,
        address: &ServerAddress,
    ) -> impl Future<Output = Result<String, SessionError>> + Send {
        (**self).validate(address)
    }
}

impl<V: TokenValidator> TokenValidator for Arc<V> {
    fn validate(
        &self,
        address: &ServerAddress,
        credential: &Credential,
    ) -> impl Future<Output = Result<(), SessionError>> + Send {
        (**self).validate(address, credential)
    }
}

// ---------------------------------------------------------------------------
// HTTP implementations
// ---------------------------------------------------------------------------

/// `GET {address}/ui/version`, expecting a 2xx whose body starts with
/// `"Lucid Version"`. A 2xx alone proves nothing: plenty of servers
/// answer 200 to anything.
#[derive(Debug, Clone)]
pub struct HttpEndpointValidator<T> {
    transport: T,
}

impl<T: HttpTransport> HttpEndpointValidator<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: HttpTransport> EndpointValidator for HttpEndpointValidator<T> {
    async fn validate(
        &self,
        address: &ServerAddress,
    ) -> Result<String, SessionError> {
        let invalid = |reason: String| SessionError::EndpointInvalid {
            address: address.clone(),
            reason,
        };

        let url = address.join(VERSION_PATH).map_err(|e| invalid(e.to_string()))?;
        let response = self
            .transport
            .send(HttpRequest::new(Method::Get, url))
            .await
            .map_err(|e| SessionError::EndpointUnreachable {
                address: address.clone(),
                reason: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(invalid(format!(
                "version probe answered with status {}",
                response.status
            )));
        }

        let banner = response.text();
        if !banner.starts_with(VERSION_SIGNATURE) {
            return Err(invalid("version probe answered without a Lucid banner".into()));
        }

        tracing::debug!(%address, version = %banner.trim_end(), "endpoint validated");
        Ok(banner)
    }
}

/// `GET {address}/check-token` with `Authorization: Bearer {credential}`.
#[derive(Debug, Clone)]
pub struct HttpTokenValidator<T> {
    transport: T,
}

impl<T: HttpTransport> HttpTokenValidator<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: HttpTransport> TokenValidator for HttpTokenValidator<T> {
    async fn validate(
        &self,
        address: &ServerAddress,
        credential: &Credential,
    ) -> Result<(), SessionError> {
        let url = address.join(CHECK_TOKEN_PATH).map_err(|e| {
            SessionError::EndpointInvalid {
                address: address.clone(),
                reason: e.to_string(),
            }
        })?;
        let request = HttpRequest::new(Method::Get, url)
            .with_header("Authorization", bearer(credential.expose()));

        // No answer at all is a reachability problem, not a verdict on
        // the credential.
        let response = self.transport.send(request).await.map_err(|e| {
            SessionError::EndpointUnreachable {
                address: address.clone(),
                reason: e.to_string(),
            }
        })?;

        if response.is_success() {
            tracing::debug!(%address, "credential accepted");
            return Ok(());
        }

        let message = error_message(&response)
            .unwrap_or_else(|| "the server rejected the credential".to_owned());
        Err(SessionError::TokenInvalid {
            status: Some(response.status),
            message,
        })
    }
}
