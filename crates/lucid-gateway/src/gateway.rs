//! The request gateway: the only way feature code reaches `/kv/{key}`.

use lucid_protocol::{bearer, error_message, KV_PATH};
use lucid_session::Session;
use lucid_transport::{HttpRequest, HttpResponse, HttpTransport, Method};
use tokio::sync::watch;

use crate::GatewayError;

/// One request against the key-value surface.
///
/// Defaults to `GET` with no body and no extra headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvRequest {
    pub key: String,
    pub method: Method,
    pub body: Option<Vec<u8>>,
    pub headers: Vec<(String, String)>,
}

impl KvRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            method: Method::Get,
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// An empty body counts as no body at all.
    fn has_body(&self) -> bool {
        self.body.as_ref().is_some_and(|b| !b.is_empty())
    }
}

/// Issues authorized requests on behalf of the committed session.
///
/// The gateway only ever reads the session, through a `watch` receiver
/// handed out by the store; it can't change it.
#[derive(Debug, Clone)]
pub struct RequestGateway<T> {
    transport: T,
    session: watch::Receiver<Session>,
}

impl<T: HttpTransport> RequestGateway<T> {
    pub fn new(transport: T, session: watch::Receiver<Session>) -> Self {
        Self { transport, session }
    }

    /// Sends `request` to `{address}/kv/{key}` with the session's bearer
    /// credential.
    ///
    /// Checked locally, in order, before anything is sent:
    /// 1. [`GatewayError::NotAuthenticated`]: no session
    /// 2. [`GatewayError::InvalidRequestShape`]: body with GET/DELETE/HEAD
    /// 3. [`GatewayError::MissingBody`]: PUT without a body
    /// 4. [`GatewayError::InvalidKey`]: the key is `.` or `..`
    ///
    /// Caller headers are sent too, but an `Authorization` header among
    /// them is replaced by the session's.
    ///
    /// # Errors
    /// Besides the above: [`GatewayError::RemoteError`] on a non-2xx
    /// answer, [`GatewayError::Transport`] when there was no answer.
    pub async fn call(&self, request: KvRequest) -> Result<HttpResponse, GatewayError> {
        let (address, credential) = {
            let session = self.session.borrow();
            match (session.current_address(), session.credential()) {
                (Some(address), Some(credential)) => (address.clone(), credential.clone()),
                _ => return Err(GatewayError::NotAuthenticated),
            }
        };

        let method = request.method;
        if method.forbids_body() && request.has_body() {
            return Err(GatewayError::InvalidRequestShape { method });
        }
        if method.requires_body() && !request.has_body() {
            return Err(GatewayError::MissingBody);
        }
        if matches!(request.key.as_str(), "." | "..") {
            return Err(GatewayError::InvalidKey { key: request.key });
        }

        let url = address.join([KV_PATH, request.key.as_str()])?;
        let mut http = HttpRequest::new(method, url);
        for (name, value) in request.headers {
            http = http.with_header(name, value);
        }
        http = http.with_header("Authorization", bearer(credential.expose()));
        if let Some(body) = request.body.filter(|b| !b.is_empty()) {
            http = http.with_body(body);
        }

        let response = self.transport.send(http).await?;
        tracing::debug!(%method, key = %request.key, status = response.status, "kv request");

        if !response.is_success() {
            let message = error_message(&response)
                .unwrap_or_else(|| format!("request failed with status {}", response.status));
            return Err(GatewayError::RemoteError {
                status: response.status,
                message,
            });
        }

        Ok(response)
    }
}
