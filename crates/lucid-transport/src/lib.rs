//! HTTP transport abstraction for the Lucid client.
//!
//! Provides the [`HttpTransport`] trait that every network-facing piece of
//! the client goes through, plus the plain request/response types it
//! exchanges. Nothing above this crate touches a socket directly, which is
//! what lets tests swap in a recording transport and count calls.
//!
//! # Feature Flags
//!
//! - `reqwest` (default): [`ReqwestTransport`], backed by `reqwest` with rustls

mod error;
#[cfg(feature = "reqwest")]
mod reqwest_transport;

pub use error::TransportError;
#[cfg(feature = "reqwest")]
pub use reqwest_transport::ReqwestTransport;

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use url::Url;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// HTTP methods understood by the Lucid key-value surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
    Put,
    Delete,
    Post,
    Patch,
}

impl Method {
    /// Returns the canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Post => "POST",
            Self::Patch => "PATCH",
        }
    }

    /// `true` for methods that must never carry a request body.
    pub fn forbids_body(&self) -> bool {
        matches!(self, Self::Get | Self::Delete | Self::Head)
    }

    /// `true` for methods that are meaningless without a body.
    pub fn requires_body(&self) -> bool {
        matches!(self, Self::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = TransportError;

    /// Parses a method name case-insensitively (`"put"` and `"PUT"` are
    /// the same method).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "POST" => Ok(Self::Post),
            "PATCH" => Ok(Self::Patch),
            other => Err(TransportError::InvalidRequest(format!(
                "unsupported HTTP method {other:?}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

/// An outbound HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    /// Header pairs in insertion order. Names are compared
    /// case-insensitively by [`HttpRequest::header`].
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Sets a header, replacing any existing header with the same name.
    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Looks up a header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response that completed at the HTTP level (any status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with the given status and body and no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parses the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Looks up a header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// Sends HTTP requests and returns whatever the server answered.
///
/// A non-2xx status is NOT an error at this layer: it comes back as an
/// ordinary [`HttpResponse`]. `Err` means no response was obtained at all.
pub trait HttpTransport: Send + Sync + 'static {
    /// Sends a request and waits for the complete response.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

impl<T: HttpTransport> HttpTransport for Arc<T> {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).send(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("http://x/kv/foo").unwrap()
    }

    #[test]
    fn test_method_from_str_is_case_insensitive() {
        assert_eq!("put".parse::<Method>().unwrap(), Method::Put);
        assert_eq!("Delete".parse::<Method>().unwrap(), Method::Delete);
        assert_eq!("HEAD".parse::<Method>().unwrap(), Method::Head);
    }

    #[test]
    fn test_method_from_str_unknown_returns_error() {
        let result = "TRACE".parse::<Method>();
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }

    #[test]
    fn test_method_body_rules() {
        for m in [Method::Get, Method::Delete, Method::Head] {
            assert!(m.forbids_body(), "{m} should forbid a body");
            assert!(!m.requires_body());
        }
        assert!(Method::Put.requires_body());
        assert!(!Method::Put.forbids_body());
        assert!(!Method::Patch.forbids_body());
        assert!(!Method::Patch.requires_body());
    }

    #[test]
    fn test_with_header_replaces_same_name_ignoring_case() {
        let req = HttpRequest::new(Method::Get, url())
            .with_header("authorization", "Bearer spoofed")
            .with_header("X-Trace", "1")
            .with_header("Authorization", "Bearer real");

        assert_eq!(req.headers.len(), 2);
        assert_eq!(req.header("AUTHORIZATION"), Some("Bearer real"));
        assert_eq!(req.header("x-trace"), Some("1"));
    }

    #[test]
    fn test_response_is_success_covers_2xx_only() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }

    #[test]
    fn test_response_json_parses_body() {
        let res = HttpResponse::new(404, r#"{"message":"not found"}"#);
        let value: serde_json::Value = res.json().unwrap();
        assert_eq!(value["message"], "not found");
    }

    #[test]
    fn test_response_text_is_lossy() {
        let res = HttpResponse::new(200, vec![b'o', b'k', 0xff]);
        assert_eq!(res.text(), "ok\u{fffd}");
    }
}
