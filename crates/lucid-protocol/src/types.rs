//! Wire conventions shared by every Lucid request.

use lucid_transport::HttpResponse;
use serde::{Deserialize, Serialize};

/// Address used when nothing else is configured.
pub const DEFAULT_SERVER_URI: &str = "http://localhost:7090";

/// Sentinel path answering with the server's version banner.
pub const VERSION_PATH: [&str; 2] = ["ui", "version"];

/// Sentinel path that answers 2xx only for an accepted bearer credential.
pub const CHECK_TOKEN_PATH: [&str; 1] = ["check-token"];

/// Path segment under which keys live (`{address}/kv/{key}`).
pub const KV_PATH: &str = "kv";

/// Every genuine version banner starts with this.
pub const VERSION_SIGNATURE: &str = "Lucid Version";

/// Key under which the session projection is kept in durable storage.
pub const STATE_KEY: &str = "lucid-webui-state";

/// The JSON body Lucid uses for both errors and acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Pulls the `message` out of a `{"message": ...}` response body.
///
/// Returns `None` for empty bodies, non-JSON bodies, or JSON of any other
/// shape.
pub fn error_message(response: &HttpResponse) -> Option<String> {
    response.json::<ErrorBody>().ok().map(|b| b.message)
}

/// Formats the `Authorization` header value for a credential.
pub fn bearer(credential: &str) -> String {
    format!("Bearer {credential}")
}

/// Key-level operations accepted by `PATCH {address}/kv/{key}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyOperation {
    Lock,
    Unlock,
}

/// Body of a `PATCH` key request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchBody {
    pub operation: KeyOperation,
}
