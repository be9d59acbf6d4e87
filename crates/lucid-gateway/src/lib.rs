//! Authorized access to a Lucid server's key-value surface.
//!
//! Every `/kv/{key}` request from the client goes through a
//! [`RequestGateway`]. It reads the committed session, refuses to send
//! anything without one, and injects the bearer credential so feature code
//! never handles it.
//!
//! ```text
//! feature code ──KvRequest──→ RequestGateway ──HttpRequest──→ HttpTransport
//!                                   ↑
//!                      watch::Receiver<Session> (read-only)
//! ```

mod error;
mod gateway;
mod kv;

pub use error::GatewayError;
pub use gateway::{KvRequest, RequestGateway};
