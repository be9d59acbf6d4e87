//! # Lucid
//!
//! Client for the Lucid key-value server.
//!
//! Lucid keeps one validated session against a server: it checks that an
//! address really is a Lucid server, that the server accepts a bearer
//! credential, remembers both across restarts, and routes every
//! `/kv/{key}` request through a gateway that attaches the credential and
//! refuses malformed requests before they reach the network.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lucid::prelude::*;
//!
//! # async fn run() -> Result<(), LucidError> {
//! let config = ClientConfig::from_env()?;
//! let transport = ReqwestTransport::new(config.request_timeout)?;
//! let (client, _intents) = LucidClientBuilder::new()
//!     .config(config)
//!     .build(transport, FileStateStore::new("lucid-state.json"))
//!     .await;
//!
//! client.resume().await;
//! if !client.store().is_logged_in() {
//!     client.login("http://localhost:7090", "my-token", true).await?;
//! }
//! client.gateway().store_any("greeting", "hello").await?;
//! client.shutdown().await
//! # }
//! ```

mod client;
mod config;
mod error;
mod persistence;
mod route;
pub mod telemetry;

pub use client::{HttpSessionStore, LucidClient, LucidClientBuilder};
pub use config::{ClientConfig, ENV_PROBE_TIMEOUT_SECS, ENV_SERVER_URI, ENV_STATE_FILE};
pub use error::LucidError;
pub use persistence::{FileStateStore, MemoryStateStore, PersistenceAdapter, PersistenceError};
pub use route::{Route, RouteGuard};

pub use lucid_gateway as gateway;
pub use lucid_protocol as protocol;
pub use lucid_session as session;
pub use lucid_transport as transport;

/// Everything a host usually needs, in one import.
pub mod prelude {
    pub use crate::{
        ClientConfig, FileStateStore, LucidClient, LucidClientBuilder, LucidError,
        MemoryStateStore, PersistenceAdapter, Route, RouteGuard,
    };
    pub use lucid_gateway::{GatewayError, KvRequest, RequestGateway};
    pub use lucid_protocol::ServerAddress;
    pub use lucid_session::{
        Credential, NavigationIntent, ResumeOutcome, Session, SessionError, SessionState,
    };
    pub use lucid_transport::{HttpResponse, Method, ReqwestTransport};
}
