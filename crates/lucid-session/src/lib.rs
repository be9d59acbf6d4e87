//! Session management for the Lucid client.
//!
//! This crate owns the authenticated session against a Lucid server:
//!
//! 1. **Validation**: is the address a Lucid server ([`EndpointValidator`]),
//!    does it accept the credential ([`TokenValidator`])
//! 2. **State**: the [`Session`] record and its persisted projection
//!    ([`PersistedSession`])
//! 3. **Transitions**: login, logout and resume-on-startup, serialized by
//!    the [`SessionStore`]
//!
//! # How it fits in the stack
//!
//! ```text
//! Gateway / client root (above)  ← read the committed session
//!     ↕
//! Session Layer (this crate)     ← validates and commits sessions
//!     ↕
//! Protocol + Transport (below)   ← addresses, sentinel paths, HTTP
//! ```

mod error;
mod session;
mod store;
mod validate;

pub use error::SessionError;
pub use session::{
    Credential, Endpoint, NavigationIntent, PersistedSession, ResumeOutcome,
    Session, SessionConfig, SessionState,
};
pub use store::{NavigationReceiver, SessionStore};
pub use validate::{
    EndpointValidator, HttpEndpointValidator, HttpTokenValidator, TokenValidator,
};
