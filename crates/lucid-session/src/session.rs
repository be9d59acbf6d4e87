//! Session types: the record of who we are logged in as, and where.
//!
//! A "session" is the client's single record of:
//! - WHICH credential is presented on every authorized request
//! - WHERE the server lives, and the version banner it answered with
//! - WHETHER the address should survive a logout
//! - a `loading` flag for long feature calls (never persisted)

use std::fmt;
use std::time::Duration;

use lucid_protocol::ServerAddress;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session transitions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on each validator probe (endpoint check, credential
    /// check). An endpoint probe that runs out of time fails with
    /// `EndpointUnreachable`, a credential probe with `TokenInvalid`.
    ///
    /// Default: 10 seconds.
    pub probe_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(10),
        }
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// An opaque bearer credential.
///
/// `Debug` never prints the secret, so sessions can be logged freely.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw credential, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// The server address together with its validated identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    /// Validated server address.
    pub address: Option<ServerAddress>,
    /// Banner returned by the last successful endpoint probe.
    pub version: Option<String>,
    /// Keep `address` across logouts.
    pub remember: bool,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The client's session record.
///
/// Fields are private: the only writer is
/// [`SessionStore`](crate::SessionStore), through its named transitions.
/// Everyone else gets read-only views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    credential: Option<Credential>,
    endpoint: Endpoint,
    loading: bool,
}

impl Session {
    /// Rebuilds a session from its persisted projection.
    ///
    /// A projection holding a credential and an address but no version
    /// banner can't have come from a validated login; the credential is
    /// dropped so that "logged in" always implies "endpoint validated".
    pub fn restore(persisted: PersistedSession) -> Self {
        let PersistedSession {
            mut credential,
            endpoint,
        } = persisted;

        if credential.is_some()
            && endpoint.address.is_some()
            && endpoint.version.is_none()
        {
            tracing::warn!(
                "restored credential has no validated endpoint version, dropping it"
            );
            credential = None;
        }

        Self {
            credential,
            endpoint,
            loading: false,
        }
    }

    /// The part of the session that survives restarts. `loading` is left out.
    pub fn to_persisted(&self) -> PersistedSession {
        PersistedSession {
            credential: self.credential.clone(),
            endpoint: self.endpoint.clone(),
        }
    }

    // -- Derived views ----------------------------------------------------

    /// Credential and address both present.
    pub fn is_logged_in(&self) -> bool {
        self.credential.is_some() && self.endpoint.address.is_some()
    }

    pub fn current_address(&self) -> Option<&ServerAddress> {
        self.endpoint.address.as_ref()
    }

    pub fn current_version(&self) -> Option<&str> {
        self.endpoint.version.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn remember_endpoint(&self) -> bool {
        self.endpoint.remember
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    // -- Mutations (store only) -------------------------------------------

    pub(crate) fn commit_login(
        &mut self,
        address: ServerAddress,
        version: String,
        credential: Credential,
        remember: bool,
    ) {
        self.credential = Some(credential);
        self.commit_endpoint(address, version, remember);
    }

    pub(crate) fn commit_endpoint(
        &mut self,
        address: ServerAddress,
        version: String,
        remember: bool,
    ) {
        self.endpoint = Endpoint {
            address: Some(address),
            version: Some(version),
            remember,
        };
    }

    pub(crate) fn refresh_version(&mut self, version: String) {
        self.endpoint.version = Some(version);
    }

    /// Logout reset: credential and version always go; the address and
    /// the remember flag go only when the address wasn't remembered.
    pub(crate) fn reset(&mut self) {
        self.credential = None;
        self.endpoint.version = None;
        if !self.endpoint.remember {
            self.endpoint.address = None;
            self.endpoint.remember = false;
        }
    }

    pub(crate) fn set_loading(&mut self, loading: bool) -> bool {
        let changed = self.loading != loading;
        self.loading = loading;
        changed
    }
}

// ---------------------------------------------------------------------------
// PersistedSession
// ---------------------------------------------------------------------------

/// The serializable projection handed to a persistence backend.
///
/// ```json
/// { "credential": "abc", "endpoint": { "address": "http://x", "version": "Lucid Version 0.1.2", "remember": true } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedSession {
    pub credential: Option<Credential>,
    pub endpoint: Endpoint,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the session stands, as seen from outside the store.
///
/// ```text
///   LoggedOut ──(login)──→ Validating ──(ok)──→ LoggedIn
///       ↑                      │                    │
///       └────────(error)───────┘                    │
///       └──────────────(logout / failed resume)─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    /// A transition is in flight.
    Validating,
    LoggedIn,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggedOut => write!(f, "LoggedOut"),
            Self::Validating => write!(f, "Validating"),
            Self::LoggedIn => write!(f, "LoggedIn"),
        }
    }
}

// ---------------------------------------------------------------------------
// NavigationIntent / ResumeOutcome
// ---------------------------------------------------------------------------

/// An instruction for whatever owns the views. The store never navigates
/// itself; it queues these and moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationIntent {
    /// Show the home view (after a successful login).
    Home,
    /// Show the login view, with the reason when the logout was forced.
    Login { reason: Option<String> },
}

/// What `resume_check` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// Nothing to resume: credential or address missing. No network call.
    Skipped,
    /// The persisted session is still valid; `version` is the fresh banner.
    Resumed { version: String },
    /// Validation failed and the session was reset.
    LoggedOut { reason: String },
    /// The store was closed while validating; nothing was applied.
    Discarded,
}
