//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use lucid_protocol::ServerAddress;
use lucid_session::SessionConfig;

use crate::LucidError;

/// Environment variable overriding [`ClientConfig::server_uri`].
pub const ENV_SERVER_URI: &str = "LUCID_SERVER_URI";
/// Environment variable overriding [`ClientConfig::state_path`].
pub const ENV_STATE_FILE: &str = "LUCID_STATE_FILE";
/// Environment variable overriding [`ClientConfig::probe_timeout`], in seconds.
pub const ENV_PROBE_TIMEOUT_SECS: &str = "LUCID_PROBE_TIMEOUT_SECS";

/// Configuration for a [`LucidClient`](crate::LucidClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Address offered on the login screen when none is remembered.
    ///
    /// Default: `http://localhost:7090`.
    pub server_uri: ServerAddress,

    /// Where the session projection is kept between runs. `None` keeps
    /// it in memory only.
    ///
    /// Default: `None`.
    pub state_path: Option<PathBuf>,

    /// Upper bound on each validator probe.
    ///
    /// Default: 10 seconds.
    pub probe_timeout: Duration,

    /// Per-request timeout applied by the HTTP client. `None` leaves
    /// requests unbounded (validator probes are still bounded by
    /// `probe_timeout`).
    ///
    /// Default: 30 seconds.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_uri: ServerAddress::default(),
            state_path: None,
            probe_timeout: SessionConfig::default().probe_timeout,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `LUCID_SERVER_URI`, `LUCID_STATE_FILE` and
    /// `LUCID_PROBE_TIMEOUT_SECS` when set.
    ///
    /// # Errors
    /// [`LucidError::Config`] when a variable is set but unusable.
    pub fn from_env() -> Result<Self, LucidError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LucidError> {
        let mut config = Self::default();

        if let Some(uri) = lookup(ENV_SERVER_URI) {
            config.server_uri = ServerAddress::parse(&uri)
                .map_err(|e| LucidError::Config(format!("{ENV_SERVER_URI}: {e}")))?;
        }
        if let Some(path) = lookup(ENV_STATE_FILE).filter(|p| !p.is_empty()) {
            config.state_path = Some(PathBuf::from(path));
        }
        if let Some(secs) = lookup(ENV_PROBE_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                LucidError::Config(format!("{ENV_PROBE_TIMEOUT_SECS}={secs:?}: {e}"))
            })?;
            if secs == 0 {
                return Err(LucidError::Config(format!(
                    "{ENV_PROBE_TIMEOUT_SECS} must be at least 1"
                )));
            }
            config.probe_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// The session-layer slice of this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            probe_timeout: self.probe_timeout,
        }
    }
}
