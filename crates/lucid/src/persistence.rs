//! Durable storage for the session projection.
//!
//! The session store never touches storage. The client root hydrates it
//! from a [`PersistenceAdapter`] at startup and an autosave task writes
//! every committed change back, off the mutation path.

use std::collections::BTreeMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lucid_protocol::{Codec, JsonCodec, ProtocolError, STATE_KEY};
use lucid_session::{PersistedSession, Session};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Errors raised by persistence backends.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("state file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: ProtocolError,
    },

    #[error("could not encode session state: {0}")]
    Encode(#[source] ProtocolError),
}

/// Loads and saves the session projection.
pub trait PersistenceAdapter: Send + Sync + 'static {
    /// The last saved projection, or `None` when nothing was saved yet.
    fn load(
        &self,
    ) -> impl Future<Output = Result<Option<PersistedSession>, PersistenceError>> + Send;

    /// Replaces the saved projection.
    fn save(
        &self,
        projection: &PersistedSession,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

impl<P: PersistenceAdapter> PersistenceAdapter for Arc<P> {
    fn load(
        &self,
    ) -> impl Future<Output = Result<Option<PersistedSession>, PersistenceError>> + Send {
        (**self).load()
    }

    fn save(
        &self,
        projection: &PersistedSession,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send {
        (**self).save(projection)
    }
}

// ---------------------------------------------------------------------------
// FileStateStore
// ---------------------------------------------------------------------------

/// Keeps the projection in a JSON file, under the same key the web UI
/// used in browser storage:
///
/// ```json
/// { "lucid-webui-state": { "credential": "abc", "endpoint": { ... } } }
/// ```
///
/// Writes go to a sibling temp file that is then renamed over the
/// target, so a crash mid-write leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
    codec: JsonCodec,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            codec: JsonCodec,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PersistenceAdapter for FileStateStore {
    async fn load(&self) -> Result<Option<PersistedSession>, PersistenceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let mut document: BTreeMap<String, PersistedSession> =
            self.codec.decode(&bytes).map_err(|source| PersistenceError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        Ok(document.remove(STATE_KEY))
    }

    async fn save(&self, projection: &PersistedSession) -> Result<(), PersistenceError> {
        let document = BTreeMap::from([(STATE_KEY, projection)]);
        let bytes = self.codec.encode(&document).map_err(PersistenceError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::trace!(path = %self.path.display(), "session state written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStateStore
// ---------------------------------------------------------------------------

/// Keeps the projection in memory. For tests and hosts with no disk.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    saved: Mutex<Option<PersistedSession>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `projection`, as if saved by an earlier run.
    pub fn with_saved(projection: PersistedSession) -> Self {
        Self {
            saved: Mutex::new(Some(projection)),
        }
    }

    /// The currently saved projection.
    pub async fn saved(&self) -> Option<PersistedSession> {
        self.saved.lock().await.clone()
    }
}

impl PersistenceAdapter for MemoryStateStore {
    async fn load(&self) -> Result<Option<PersistedSession>, PersistenceError> {
        Ok(self.saved.lock().await.clone())
    }

    async fn save(&self, projection: &PersistedSession) -> Result<(), PersistenceError> {
        *self.saved.lock().await = Some(projection.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Hydration and autosave
// ---------------------------------------------------------------------------

/// Builds the startup session from whatever `adapter` holds. Load
/// failures are logged and fall back to a logged-out session.
pub(crate) async fn hydrate<P: PersistenceAdapter>(adapter: &P) -> Session {
    match adapter.load().await {
        Ok(Some(projection)) => {
            tracing::debug!("session state restored");
            Session::restore(projection)
        }
        Ok(None) => Session::default(),
        Err(e) => {
            tracing::warn!(error = %e, "could not restore session state, starting logged out");
            Session::default()
        }
    }
}

/// Spawns the task that saves every committed projection change.
///
/// Whatever `session` holds when this is called is taken as already
/// saved; every later change is compared against it. Toggling `loading` alone doesn't trigger a save. A failed save is
/// logged and retried on the next change; it never reaches the caller
/// of the transition that caused it.
pub(crate) fn spawn_autosave<P: PersistenceAdapter>(
    adapter: Arc<P>,
    mut session: watch::Receiver<Session>,
) -> JoinHandle<()> {
    let mut last_saved = session.borrow_and_update().to_persisted();

    tokio::spawn(async move {
        while session.changed().await.is_ok() {
            let current = session.borrow_and_update().to_persisted();
            if current == last_saved {
                continue;
            }
            match adapter.save(&current).await {
                Ok(()) => {
                    tracing::debug!("session state saved");
                    last_saved = current;
                }
                Err(e) => tracing::error!(error = %e, "failed to save session state"),
            }
        }

        tracing::debug!("autosave stopped");
    })
}
