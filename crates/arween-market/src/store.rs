//! Snapshot persistence.
//!
//! The whole [`AppState`] is one JSON document. [`JsonFileStore`] writes it to
//! a sibling temporary file and renames it over the target, so a crash mid-save
//! leaves the previous snapshot intact.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::snapshot::AppState;

/// Errors raised by snapshot stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("snapshot I/O failed at {path}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The stored document is not a valid snapshot.
    #[error("snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Loads and saves whole snapshots.
pub trait SnapshotStore {
    /// Returns the stored snapshot, or `None` if nothing has been saved yet.
    fn load(&self) -> Result<Option<AppState>, StoreError>;

    /// Replaces the stored snapshot.
    fn save(&self, state: &AppState) -> Result<(), StoreError>;
}

/// Stores the snapshot as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store at `path`. Nothing is read or written until used.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<AppState>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let state = serde_json::from_str(&raw)?;
        debug!(path = %self.path.display(), "snapshot loaded");
        Ok(Some(state))
    }

    fn save(&self, state: &AppState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), jobs = state.jobs.len(), "snapshot saved");
        Ok(())
    }
}

/// Keeps the snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<AppState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<AppState>, StoreError> {
        Ok(self.state.lock().clone())
    }

    fn save(&self, state: &AppState) -> Result<(), StoreError> {
        *self.state.lock() = Some(state.clone());
        Ok(())
    }
}
