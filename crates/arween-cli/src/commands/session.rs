//! Snapshot and configuration shared by every command.

use std::path::Path;

use arween_audit::{BoxedAuditLogger, NoopAuditLogger, TracingAuditLogger};
use arween_market::{
    AppState, JsonFileStore, Lifecycle, LedgerReporter, MarketConfig, Shell, SnapshotStore,
};
use tracing::debug;

use crate::error::CliError;

/// Where the snapshot lives and which constants apply to it.
#[derive(Debug, Clone)]
pub struct Session {
    store: JsonFileStore,
    config: MarketConfig,
    audit: bool,
}

impl Session {
    /// Opens a session on `state_path`, reading constants from `config_path`
    /// when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or is invalid.
    pub fn open(state_path: &Path, config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => {
                debug!(path = %path.display(), "loading market config");
                MarketConfig::from_json_file(path)?
            }
            None => MarketConfig::default(),
        };
        Ok(Self::new(JsonFileStore::new(state_path), config))
    }

    /// Creates a session from parts.
    #[must_use]
    pub const fn new(store: JsonFileStore, config: MarketConfig) -> Self {
        Self {
            store,
            config,
            audit: true,
        }
    }

    /// Turns the audit trail on or off for shells opened by this session.
    #[must_use]
    pub const fn with_audit(mut self, enabled: bool) -> Self {
        self.audit = enabled;
        self
    }

    /// Returns true if shells opened by this session write audit events.
    #[must_use]
    pub const fn audits(&self) -> bool {
        self.audit
    }

    /// Active constants.
    #[must_use]
    pub const fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// The snapshot store.
    #[must_use]
    pub const fn store(&self) -> &JsonFileStore {
        &self.store
    }

    /// Engine configured for this session.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::new(self.config.clone())
    }

    /// Opens a shell on `state`, auditing through `tracing` unless auditing
    /// is off.
    #[must_use]
    pub fn shell(&self, state: AppState) -> Shell<BoxedAuditLogger> {
        let audit: BoxedAuditLogger = if self.audit {
            Box::new(TracingAuditLogger::new())
        } else {
            Box::new(NoopAuditLogger::new())
        };
        Shell::new(state, self.lifecycle(), audit)
    }

    /// Local reporter configured for this session.
    #[must_use]
    pub fn reporter(&self) -> LedgerReporter {
        LedgerReporter::new(self.config.clone())
    }

    /// Loads the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::NotInitialized`] if nothing has been saved yet.
    pub fn load(&self) -> Result<AppState, CliError> {
        self.store
            .load()?
            .ok_or_else(|| CliError::NotInitialized(self.store.path().to_path_buf()))
    }

    /// Replaces the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub fn save(&self, state: &AppState) -> Result<(), CliError> {
        self.store.save(state)?;
        Ok(())
    }
}
