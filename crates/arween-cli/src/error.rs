//! CLI error types.

use std::path::PathBuf;

use arween_market::{ConfigError, MarketError, OracleError, StoreError};
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// No snapshot has been written yet.
    #[error("no snapshot at {}, run `arween init` first", .0.display())]
    NotInitialized(PathBuf),

    /// A snapshot already exists and `--force` was not given.
    #[error("snapshot already exists at {}, pass --force to overwrite", .0.display())]
    AlreadyInitialized(PathBuf),

    /// The transition was rejected.
    #[error(transparent)]
    Market(#[from] MarketError),

    /// The proof validator refused the submitted proof.
    #[error("proof rejected: {0}")]
    ProofRejected(String),

    /// Snapshot persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An oracle failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_initialized_mentions_init() {
        let err = CliError::NotInitialized(PathBuf::from("state.json"));
        assert_eq!(err.to_string(), "no snapshot at state.json, run `arween init` first");
    }

    #[test]
    fn market_errors_pass_through() {
        let err = CliError::from(MarketError::NothingToSettle);
        assert_eq!(err.to_string(), MarketError::NothingToSettle.to_string());
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }
}
