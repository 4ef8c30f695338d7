//! Error types for arween-market.

use arween_core::{Amount, CoreError, TrustScore};
use thiserror::Error;

use crate::job::JobState;
use crate::snapshot::Role;

/// Errors that can occur in lifecycle operations.
///
/// Every variant is a synchronous, atomic failure: the snapshot passed to the
/// failing transition is never modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    /// Referenced job does not exist.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// Operation attempted while the job is in the wrong state.
    #[error("cannot {operation} job {job_id}: job is {state}, requires {required}")]
    InvalidState {
        /// The job.
        job_id: String,
        /// The attempted operation.
        operation: &'static str,
        /// The job's current state.
        state: JobState,
        /// Description of the state(s) the operation requires.
        required: &'static str,
    },

    /// A debit exceeds the balance it is drawn from.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount required for the operation.
        required: Amount,
        /// Amount currently available.
        available: Amount,
    },

    /// Business-rule rejection independent of job state.
    #[error(
        "compliance check failed: contracts above {threshold} require reputation {min_reputation}, operator has {reputation}"
    )]
    Compliance {
        /// Contract value of the rejected draft.
        value: Amount,
        /// Operator's reputation.
        reputation: TrustScore,
        /// Value above which the reputation floor applies.
        threshold: Amount,
        /// Reputation floor.
        min_reputation: TrustScore,
    },

    /// Current role lacks the capability for this operation.
    #[error("unauthorized: role {role} cannot {operation}")]
    Unauthorized {
        /// The acting role.
        role: Role,
        /// The attempted operation.
        operation: &'static str,
    },

    /// Settlement invoked with no pending balance.
    #[error("nothing to settle: driver pending balance is zero")]
    NothingToSettle,

    /// Malformed input rejected before reaching the state machine.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Checked balance arithmetic failed; the snapshot breaks an invariant.
    #[error("balance arithmetic failed: {0}")]
    Arithmetic(String),
}

impl MarketError {
    /// Machine-readable kind, stable across message changes.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::JobNotFound(_) => "not_found",
            Self::InvalidState { .. } => "invalid_state",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::Compliance { .. } => "compliance",
            Self::Unauthorized { .. } => "unauthorized",
            Self::NothingToSettle => "nothing_to_settle",
            Self::Validation(_) => "validation",
            Self::Arithmetic(_) => "arithmetic",
        }
    }

    /// Returns true for failures that indicate a broken invariant rather
    /// than an expected business rejection.
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::JobNotFound(_) | Self::Arithmetic(_))
    }
}

impl From<CoreError> for MarketError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InsufficientFunds {
                required,
                available,
                ..
            } => Self::InsufficientFunds {
                required,
                available,
            },
            CoreError::InvalidAmount(msg) | CoreError::InvalidRate(msg) => Self::Validation(msg),
            CoreError::Overflow(_) => Self::Arithmetic(e.to_string()),
        }
    }
}

/// Maps a core error raised while moving locked funds.
///
/// Escrow and reserved balances are maintained by the engine itself, so an
/// underflow there means the snapshot is inconsistent, not that the caller
/// lacks funds.
pub(crate) fn invariant(e: CoreError) -> MarketError {
    MarketError::Arithmetic(e.to_string())
}
