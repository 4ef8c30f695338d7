//! # arween-market
//!
//! Job lifecycle and ledger state machine for the ARWEEN logistics
//! marketplace.
//!
//! This crate provides:
//!
//! - [`Lifecycle`]: pure transitions from one [`AppState`] snapshot to the next
//! - Two-phase payout arithmetic with platform fee and withholding tax
//! - Dispute raising and arbitration
//! - [`Shell`]: the owner of the live snapshot, with audit logging and
//!   oracle-gated pickup and delivery flows
//! - Snapshot persistence and a local compliance reporter
//!
//! ## Example
//!
//! ```rust
//! use arween_market::{AppState, JobId, Lifecycle};
//!
//! let engine = Lifecycle::default();
//! let state = AppState::demo();
//! let job = JobId::new("JOB-24-A001");
//!
//! let state = engine.accept_job(&state, &job, "u_dr_001")?;
//! let state = engine.verify_pickup(&state, &job)?;
//! let state = engine.process_phase1_payout(&state, &job)?;
//! assert_eq!(state.driver_wallet.available().to_string(), "4897.50 THB");
//! # Ok::<(), arween_market::MarketError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod dispute;
pub mod error;
pub mod job;
pub mod lifecycle;
pub mod oracle;
pub mod payout;
pub mod report;
pub mod shell;
pub mod snapshot;
pub mod store;

pub use config::{ConfigError, MarketConfig, MarketConfigBuilder};
pub use error::MarketError;
pub use job::{DisputeRuling, Job, JobDraft, JobId, JobState};
pub use lifecycle::Lifecycle;
pub use oracle::{Advisor, FakeAdvisor, FakeValidator, OracleError, ProofKind, ProofValidator, Verdict};
pub use payout::PhaseBreakdown;
pub use report::{LedgerReporter, ledger_digest};
pub use shell::{FlowOutcome, Intent, Shell};
pub use snapshot::{AppState, Role};
pub use store::{JsonFileStore, MemoryStore, SnapshotStore, StoreError};
