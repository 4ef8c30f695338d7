//! # arween-audit
//!
//! Audit trail for the ARWEEN marketplace.
//!
//! Every committed transition, every rejected transition and every dispute is
//! written as an [`AuditEvent`] through a pluggable [`AuditLogger`]. The
//! default backend forwards to `tracing`, mapping severity to log level so that
//! invariant violations stand out from expected business rejections.
//!
//! ## Example
//!
//! ```rust
//! use arween_audit::{AuditEvent, AuditLogger, Severity, TracingAuditLogger};
//!
//! let logger = TracingAuditLogger::new();
//!
//! logger.log(&AuditEvent::job_transition(
//!     "JOB-2025-1234-42",
//!     "fund_job",
//!     "CREATED",
//!     "FUNDED",
//!     Some("8500".to_string()),
//! ));
//!
//! let rejected = AuditEvent::builder()
//!     .severity(Severity::High)
//!     .action("fund_job")
//!     .job_id("JOB-missing")
//!     .kind("not_found")
//!     .reason("job not found")
//!     .build();
//!
//! if let Ok(event) = rejected {
//!     logger.log(&event);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod logger;

pub use error::{AuditError, Result};
pub use events::{
    AuditEvent, AuditEventBuilder, DisputeDetails, JobStateChange, Rejection, Severity,
    WalletMovement,
};
pub use logger::{AuditLogger, BoxedAuditLogger, MemoryAuditLogger, NoopAuditLogger, TracingAuditLogger};
