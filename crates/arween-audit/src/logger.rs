//! Audit logging backends.
//!
//! This module provides the [`AuditLogger`] trait and default implementations.

use std::fmt;

use parking_lot::Mutex;

use crate::events::{AuditEvent, Severity};

/// Trait for audit logging backends.
///
/// Implement this trait to create custom audit log destinations
/// (e.g., file, database, external service).
pub trait AuditLogger: Send + Sync + fmt::Debug {
    /// Logs an audit event.
    fn log(&self, event: &AuditEvent);

    /// Logs an audit event if the severity is at or above the minimum.
    fn log_if_severe(&self, event: &AuditEvent, min_severity: Severity) {
        if event.severity() >= min_severity {
            self.log(event);
        }
    }
}

/// Audit logger that uses the `tracing` infrastructure.
///
/// Events are logged at appropriate tracing levels based on severity:
/// - Info, Low → `tracing::info!`
/// - Medium → `tracing::warn!`
/// - High, Critical → `tracing::error!`
#[derive(Debug, Clone, Default)]
pub struct TracingAuditLogger {
    prefix: Option<String>,
}

impl TracingAuditLogger {
    /// Creates a new tracing-based audit logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new tracing-based audit logger with a prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl AuditLogger for TracingAuditLogger {
    fn log(&self, event: &AuditEvent) {
        let event_id = event.event_id();
        let event_type = event.event_type();
        let severity = event.severity();
        let timestamp = event.timestamp();

        let json = event.to_json().unwrap_or_else(|_| "{}".to_string());

        let prefix = self.prefix.as_deref().unwrap_or("ARWEEN AUDIT");

        match severity {
            Severity::Info | Severity::Low => {
                tracing::info!(
                    target: "arween_audit",
                    %event_id,
                    %event_type,
                    %severity,
                    %timestamp,
                    event_json = %json,
                    "[{prefix}] {event_type}"
                );
            }
            Severity::Medium => {
                tracing::warn!(
                    target: "arween_audit",
                    %event_id,
                    %event_type,
                    %severity,
                    %timestamp,
                    event_json = %json,
                    "[{prefix}] {event_type}"
                );
            }
            Severity::High | Severity::Critical => {
                tracing::error!(
                    target: "arween_audit",
                    %event_id,
                    %event_type,
                    %severity,
                    %timestamp,
                    event_json = %json,
                    "[{prefix}] {event_type}"
                );
            }
        }
    }
}

/// A no-op audit logger for runs with auditing switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditLogger;

impl NoopAuditLogger {
    /// Creates a new no-op audit logger.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AuditLogger for NoopAuditLogger {
    fn log(&self, _event: &AuditEvent) {}
}

/// Audit logger that keeps every event in memory.
///
/// Used by tests and by callers that want to inspect the trail after a run.
#[derive(Debug, Default)]
pub struct MemoryAuditLogger {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditLogger {
    /// Creates an empty in-memory logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all events logged so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Number of events logged so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl AuditLogger for MemoryAuditLogger {
    fn log(&self, event: &AuditEvent) {
        self.events.lock().push(event.clone());
    }
}

/// A boxed audit logger, for picking the backend at runtime.
pub type BoxedAuditLogger = Box<dyn AuditLogger>;

impl AuditLogger for BoxedAuditLogger {
    fn log(&self, event: &AuditEvent) {
        (**self).log(event);
    }
}

impl<L: AuditLogger + ?Sized> AuditLogger for std::sync::Arc<L> {
    fn log(&self, event: &AuditEvent) {
        (**self).log(event);
    }
}
