//! Audit event types.
//!
//! This module defines the marketplace events that are written to the audit
//! trail: committed job transitions, rejected transitions, dispute escalations
//! and wallet-level money movements.

use crate::error::{AuditError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Severity level for audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational event (e.g., a committed transition).
    Info = 0,
    /// Low severity.
    Low = 1,
    /// Medium severity (e.g., an expected business rejection).
    Medium = 2,
    /// High severity (e.g., an invariant violation such as an unknown job).
    High = 3,
    /// Critical severity (e.g., a dispute freezing a job).
    Critical = 4,
}

impl Severity {
    /// Returns the string representation of this severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A committed job state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStateChange {
    /// Job identifier.
    pub job_id: String,
    /// Operation that produced the change (e.g. `fund_job`).
    pub action: String,
    /// Previous state.
    pub previous_state: String,
    /// New state.
    pub new_state: String,
    /// Amount involved (as string to preserve precision).
    pub amount: Option<String>,
}

/// A transition the engine refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Operation that was attempted.
    pub action: String,
    /// Job the operation targeted, if any.
    pub job_id: Option<String>,
    /// Machine-readable error kind (e.g. `insufficient_funds`).
    pub kind: String,
    /// Human-readable reason.
    pub reason: String,
}

/// A dispute that froze a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeDetails {
    /// Job identifier.
    pub job_id: String,
    /// State the job was in when the dispute was raised.
    pub previous_state: String,
    /// Reason given.
    pub reason: String,
}

/// A wallet-level money movement not tied to a single job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletMovement {
    /// Wallet identifier.
    pub wallet_id: String,
    /// Operation (e.g. `top_up`, `withdraw`, `settle`).
    pub action: String,
    /// Amount moved (as string to preserve precision).
    pub amount: String,
}

/// Marketplace audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A job transition was committed.
    JobTransition {
        /// Unique event identifier.
        event_id: Uuid,
        /// When the event occurred.
        timestamp: DateTime<Utc>,
        /// Severity level.
        severity: Severity,
        /// Role that triggered the change.
        actor: Option<String>,
        /// Change details.
        change: JobStateChange,
        /// Additional metadata.
        #[serde(default)]
        metadata: HashMap<String, serde_json::Value>,
    },

    /// A transition was rejected and the snapshot left unchanged.
    TransitionRejected {
        /// Unique event identifier.
        event_id: Uuid,
        /// When the event occurred.
        timestamp: DateTime<Utc>,
        /// Severity level.
        severity: Severity,
        /// Role that attempted the operation.
        actor: Option<String>,
        /// Rejection details.
        rejection: Rejection,
        /// Additional metadata.
        #[serde(default)]
        metadata: HashMap<String, serde_json::Value>,
    },

    /// A job was frozen by a dispute.
    DisputeRaised {
        /// Unique event identifier.
        event_id: Uuid,
        /// When the event occurred.
        timestamp: DateTime<Utc>,
        /// Severity level.
        severity: Severity,
        /// Role that raised the dispute.
        actor: Option<String>,
        /// Dispute details.
        dispute: DisputeDetails,
        /// Additional metadata.
        #[serde(default)]
        metadata: HashMap<String, serde_json::Value>,
    },

    /// Funds moved at wallet level.
    WalletMovement {
        /// Unique event identifier.
        event_id: Uuid,
        /// When the event occurred.
        timestamp: DateTime<Utc>,
        /// Severity level.
        severity: Severity,
        /// Role that moved the funds.
        actor: Option<String>,
        /// Movement details.
        movement: WalletMovement,
        /// Additional metadata.
        #[serde(default)]
        metadata: HashMap<String, serde_json::Value>,
    },
}

impl AuditEvent {
    /// Creates a new rejection event builder.
    #[must_use]
    pub fn builder() -> AuditEventBuilder {
        AuditEventBuilder::default()
    }

    /// Creates a committed job transition event.
    #[must_use]
    pub fn job_transition(
        job_id: impl Into<String>,
        action: impl Into<String>,
        previous_state: impl Into<String>,
        new_state: impl Into<String>,
        amount: Option<String>,
    ) -> Self {
        Self::JobTransition {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            severity: Severity::Info,
            actor: None,
            change: JobStateChange {
                job_id: job_id.into(),
                action: action.into(),
                previous_state: previous_state.into(),
                new_state: new_state.into(),
                amount,
            },
            metadata: HashMap::new(),
        }
    }

    /// Creates a dispute event. Disputes are always critical.
    #[must_use]
    pub fn dispute_raised(
        job_id: impl Into<String>,
        previous_state: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::DisputeRaised {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            severity: Severity::Critical,
            actor: None,
            dispute: DisputeDetails {
                job_id: job_id.into(),
                previous_state: previous_state.into(),
                reason: reason.into(),
            },
            metadata: HashMap::new(),
        }
    }

    /// Creates a wallet movement event.
    #[must_use]
    pub fn wallet_movement(
        wallet_id: impl Into<String>,
        action: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self::WalletMovement {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            severity: Severity::Info,
            actor: None,
            movement: WalletMovement {
                wallet_id: wallet_id.into(),
                action: action.into(),
                amount: amount.into(),
            },
            metadata: HashMap::new(),
        }
    }

    /// Sets the acting role.
    #[must_use]
    pub fn with_actor(mut self, role: impl Into<String>) -> Self {
        match &mut self {
            Self::JobTransition { actor, .. }
            | Self::TransitionRejected { actor, .. }
            | Self::DisputeRaised { actor, .. }
            | Self::WalletMovement { actor, .. } => *actor = Some(role.into()),
        }
        self
    }

    /// Returns the event ID.
    #[must_use]
    pub const fn event_id(&self) -> Uuid {
        match self {
            Self::JobTransition { event_id, .. }
            | Self::TransitionRejected { event_id, .. }
            | Self::DisputeRaised { event_id, .. }
            | Self::WalletMovement { event_id, .. } => *event_id,
        }
    }

    /// Returns the event timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::JobTransition { timestamp, .. }
            | Self::TransitionRejected { timestamp, .. }
            | Self::DisputeRaised { timestamp, .. }
            | Self::WalletMovement { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the severity level.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::JobTransition { severity, .. }
            | Self::TransitionRejected { severity, .. }
            | Self::DisputeRaised { severity, .. }
            | Self::WalletMovement { severity, .. } => *severity,
        }
    }

    /// Returns the event type as a string.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::JobTransition { .. } => "job_transition",
            Self::TransitionRejected { .. } => "transition_rejected",
            Self::DisputeRaised { .. } => "dispute_raised",
            Self::WalletMovement { .. } => "wallet_movement",
        }
    }

    /// Serializes the event to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(AuditError::from)
    }
}

/// Builder for [`AuditEvent::TransitionRejected`] events.
#[derive(Debug, Default)]
pub struct AuditEventBuilder {
    severity: Option<Severity>,
    actor: Option<String>,
    action: Option<String>,
    job_id: Option<String>,
    kind: Option<String>,
    reason: Option<String>,
    metadata: HashMap<String, serde_json::Value>,
}

impl AuditEventBuilder {
    /// Sets the severity (defaults to medium).
    #[must_use]
    pub const fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Sets the acting role.
    #[must_use]
    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Sets the attempted operation. Required.
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets the targeted job.
    #[must_use]
    pub fn job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Sets the error kind. Required.
    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the human-readable reason. Required.
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the event.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::MissingField` if action, kind or reason is unset.
    pub fn build(self) -> Result<AuditEvent> {
        let action = self.action.ok_or(AuditError::MissingField("action"))?;
        let kind = self.kind.ok_or(AuditError::MissingField("kind"))?;
        let reason = self.reason.ok_or(AuditError::MissingField("reason"))?;

        Ok(AuditEvent::TransitionRejected {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            severity: self.severity.unwrap_or(Severity::Medium),
            actor: self.actor,
            rejection: Rejection {
                action,
                job_id: self.job_id,
                kind,
                reason,
            },
            metadata: self.metadata,
        })
    }
}
