//! Jobs and their lifecycle states.
//!
//! A [`Job`] moves through [`JobState`] strictly along the edges accepted by
//! [`JobState::can_transition_to`]. Besides the state, a job carries the
//! structural facts the engine needs to stay honest after a dispute: how much
//! of its value is still locked in escrow, when each phase was paid, and how an
//! arbitration ended.

use std::fmt;

use arween_core::Amount;
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// Attempts at a timestamp-based ID before falling back to a UUID suffix.
const ID_ATTEMPTS: usize = 16;

/// Upper bound for a generated risk score when the draft does not give one.
const DEFAULT_RISK_CEILING: u8 = 30;

/// Unique job identifier, formatted `JOB-<year>-<4 digits>-<2 digits>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates an identifier not accepted by `taken`.
    ///
    /// The short form uses the last four digits of the millisecond clock and
    /// two random digits. After repeated collisions a UUID suffix is used.
    pub fn generate(now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> Self {
        let mut rng = rand::thread_rng();
        let clock = now.timestamp_millis().rem_euclid(10_000);
        for _ in 0..ID_ATTEMPTS {
            let candidate = format!("JOB-{}-{clock:04}-{}", now.year(), rng.gen_range(10..100));
            if !taken(&candidate) {
                return Self(candidate);
            }
        }
        Self(format!("JOB-{}-{}", now.year(), uuid::Uuid::new_v4().simple()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Posted, no funds locked.
    Created,
    /// Full value locked in the operator's escrow.
    Funded,
    /// A driver has taken the job.
    Accepted,
    /// Pickup proof accepted.
    PickupVerified,
    /// First tranche released to the driver.
    Phase1Paid,
    /// Reserved for in-transit tracking; dispute-eligible.
    InProgress,
    /// Delivered, second tranche outstanding.
    Completed,
    /// Second tranche released; terminal.
    Phase2Funded,
    /// Frozen pending arbitration.
    Dispute,
}

impl JobState {
    /// All states, in lifecycle order.
    pub const ALL: [Self; 9] = [
        Self::Created,
        Self::Funded,
        Self::Accepted,
        Self::PickupVerified,
        Self::Phase1Paid,
        Self::InProgress,
        Self::Completed,
        Self::Phase2Funded,
        Self::Dispute,
    ];

    /// Checks if a transition to the target state is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: &Self) -> bool {
        use JobState::{
            Accepted, Completed, Created, Dispute, Funded, Phase1Paid, Phase2Funded,
            PickupVerified,
        };

        match (self, target) {
            (Created, Funded)
            | (Funded, Accepted)
            | (Accepted, PickupVerified)
            | (PickupVerified, Phase1Paid)
            | (Phase1Paid | Dispute, Completed)
            | (Completed, Phase2Funded) => true,
            (_, Dispute) => self.can_dispute(),
            _ => false,
        }
    }

    /// Returns true if a dispute may be raised from this state.
    #[must_use]
    pub const fn can_dispute(&self) -> bool {
        !matches!(self, Self::Dispute | Self::Phase2Funded)
    }

    /// Returns true for the terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Phase2Funded)
    }

    /// Wire name of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Funded => "FUNDED",
            Self::Accepted => "ACCEPTED",
            Self::PickupVerified => "PICKUP_VERIFIED",
            Self::Phase1Paid => "PHASE1_PAID",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Phase2Funded => "PHASE2_FUNDED",
            Self::Dispute => "DISPUTE",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an arbitrated dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeRuling {
    /// Remaining escrow returns to the operator.
    Refund,
    /// Remaining escrow, net of platform fee, goes to the driver.
    Payout,
}

impl fmt::Display for DisputeRuling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refund => write!(f, "REFUND"),
            Self::Payout => write!(f, "PAYOUT"),
        }
    }
}

/// A freight contract between the operator and a driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique ID.
    pub id: JobId,
    /// Short cargo description.
    pub title: String,
    /// Operator who posted the job.
    pub operator_id: String,
    /// Driver bound on acceptance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    /// Contract value.
    pub value_total: Amount,
    /// Current lifecycle state.
    pub state: JobState,
    /// Pickup location.
    pub origin: String,
    /// Drop-off location.
    pub destination: String,
    /// Risk estimate, 0 to 100.
    pub risk_score: u8,
    /// Carbon points awarded to both parties on completion.
    pub projected_carbon_credits: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Part of `value_total` still locked in escrow.
    #[serde(default)]
    pub escrow_outstanding: Amount,
    /// When the first tranche was released.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase1_paid_at: Option<DateTime<Utc>>,
    /// When the second tranche was released.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase2_paid_at: Option<DateTime<Utc>>,
    /// Arbitration outcome, if the job went through a dispute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruling: Option<DisputeRuling>,
    /// Reason given when the dispute was raised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispute_reason: Option<String>,
}

impl Job {
    /// Returns true if a driver has been bound to the job.
    #[must_use]
    pub const fn has_driver(&self) -> bool {
        self.driver_id.is_some()
    }

    /// Returns true if the job has been settled by arbitration.
    #[must_use]
    pub const fn was_arbitrated(&self) -> bool {
        self.ruling.is_some()
    }

    /// Returns true if the job is waiting on an action that pays the driver.
    #[must_use]
    pub const fn is_stalled(&self) -> bool {
        match self.state {
            JobState::PickupVerified => true,
            JobState::Completed => self.ruling.is_none() && self.phase2_paid_at.is_none(),
            _ => false,
        }
    }

    /// Moves to `target` if the lifecycle allows it.
    pub(crate) fn transition_to(
        &mut self,
        target: JobState,
        operation: &'static str,
        required: &'static str,
    ) -> Result<(), MarketError> {
        if self.state.can_transition_to(&target) {
            self.state = target;
            Ok(())
        } else {
            Err(self.invalid_state(operation, required))
        }
    }

    /// Builds the error for an operation attempted in the wrong state.
    pub(crate) fn invalid_state(&self, operation: &'static str, required: &'static str) -> MarketError {
        MarketError::InvalidState {
            job_id: self.id.to_string(),
            operation,
            state: self.state,
            required,
        }
    }
}

/// Operator-supplied fields for a new job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDraft {
    /// Short cargo description.
    pub title: String,
    /// Pickup location.
    pub origin: String,
    /// Drop-off location.
    pub destination: String,
    /// Contract value.
    pub value_total: Amount,
    /// Risk estimate; a low random score is assigned when absent.
    #[serde(default)]
    pub risk_score: Option<u8>,
    /// Carbon points awarded on completion.
    #[serde(default)]
    pub projected_carbon_credits: u64,
}

impl JobDraft {
    /// Creates a draft with no risk score and no carbon credits.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        value_total: Amount,
    ) -> Self {
        Self {
            title: title.into(),
            origin: origin.into(),
            destination: destination.into(),
            value_total,
            risk_score: None,
            projected_carbon_credits: 0,
        }
    }

    /// Sets the risk score.
    #[must_use]
    pub const fn with_risk_score(mut self, score: u8) -> Self {
        self.risk_score = Some(score);
        self
    }

    /// Sets the projected carbon credits.
    #[must_use]
    pub const fn with_carbon_credits(mut self, points: u64) -> Self {
        self.projected_carbon_credits = points;
        self
    }

    /// Rejects blank text fields, a zero value and out-of-range risk.
    pub fn validate(&self) -> Result<(), MarketError> {
        for (field, value) in [
            ("title", &self.title),
            ("origin", &self.origin),
            ("destination", &self.destination),
        ] {
            if value.trim().is_empty() {
                return Err(MarketError::Validation(format!("{field} must not be empty")));
            }
        }
        if self.value_total.is_zero() {
            return Err(MarketError::Validation("value_total must be positive".into()));
        }
        if let Some(risk) = self.risk_score {
            if risk > 100 {
                return Err(MarketError::Validation(format!(
                    "risk_score {risk} exceeds 100"
                )));
            }
        }
        Ok(())
    }

    /// Turns the draft into a `CREATED` job.
    pub(crate) fn into_job(self, id: JobId, operator_id: String, now: DateTime<Utc>) -> Job {
        let risk_score = self
            .risk_score
            .unwrap_or_else(|| rand::thread_rng().gen_range(0..DEFAULT_RISK_CEILING));
        Job {
            id,
            title: self.title,
            operator_id,
            driver_id: None,
            value_total: self.value_total,
            state: JobState::Created,
            origin: self.origin,
            destination: self.destination,
            risk_score,
            projected_carbon_credits: self.projected_carbon_credits,
            created_at: now,
            escrow_outstanding: Amount::ZERO,
            phase1_paid_at: None,
            phase2_paid_at: None,
            ruling: None,
            dispute_reason: None,
        }
    }
}
