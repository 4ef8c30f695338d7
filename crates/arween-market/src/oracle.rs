//! External oracles consulted by the shell.
//!
//! A [`ProofValidator`] judges pickup and delivery evidence before the shell
//! advances a job. An [`Advisor`] produces read-only prose about a snapshot.
//! Both are asynchronous and may fail; the lifecycle engine never calls them.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::job::JobId;
use crate::snapshot::{AppState, Role};

/// Which proof is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProofKind {
    /// Evidence that the cargo was collected.
    Pickup,
    /// Evidence that the cargo was handed over.
    Delivery,
}

impl fmt::Display for ProofKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pickup => write!(f, "PICKUP"),
            Self::Delivery => write!(f, "DELIVERY"),
        }
    }
}

/// A validator's judgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the proof is accepted.
    pub valid: bool,
    /// Explanation shown to the user.
    pub reason: String,
}

impl Verdict {
    /// An accepting verdict.
    #[must_use]
    pub fn accept(reason: impl Into<String>) -> Self {
        Self {
            valid: true,
            reason: reason.into(),
        }
    }

    /// A rejecting verdict.
    #[must_use]
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
        }
    }
}

/// Errors returned by oracles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The oracle could not be reached.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    /// The oracle did not answer in time.
    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),

    /// The oracle answered with something unusable.
    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

/// Judges proof-of-work evidence.
#[allow(async_fn_in_trait)]
pub trait ProofValidator {
    /// Validates the given proof for a job.
    async fn validate(&self, kind: ProofKind, job_id: &JobId) -> Result<Verdict, OracleError>;
}

/// Produces read-only commentary on a snapshot.
#[allow(async_fn_in_trait)]
pub trait Advisor {
    /// Short strategic advice for the given role.
    async fn strategic_advice(&self, role: Role, state: &AppState) -> Result<String, OracleError>;

    /// A compliance report for the given role's wallet and the ledger.
    async fn compliance_report(&self, role: Role, state: &AppState)
    -> Result<String, OracleError>;
}

/// Scripted validator for tests and offline use.
///
/// Scripted responses are returned in order; once they run out every call
/// gets the fallback verdict.
#[derive(Debug, Clone)]
pub struct FakeValidator {
    script: Arc<Mutex<VecDeque<Result<Verdict, OracleError>>>>,
    fallback: Verdict,
    calls: Arc<Mutex<Vec<(ProofKind, JobId)>>>,
}

impl FakeValidator {
    /// A validator that accepts everything.
    #[must_use]
    pub fn approving() -> Self {
        Self::with_fallback(Verdict::accept("Proof accepted"))
    }

    /// A validator that rejects everything with `reason`.
    #[must_use]
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self::with_fallback(Verdict::reject(reason))
    }

    fn with_fallback(fallback: Verdict) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a response ahead of the fallback.
    pub async fn push(&self, response: Result<Verdict, OracleError>) {
        self.script.lock().await.push_back(response);
    }

    /// Proofs validated so far, in call order.
    pub async fn calls(&self) -> Vec<(ProofKind, JobId)> {
        self.calls.lock().await.clone()
    }
}

impl ProofValidator for FakeValidator {
    async fn validate(&self, kind: ProofKind, job_id: &JobId) -> Result<Verdict, OracleError> {
        self.calls.lock().await.push((kind, job_id.clone()));
        match self.script.lock().await.pop_front() {
            Some(response) => response,
            None => Ok(self.fallback.clone()),
        }
    }
}

/// Advisor returning fixed text, or failing, for tests.
#[derive(Debug, Clone)]
pub struct FakeAdvisor {
    response: Result<String, OracleError>,
}

impl FakeAdvisor {
    /// An advisor that always answers `text`.
    #[must_use]
    pub fn answering(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
        }
    }

    /// An advisor that is always unreachable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            response: Err(OracleError::Unavailable("advisor offline".into())),
        }
    }
}

impl Advisor for FakeAdvisor {
    async fn strategic_advice(&self, _role: Role, _state: &AppState) -> Result<String, OracleError> {
        self.response.clone()
    }

    async fn compliance_report(
        &self,
        _role: Role,
        _state: &AppState,
    ) -> Result<String, OracleError> {
        self.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn approving_validator_accepts_and_records_calls() {
        let validator = FakeValidator::approving();
        let id = JobId::new("JOB-1");
        let verdict = validator.validate(ProofKind::Pickup, &id).await.unwrap();
        assert!(verdict.valid);
        assert_eq!(validator.calls().await, vec![(ProofKind::Pickup, id)]);
    }

    #[tokio::test]
    async fn scripted_responses_come_first() {
        let validator = FakeValidator::approving();
        validator.push(Err(OracleError::Unavailable("down".into()))).await;
        validator.push(Ok(Verdict::reject("blurry photo"))).await;
        let id = JobId::new("JOB-1");

        assert!(validator.validate(ProofKind::Delivery, &id).await.is_err());
        let second = validator.validate(ProofKind::Delivery, &id).await.unwrap();
        assert_eq!(second.reason, "blurry photo");
        assert!(validator.validate(ProofKind::Delivery, &id).await.unwrap().valid);
    }

    #[tokio::test]
    async fn rejecting_validator() {
        let verdict = FakeValidator::rejecting("seal broken")
            .validate(ProofKind::Delivery, &JobId::new("JOB-2"))
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::reject("seal broken"));
    }

    #[tokio::test]
    async fn fake_advisor() {
        let state = AppState::demo();
        let ok = FakeAdvisor::answering("hold").strategic_advice(Role::Driver, &state).await;
        assert_eq!(ok.as_deref(), Ok("hold"));
        let err = FakeAdvisor::unavailable().compliance_report(Role::Operator, &state).await;
        assert!(matches!(err, Err(OracleError::Unavailable(_))));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            OracleError::Timeout(Duration::from_secs(30)).to_string(),
            "oracle timed out after 30s"
        );
        assert_eq!(ProofKind::Pickup.to_string(), "PICKUP");
    }
}
