//! Commands that change the snapshot.
//!
//! Each run loads the snapshot, applies one step through an
//! [`arween_market::Shell`], and saves whatever the shell committed. A proof
//! flow whose payout fails still saves the verification it committed before
//! failing.

use std::io::Write;

use arween_market::{AppState, FakeValidator, FlowOutcome, Intent, JobId};
use tracing::{debug, warn};

use super::session::Session;
use crate::error::CliError;
use crate::output::{OutputFormat, Receipt};

/// One mutating step requested on the command line.
#[derive(Debug, Clone)]
pub enum Step {
    /// A single engine intent.
    Intent(Intent),
    /// Pickup proof followed by the phase 1 payout.
    Pickup {
        /// Job ID.
        job_id: JobId,
        /// Rejection reason, if the proof should be refused.
        reject: Option<String>,
    },
    /// Delivery proof followed by completion and the phase 2 payout.
    Deliver {
        /// Job ID.
        job_id: JobId,
        /// Rejection reason, if the proof should be refused.
        reject: Option<String>,
    },
}

impl Step {
    fn action(&self) -> &'static str {
        match self {
            Self::Intent(intent) => intent.action(),
            Self::Pickup { .. } => "confirm_pickup",
            Self::Deliver { .. } => "confirm_delivery",
        }
    }

    fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::Intent(intent) => intent.job_id(),
            Self::Pickup { job_id, .. } | Self::Deliver { job_id, .. } => Some(job_id),
        }
    }
}

fn validator(reject: Option<String>) -> FakeValidator {
    reject.map_or_else(FakeValidator::approving, FakeValidator::rejecting)
}

fn flow_result(outcome: Result<FlowOutcome, arween_market::MarketError>) -> Result<(), CliError> {
    match outcome? {
        FlowOutcome::Advanced { reason } => {
            debug!(%reason, "proof accepted");
            Ok(())
        }
        FlowOutcome::Rejected { reason } => Err(CliError::ProofRejected(reason)),
    }
}

/// Mutating command executor.
pub struct TransitionCommand<'a> {
    session: &'a Session,
}

impl<'a> TransitionCommand<'a> {
    /// Create a new transition command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Applies `step`, saves the result, and prints a receipt.
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, [`CliError::ProofRejected`], or a
    /// load, save, or output failure.
    pub async fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat, step: Step) -> Result<(), CliError> {
        let before = self.session.load()?;
        let action = step.action();
        let mut job_id = step.job_id().map(|id| id.as_str().to_string());

        let mut shell = self.session.shell(before.clone());
        let result = match step {
            Step::Intent(intent) => shell.dispatch(intent).map(|_| ()).map_err(CliError::from),
            Step::Pickup { job_id, reject } => {
                flow_result(shell.confirm_pickup(&validator(reject), &job_id).await)
            }
            Step::Deliver { job_id, reject } => {
                flow_result(shell.confirm_delivery(&validator(reject), &job_id).await)
            }
        };

        let after = shell.into_state();
        if after != before {
            self.session.save(&after)?;
        }
        if let Err(e) = result {
            if after != before {
                warn!(action, error = %e, "step failed after a partial commit");
            }
            return Err(e);
        }

        if job_id.is_none() {
            job_id = created_job(&before, &after);
        }
        format.write(writer, &Receipt::between(action, job_id.as_deref(), &before, &after))
    }
}

fn created_job(before: &AppState, after: &AppState) -> Option<String> {
    after
        .jobs
        .iter()
        .find(|job| !before.has_job(job.id.as_str()))
        .map(|job| job.id.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arween_core::Amount;
    use arween_market::{JobDraft, JobState, MarketError, Role};

    use crate::cli::Format;

    fn seeded() -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(&dir.path().join("state.json"), None).unwrap();
        session.save(&AppState::demo()).unwrap();
        (dir, session)
    }

    async fn run(session: &Session, step: Step) -> Result<String, CliError> {
        let mut out = Vec::new();
        TransitionCommand::new(session)
            .execute(&mut out, &OutputFormat::default(), step)
            .await?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn a001() -> JobId {
        JobId::new("JOB-24-A001")
    }

    #[tokio::test]
    async fn accept_then_pickup_is_saved() {
        let (_dir, session) = seeded();
        run(&session, Step::Intent(Intent::AcceptJob { job_id: a001(), driver_id: "u_dr_001".into() }))
            .await
            .unwrap();
        let out = run(&session, Step::Pickup { job_id: a001(), reject: None }).await.unwrap();
        assert!(out.contains("confirm_pickup"));

        let state = session.load().unwrap();
        assert_eq!(state.job(&a001()).map(|j| j.state), Some(JobState::Phase1Paid));
        assert_eq!(state.driver_wallet.available(), Amount::from_satang(489_750));
    }

    #[tokio::test]
    async fn rejected_proof_changes_nothing() {
        let (_dir, session) = seeded();
        run(&session, Step::Intent(Intent::AcceptJob { job_id: a001(), driver_id: "u_dr_001".into() }))
            .await
            .unwrap();
        let before = session.load().unwrap();

        let err = run(&session, Step::Pickup { job_id: a001(), reject: Some("blurry".into()) })
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::ProofRejected(ref r) if r == "blurry"));
        assert_eq!(session.load().unwrap(), before);
    }

    #[tokio::test]
    async fn engine_rejection_is_not_saved() {
        let (_dir, session) = seeded();
        let before = session.load().unwrap();
        let err = run(&session, Step::Intent(Intent::SettleDriverFunds)).await.unwrap_err();
        assert!(matches!(err, CliError::Market(MarketError::NothingToSettle)));
        assert_eq!(session.load().unwrap(), before);
    }

    #[tokio::test]
    async fn create_job_receipt_names_the_new_job() {
        let (_dir, session) = seeded();
        run(&session, Step::Intent(Intent::SwitchRole(Role::Operator))).await.unwrap();

        let draft = JobDraft::new("Rice", "Ayutthaya", "Bangkok", Amount::from_baht(900));
        let mut out = Vec::new();
        TransitionCommand::new(&session)
            .execute(&mut out, &OutputFormat::new(Format::Json), Step::Intent(Intent::CreateJob(draft)))
            .await
            .unwrap();
        let receipt: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(receipt["action"], "create_job");
        assert_eq!(receipt["job"]["state"], "CREATED");
        assert_eq!(session.load().unwrap().jobs.len(), 6);
    }
}
