//! The shell: sole owner of the live snapshot.
//!
//! [`Shell::dispatch`] applies one [`Intent`] through the [`Lifecycle`]
//! engine, replaces the snapshot only on success, and writes an audit event
//! either way. The oracle-gated flows ([`Shell::confirm_pickup`] and
//! [`Shell::confirm_delivery`]) are the only suspension points; each step they
//! commit stays committed even if a later step fails.

use std::time::Duration;

use arween_audit::{AuditEvent, AuditLogger, Severity, TracingAuditLogger};
use arween_core::Amount;
use tracing::{info, warn};

use crate::error::MarketError;
use crate::job::{DisputeRuling, Job, JobDraft, JobId};
use crate::lifecycle::Lifecycle;
use crate::oracle::{Advisor, OracleError, ProofKind, ProofValidator, Verdict};
use crate::snapshot::{AppState, Role};

/// Default time allowed for a proof validator to answer.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Reason reported when a validator fails or times out.
const ORACLE_FAILURE_REASON: &str = "proof could not be validated, try again later";

/// A single request to change the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Post a new job.
    CreateJob(JobDraft),
    /// Lock a job's value in escrow.
    FundJob(JobId),
    /// Take a funded job.
    AcceptJob {
        /// The job.
        job_id: JobId,
        /// Driver taking it.
        driver_id: String,
    },
    /// Record accepted pickup proof.
    VerifyPickup(JobId),
    /// Release the first tranche.
    PayoutPhase1(JobId),
    /// Record delivery.
    CompleteJob(JobId),
    /// Release the second tranche.
    PayoutPhase2(JobId),
    /// Clear the driver's pending balance.
    SettleDriverFunds,
    /// Freeze a job for arbitration.
    RaiseDispute {
        /// The job.
        job_id: JobId,
        /// Why.
        reason: String,
    },
    /// Arbitrate a disputed job.
    ResolveDispute {
        /// The job.
        job_id: JobId,
        /// Outcome.
        ruling: DisputeRuling,
    },
    /// Add operator funds.
    TopUp(Amount),
    /// Remove operator funds.
    Withdraw(Amount),
    /// Change the acting role.
    SwitchRole(Role),
}

impl Intent {
    /// Action name used in audit events.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::CreateJob(_) => "create_job",
            Self::FundJob(_) => "fund_job",
            Self::AcceptJob { .. } => "accept_job",
            Self::VerifyPickup(_) => "verify_pickup",
            Self::PayoutPhase1(_) => "payout_phase1",
            Self::CompleteJob(_) => "complete_job",
            Self::PayoutPhase2(_) => "payout_phase2",
            Self::SettleDriverFunds => "settle_driver_funds",
            Self::RaiseDispute { .. } => "raise_dispute",
            Self::ResolveDispute { .. } => "resolve_dispute",
            Self::TopUp(_) => "top_up_wallet",
            Self::Withdraw(_) => "withdraw_wallet",
            Self::SwitchRole(_) => "switch_role",
        }
    }

    /// The job this intent targets, if any.
    #[must_use]
    pub const fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::FundJob(id)
            | Self::VerifyPickup(id)
            | Self::PayoutPhase1(id)
            | Self::CompleteJob(id)
            | Self::PayoutPhase2(id)
            | Self::AcceptJob { job_id: id, .. }
            | Self::RaiseDispute { job_id: id, .. }
            | Self::ResolveDispute { job_id: id, .. } => Some(id),
            Self::CreateJob(_)
            | Self::SettleDriverFunds
            | Self::TopUp(_)
            | Self::Withdraw(_)
            | Self::SwitchRole(_) => None,
        }
    }
}

/// Result of an oracle-gated flow that did not hit an engine error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The validator refused the proof; nothing changed.
    Rejected {
        /// Validator's explanation.
        reason: String,
    },
    /// Both steps committed.
    Advanced {
        /// Validator's explanation.
        reason: String,
    },
}

/// Owns the snapshot and serializes every transition applied to it.
#[derive(Debug)]
pub struct Shell<L: AuditLogger = TracingAuditLogger> {
    state: AppState,
    lifecycle: Lifecycle,
    audit: L,
    oracle_timeout: Duration,
}

impl<L: AuditLogger> Shell<L> {
    /// Creates a shell around an existing snapshot.
    pub fn new(state: AppState, lifecycle: Lifecycle, audit: L) -> Self {
        Self {
            state,
            lifecycle,
            audit,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }

    /// Sets how long a proof validator may take before it counts as failed.
    #[must_use]
    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    /// The current snapshot.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Consumes the shell, returning the snapshot.
    #[must_use]
    pub fn into_state(self) -> AppState {
        self.state
    }

    /// The lifecycle engine.
    #[must_use]
    pub const fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// The audit logger.
    #[must_use]
    pub const fn audit_logger(&self) -> &L {
        &self.audit
    }

    /// Applies one intent. On failure the snapshot is unchanged.
    pub fn dispatch(&mut self, intent: Intent) -> Result<&AppState, MarketError> {
        match self.apply(&intent) {
            Ok(next) => {
                self.audit_committed(&intent, &next);
                info!(action = intent.action(), "intent committed");
                self.state = next;
                Ok(&self.state)
            }
            Err(e) => {
                self.audit_rejected(&intent, &e);
                Err(e)
            }
        }
    }

    /// Validates pickup proof, then verifies pickup and pays phase 1.
    pub async fn confirm_pickup<V: ProofValidator>(
        &mut self,
        validator: &V,
        job_id: &JobId,
    ) -> Result<FlowOutcome, MarketError> {
        self.gated_flow(
            validator,
            ProofKind::Pickup,
            Intent::VerifyPickup(job_id.clone()),
            Intent::PayoutPhase1(job_id.clone()),
        )
        .await
    }

    /// Validates delivery proof, then completes the job and pays phase 2.
    pub async fn confirm_delivery<V: ProofValidator>(
        &mut self,
        validator: &V,
        job_id: &JobId,
    ) -> Result<FlowOutcome, MarketError> {
        self.gated_flow(
            validator,
            ProofKind::Delivery,
            Intent::CompleteJob(job_id.clone()),
            Intent::PayoutPhase2(job_id.clone()),
        )
        .await
    }

    /// Strategic advice for the acting role.
    pub async fn advice<A: Advisor>(&self, advisor: &A) -> Result<String, OracleError> {
        advisor
            .strategic_advice(self.state.current_role, &self.state)
            .await
    }

    /// Compliance report for the acting role.
    pub async fn compliance_report<A: Advisor>(&self, advisor: &A) -> Result<String, OracleError> {
        advisor
            .compliance_report(self.state.current_role, &self.state)
            .await
    }

    /// Jobs stranded between a verification step and its payout.
    #[must_use]
    pub fn stalled_jobs(&self) -> Vec<&Job> {
        self.lifecycle.stalled_jobs(&self.state)
    }

    async fn gated_flow<V: ProofValidator>(
        &mut self,
        validator: &V,
        kind: ProofKind,
        verify: Intent,
        payout: Intent,
    ) -> Result<FlowOutcome, MarketError> {
        // Dry-run the first step so a doomed flow never reaches the oracle.
        if let Err(e) = self.apply(&verify) {
            self.audit_rejected(&verify, &e);
            return Err(e);
        }
        let Some(job_id) = verify.job_id().cloned() else {
            return Err(MarketError::Validation("gated flow without a job".into()));
        };

        let verdict = self.consult(validator, kind, &job_id).await;
        if !verdict.valid {
            self.audit_proof_rejected(&verify, &job_id, kind, &verdict.reason);
            return Ok(FlowOutcome::Rejected {
                reason: verdict.reason,
            });
        }

        self.dispatch(verify)?;
        if let Err(e) = self.dispatch(payout) {
            warn!(%job_id, error = %e, "payout failed after verification, job is stalled");
            return Err(e);
        }
        Ok(FlowOutcome::Advanced {
            reason: verdict.reason,
        })
    }

    async fn consult<V: ProofValidator>(&self, validator: &V, kind: ProofKind, job_id: &JobId) -> Verdict {
        match tokio::time::timeout(self.oracle_timeout, validator.validate(kind, job_id)).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                warn!(%job_id, %kind, error = %e, "proof validator failed");
                Verdict::reject(ORACLE_FAILURE_REASON)
            }
            Err(_) => {
                let e = OracleError::Timeout(self.oracle_timeout);
                warn!(%job_id, %kind, error = %e, "proof validator timed out");
                Verdict::reject(ORACLE_FAILURE_REASON)
            }
        }
    }

    fn apply(&self, intent: &Intent) -> Result<AppState, MarketError> {
        let lc = &self.lifecycle;
        let state = &self.state;
        match intent {
            Intent::CreateJob(draft) => lc.create_job(state, draft.clone()),
            Intent::FundJob(id) => lc.fund_job(state, id),
            Intent::AcceptJob { job_id, driver_id } => lc.accept_job(state, job_id, driver_id),
            Intent::VerifyPickup(id) => lc.verify_pickup(state, id),
            Intent::PayoutPhase1(id) => lc.process_phase1_payout(state, id),
            Intent::CompleteJob(id) => lc.complete_job(state, id),
            Intent::PayoutPhase2(id) => lc.process_phase2_payout(state, id),
            Intent::SettleDriverFunds => lc.settle_driver_funds(state),
            Intent::RaiseDispute { job_id, reason } => lc.raise_dispute(state, job_id, reason),
            Intent::ResolveDispute { job_id, ruling } => lc.resolve_dispute(state, job_id, *ruling),
            Intent::TopUp(amount) => lc.top_up_wallet(state, *amount),
            Intent::Withdraw(amount) => lc.withdraw_wallet(state, *amount),
            Intent::SwitchRole(role) => lc.switch_role(state, *role),
        }
    }

    fn audit_committed(&self, intent: &Intent, next: &AppState) {
        let before = &self.state;
        let actor = before.current_role.as_str();
        let event = match intent {
            Intent::SwitchRole(role) => {
                info!(from = %before.current_role, to = %role, "role switched");
                return;
            }
            Intent::TopUp(amount) | Intent::Withdraw(amount) => AuditEvent::wallet_movement(
                next.operator_wallet.id(),
                intent.action(),
                amount.to_string(),
            ),
            Intent::SettleDriverFunds => AuditEvent::wallet_movement(
                next.driver_wallet.id(),
                intent.action(),
                before.driver_wallet.pending().to_string(),
            ),
            Intent::RaiseDispute { job_id, reason } => AuditEvent::dispute_raised(
                job_id.as_str(),
                state_name(before, job_id),
                reason.as_str(),
            ),
            _ => {
                let Some(job_id) = intent.job_id().or_else(|| next.jobs.first().map(|job| &job.id))
                else {
                    return;
                };
                let moved = escrow_delta(before, next);
                AuditEvent::job_transition(
                    job_id.as_str(),
                    intent.action(),
                    state_name(before, job_id),
                    state_name(next, job_id),
                    (!moved.is_zero()).then(|| moved.to_string()),
                )
            }
        };
        self.audit.log(&event.with_actor(actor));
    }

    fn audit_rejected(&self, intent: &Intent, error: &MarketError) {
        let severity = if error.is_invariant_violation() {
            Severity::High
        } else {
            Severity::Medium
        };
        let mut builder = AuditEvent::builder()
            .severity(severity)
            .actor(self.state.current_role.as_str())
            .action(intent.action())
            .kind(error.kind())
            .reason(error.to_string());
        if let Some(job_id) = intent.job_id() {
            builder = builder.job_id(job_id.as_str());
        }
        match builder.build() {
            Ok(event) => self.audit.log(&event),
            Err(e) => warn!(error = %e, "failed to build rejection audit event"),
        }
    }

    fn audit_proof_rejected(&self, intent: &Intent, job_id: &JobId, kind: ProofKind, reason: &str) {
        let built = AuditEvent::builder()
            .severity(Severity::Medium)
            .actor(self.state.current_role.as_str())
            .action(intent.action())
            .job_id(job_id.as_str())
            .kind("proof_rejected")
            .reason(reason)
            .metadata("proof", serde_json::Value::String(kind.to_string()))
            .build();
        match built {
            Ok(event) => self.audit.log(&event),
            Err(e) => warn!(error = %e, "failed to build proof audit event"),
        }
    }
}

fn state_name(state: &AppState, job_id: &JobId) -> &'static str {
    state.job(job_id).map_or("NONE", |job| job.state.as_str())
}

fn escrow_delta(before: &AppState, after: &AppState) -> Amount {
    let (a, b) = (before.operator_wallet.escrow(), after.operator_wallet.escrow());
    if a > b { a.saturating_sub(b) } else { b.saturating_sub(a) }
}

impl Shell<TracingAuditLogger> {
    /// Creates a shell that audits through `tracing`.
    #[must_use]
    pub fn with_tracing(state: AppState, lifecycle: Lifecycle) -> Self {
        Self::new(state, lifecycle, TracingAuditLogger::new())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use arween_audit::MemoryAuditLogger;

    use crate::job::JobState;
    use crate::oracle::FakeValidator;

    fn shell() -> (Shell<Arc<MemoryAuditLogger>>, Arc<MemoryAuditLogger>) {
        let audit = Arc::new(MemoryAuditLogger::new());
        let shell = Shell::new(AppState::demo(), Lifecycle::default(), Arc::clone(&audit));
        (shell, audit)
    }

    fn a001() -> JobId {
        JobId::new("JOB-24-A001")
    }

    #[test]
    fn dispatch_commits_and_audits() {
        let (mut shell, audit) = shell();
        let state = shell
            .dispatch(Intent::AcceptJob { job_id: a001(), driver_id: "u_dr_001".into() })
            .unwrap();
        assert_eq!(state.job(&a001()).map(|j| j.state), Some(JobState::Accepted));

        let events = audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "job_transition");
        assert_eq!(events[0].severity(), Severity::Info);
    }

    #[test]
    fn failed_dispatch_keeps_snapshot_and_audits_rejection() {
        let (mut shell, audit) = shell();
        let before = shell.state().clone();
        let err = shell.dispatch(Intent::FundJob(a001())).unwrap_err();
        assert!(matches!(err, MarketError::Unauthorized { .. }));
        assert_eq!(shell.state(), &before);

        let events = audit.events();
        assert_eq!(events[0].event_type(), "transition_rejected");
        assert_eq!(events[0].severity(), Severity::Medium);
    }

    #[test]
    fn missing_job_is_high_severity() {
        let (mut shell, audit) = shell();
        let _ = shell.dispatch(Intent::VerifyPickup(JobId::new("JOB-none")));
        assert_eq!(audit.events()[0].severity(), Severity::High);
    }

    #[test]
    fn dispute_is_critical() {
        let (mut shell, audit) = shell();
        shell
            .dispatch(Intent::RaiseDispute { job_id: a001(), reason: "cargo lost".into() })
            .unwrap();
        assert_eq!(audit.events()[0].severity(), Severity::Critical);
    }

    #[test]
    fn role_switch_is_not_audited() {
        let (mut shell, audit) = shell();
        shell.dispatch(Intent::SwitchRole(Role::Operator)).unwrap();
        assert_eq!(shell.state().current_role, Role::Operator);
        assert!(audit.is_empty());
    }

    #[tokio::test]
    async fn confirm_pickup_pays_phase_one() {
        let (mut shell, _) = shell();
        shell
            .dispatch(Intent::AcceptJob { job_id: a001(), driver_id: "u_dr_001".into() })
            .unwrap();
        let outcome = shell.confirm_pickup(&FakeValidator::approving(), &a001()).await.unwrap();
        assert!(matches!(outcome, FlowOutcome::Advanced { .. }));
        assert_eq!(shell.state().job(&a001()).map(|j| j.state), Some(JobState::Phase1Paid));
        assert!(shell.stalled_jobs().is_empty());
    }

    #[tokio::test]
    async fn rejected_proof_changes_nothing() {
        let (mut shell, audit) = shell();
        shell
            .dispatch(Intent::AcceptJob { job_id: a001(), driver_id: "u_dr_001".into() })
            .unwrap();
        let before = shell.state().clone();
        let outcome = shell
            .confirm_pickup(&FakeValidator::rejecting("photo is blank"), &a001())
            .await
            .unwrap();
        assert_eq!(outcome, FlowOutcome::Rejected { reason: "photo is blank".into() });
        assert_eq!(shell.state(), &before);
        assert_eq!(audit.events().last().map(AuditEvent::event_type), Some("transition_rejected"));
    }

    #[tokio::test]
    async fn oracle_error_counts_as_rejection() {
        let (mut shell, _) = shell();
        shell
            .dispatch(Intent::AcceptJob { job_id: a001(), driver_id: "u_dr_001".into() })
            .unwrap();
        let validator = FakeValidator::approving();
        validator.push(Err(OracleError::Unavailable("503".into()))).await;
        let outcome = shell.confirm_pickup(&validator, &a001()).await.unwrap();
        assert_eq!(outcome, FlowOutcome::Rejected { reason: ORACLE_FAILURE_REASON.into() });
        assert_eq!(shell.state().job(&a001()).map(|j| j.state), Some(JobState::Accepted));
    }

    #[tokio::test]
    async fn doomed_flow_skips_oracle() {
        let (mut shell, _) = shell();
        let validator = FakeValidator::approving();
        let err = shell.confirm_delivery(&validator, &a001()).await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidState { state: JobState::Funded, .. }));
        assert!(validator.calls().await.is_empty());
    }

    #[tokio::test]
    async fn full_delivery_flow() {
        let (mut shell, _) = shell();
        let validator = FakeValidator::approving();
        shell
            .dispatch(Intent::AcceptJob { job_id: a001(), driver_id: "u_dr_001".into() })
            .unwrap();
        shell.confirm_pickup(&validator, &a001()).await.unwrap();
        shell.confirm_delivery(&validator, &a001()).await.unwrap();
        let state = shell.state();
        assert_eq!(state.job(&a001()).map(|j| j.state), Some(JobState::Phase2Funded));
        assert_eq!(state.driver_wallet.pending(), Amount::from_satang(412_250));
        assert_eq!(validator.calls().await.len(), 2);
    }
}
