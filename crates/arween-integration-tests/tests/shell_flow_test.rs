//! Integration tests for the shell: oracle-gated flows, auditing and
//! persistence.

use std::sync::Arc;
use std::time::Duration;

use arween_audit::{AuditEvent, MemoryAuditLogger, Severity};
use arween_core::Amount;
use arween_market::{
    AppState, FakeAdvisor, FakeValidator, FlowOutcome, Intent, JobId, JobState, JsonFileStore,
    Lifecycle, LedgerReporter, MarketError, OracleError, ProofKind, ProofValidator, Role, Shell,
    SnapshotStore, Verdict,
};

fn a001() -> JobId {
    JobId::new("JOB-24-A001")
}

fn demo_shell() -> (Shell<Arc<MemoryAuditLogger>>, Arc<MemoryAuditLogger>) {
    let audit = Arc::new(MemoryAuditLogger::new());
    let shell = Shell::new(AppState::demo(), Lifecycle::default(), Arc::clone(&audit));
    (shell, audit)
}

fn accepted_shell() -> (Shell<Arc<MemoryAuditLogger>>, Arc<MemoryAuditLogger>) {
    let (mut shell, audit) = demo_shell();
    shell
        .dispatch(Intent::AcceptJob {
            job_id: a001(),
            driver_id: "u_dr_001".into(),
        })
        .unwrap();
    (shell, audit)
}

/// Validator that never answers in time.
struct SlowValidator;

impl ProofValidator for SlowValidator {
    async fn validate(&self, _kind: ProofKind, _job_id: &JobId) -> Result<Verdict, OracleError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Verdict::accept("too late"))
    }
}

// ============================================================================
// Oracle-gated flows
// ============================================================================

#[tokio::test]
async fn pickup_and_delivery_with_approving_validator() {
    let (mut shell, audit) = accepted_shell();
    let validator = FakeValidator::approving();

    let outcome = shell.confirm_pickup(&validator, &a001()).await.unwrap();
    assert!(matches!(outcome, FlowOutcome::Advanced { .. }));
    assert_eq!(shell.state().job(&a001()).map(|j| j.state), Some(JobState::Phase1Paid));

    let outcome = shell.confirm_delivery(&validator, &a001()).await.unwrap();
    assert!(matches!(outcome, FlowOutcome::Advanced { .. }));
    assert_eq!(shell.state().job(&a001()).map(|j| j.state), Some(JobState::Phase2Funded));
    assert_eq!(shell.state().driver_wallet.pending(), Amount::from_satang(412_250));

    let calls = validator.calls().await;
    assert_eq!(calls, vec![(ProofKind::Pickup, a001()), (ProofKind::Delivery, a001())]);

    // accept + verify + phase 1 + complete + phase 2
    let transitions = audit
        .events()
        .iter()
        .filter(|event| event.event_type() == "job_transition")
        .count();
    assert_eq!(transitions, 5);
}

#[tokio::test]
async fn rejected_proof_leaves_state_untouched() {
    let (mut shell, audit) = accepted_shell();
    let before = shell.state().clone();
    let logged = audit.len();

    let outcome = shell
        .confirm_pickup(&FakeValidator::rejecting("blurry photo"), &a001())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        FlowOutcome::Rejected {
            reason: "blurry photo".into()
        }
    );
    assert_eq!(shell.state(), &before);

    let events = audit.events();
    assert_eq!(events.len(), logged + 1);
    match events.last() {
        Some(AuditEvent::TransitionRejected { rejection, .. }) => {
            assert_eq!(rejection.kind, "proof_rejected");
            assert_eq!(rejection.reason, "blurry photo");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn doomed_flow_never_reaches_the_oracle() {
    let (mut shell, audit) = demo_shell();
    let validator = FakeValidator::approving();

    // JOB-24-A001 is FUNDED but nobody has accepted it
    let err = shell.confirm_pickup(&validator, &a001()).await.unwrap_err();
    assert!(matches!(err, MarketError::InvalidState { .. }));
    assert!(validator.calls().await.is_empty());
    assert_eq!(audit.events().last().map(AuditEvent::severity), Some(Severity::Medium));
}

#[tokio::test]
async fn oracle_failure_counts_as_rejection() {
    let (mut shell, _audit) = accepted_shell();
    let validator = FakeValidator::approving();
    validator
        .push(Err(OracleError::Unavailable("vision service down".into())))
        .await;

    let outcome = shell.confirm_pickup(&validator, &a001()).await.unwrap();
    assert!(matches!(outcome, FlowOutcome::Rejected { .. }));
    assert_eq!(shell.state().job(&a001()).map(|j| j.state), Some(JobState::Accepted));

    // the script is drained, so the retry is approved
    let outcome = shell.confirm_pickup(&validator, &a001()).await.unwrap();
    assert!(matches!(outcome, FlowOutcome::Advanced { .. }));
}

#[tokio::test]
async fn slow_oracle_times_out() {
    let (shell, _audit) = accepted_shell();
    let mut shell = shell.with_oracle_timeout(Duration::from_millis(20));

    let outcome = shell.confirm_pickup(&SlowValidator, &a001()).await.unwrap();
    assert!(matches!(outcome, FlowOutcome::Rejected { .. }));
    assert_eq!(shell.state().job(&a001()).map(|j| j.state), Some(JobState::Accepted));
}

// ============================================================================
// Dispatch and auditing
// ============================================================================

#[test]
fn failed_dispatch_is_audited_and_changes_nothing() {
    let (mut shell, audit) = demo_shell();
    let before = shell.state().clone();

    let err = shell.dispatch(Intent::TopUp(Amount::from_baht(100))).unwrap_err();
    assert!(matches!(err, MarketError::Unauthorized { role: Role::Driver, .. }));
    assert_eq!(shell.state(), &before);

    match audit.events().last() {
        Some(AuditEvent::TransitionRejected { rejection, .. }) => {
            assert_eq!(rejection.kind, "unauthorized");
            assert_eq!(rejection.action, "top_up_wallet");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn dispute_is_audited_as_critical() {
    let (mut shell, audit) = accepted_shell();
    shell
        .dispatch(Intent::RaiseDispute {
            job_id: a001(),
            reason: "driver unreachable".into(),
        })
        .unwrap();

    let last = audit.events().last().cloned().unwrap();
    assert_eq!(last.event_type(), "dispute_raised");
    assert_eq!(last.severity(), Severity::Critical);
}

#[test]
fn role_switch_is_not_audited() {
    let (mut shell, audit) = demo_shell();
    shell.dispatch(Intent::SwitchRole(Role::Operator)).unwrap();
    assert!(audit.is_empty());
    assert_eq!(shell.state().current_role, Role::Operator);
}

// ============================================================================
// Advice and persistence
// ============================================================================

#[tokio::test]
async fn advisor_is_read_only() {
    let (shell, _audit) = demo_shell();
    let before = shell.state().clone();

    let report = shell.compliance_report(&LedgerReporter::default()).await.unwrap();
    assert!(report.contains("Digital Signature"));
    assert_eq!(
        shell.advice(&FakeAdvisor::answering("keep going")).await.unwrap(),
        "keep going"
    );
    assert!(shell.advice(&FakeAdvisor::unavailable()).await.is_err());
    assert_eq!(shell.state(), &before);
}

#[tokio::test]
async fn snapshot_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("state.json"));

    let (mut shell, _audit) = accepted_shell();
    shell.confirm_pickup(&FakeValidator::approving(), &a001()).await.unwrap();
    store.save(shell.state()).unwrap();

    let restored = store.load().unwrap().unwrap();
    assert_eq!(&restored, shell.state());
    assert!(!restored.ledger.is_empty());

    let mut reopened = Shell::with_tracing(restored, Lifecycle::default());
    let err = reopened.dispatch(Intent::SettleDriverFunds).unwrap_err();
    assert_eq!(err, MarketError::NothingToSettle);
}
