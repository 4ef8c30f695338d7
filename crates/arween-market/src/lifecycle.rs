//! The job lifecycle engine.
//!
//! Every transition borrows the current [`AppState`] and returns a wholly new
//! snapshot, or an error with the input untouched. Preconditions are checked
//! against the input; money moves on a private copy that is dropped on any
//! failure, so a transition can never leave a half-applied state behind.
//!
//! ```text
//! CREATED -> FUNDED -> ACCEPTED -> PICKUP_VERIFIED -> PHASE1_PAID
//!         -> COMPLETED -> PHASE2_FUNDED
//! (any non-terminal) -> DISPUTE -> COMPLETED
//! ```

use arween_core::{Amount, LedgerEntry};
use chrono::Utc;
use tracing::debug;

use crate::config::MarketConfig;
use crate::error::{MarketError, invariant};
use crate::job::{Job, JobDraft, JobId, JobState};
use crate::payout;
use crate::snapshot::{AppState, Role};

/// Applies lifecycle transitions under a [`MarketConfig`].
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    config: MarketConfig,
}

impl Lifecycle {
    /// Creates an engine with the given configuration.
    #[must_use]
    pub const fn new(config: MarketConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Posts a new job in `CREATED`.
    pub fn create_job(&self, state: &AppState, draft: JobDraft) -> Result<AppState, MarketError> {
        require_role(state, Role::Operator, "create jobs")?;
        draft.validate()?;

        let reputation = state.operator_wallet.reputation();
        if draft.value_total > self.config.compliance_value_threshold()
            && reputation < self.config.compliance_min_reputation()
        {
            return Err(MarketError::Compliance {
                value: draft.value_total,
                reputation,
                threshold: self.config.compliance_value_threshold(),
                min_reputation: self.config.compliance_min_reputation(),
            });
        }

        let now = Utc::now();
        let id = JobId::generate(now, |candidate| state.has_job(candidate));
        let job = draft.into_job(id, state.operator_wallet.owner_id().to_string(), now);
        debug!(job_id = %job.id, value = %job.value_total, "job created");

        let mut next = state.clone();
        next.jobs.insert(0, job);
        Ok(next)
    }

    /// Locks the job's full value in the operator's escrow.
    pub fn fund_job(&self, state: &AppState, job_id: &JobId) -> Result<AppState, MarketError> {
        require_role(state, Role::Operator, "fund jobs")?;
        let idx = locate(state, job_id)?;

        let mut next = state.clone();
        let job = &mut next.jobs[idx];
        job.transition_to(JobState::Funded, "fund", "CREATED")?;
        let value = job.value_total;
        job.escrow_outstanding = value;

        next.operator_wallet.lock_escrow(value)?;
        next.ledger.record(
            LedgerEntry::debit(format!("Escrow locked for job {job_id}"), value)
                .for_job(job_id.as_str()),
        );
        debug!(%job_id, %value, "job funded");
        Ok(next)
    }

    /// Binds a driver to a funded job and reserves its value on their side.
    pub fn accept_job(
        &self,
        state: &AppState,
        job_id: &JobId,
        driver_id: &str,
    ) -> Result<AppState, MarketError> {
        require_role(state, Role::Driver, "accept jobs")?;
        if driver_id.trim().is_empty() {
            return Err(MarketError::Validation("driver_id must not be empty".into()));
        }
        let idx = locate(state, job_id)?;
        if state.jobs[idx].has_driver() {
            return Err(state.jobs[idx].invalid_state("accept", "FUNDED and unassigned"));
        }

        let mut next = state.clone();
        let job = &mut next.jobs[idx];
        job.transition_to(JobState::Accepted, "accept", "FUNDED")?;
        job.driver_id = Some(driver_id.to_string());
        let value = job.value_total;

        next.driver_wallet.reserve(value)?;
        debug!(%job_id, driver_id, "job accepted");
        Ok(next)
    }

    /// Records an accepted pickup proof.
    pub fn verify_pickup(&self, state: &AppState, job_id: &JobId) -> Result<AppState, MarketError> {
        let idx = locate(state, job_id)?;
        let mut next = state.clone();
        next.jobs[idx].transition_to(JobState::PickupVerified, "verify pickup for", "ACCEPTED")?;
        debug!(%job_id, "pickup verified");
        Ok(next)
    }

    /// Releases the first tranche: net to the driver's available balance,
    /// platform fee and withholding tax retained.
    pub fn process_phase1_payout(
        &self,
        state: &AppState,
        job_id: &JobId,
    ) -> Result<AppState, MarketError> {
        let idx = locate(state, job_id)?;
        let split = payout::phase_one(state.jobs[idx].value_total, &self.config)?;

        let mut next = state.clone();
        let job = &mut next.jobs[idx];
        job.transition_to(JobState::Phase1Paid, "pay phase 1 of", "PICKUP_VERIFIED")?;
        release_from_escrow(job, split.gross)?;
        job.phase1_paid_at = Some(Utc::now());

        next.operator_wallet.release_escrow(split.gross).map_err(invariant)?;
        next.driver_wallet.release_reserved(split.gross).map_err(invariant)?;
        next.driver_wallet.credit_available(split.net)?;
        next.driver_wallet.withhold_tax(split.tax)?;

        let id = job_id.as_str();
        next.ledger.record_batch([
            LedgerEntry::debit(format!("Phase 1 release for job {job_id}"), split.gross).for_job(id),
            LedgerEntry::credit("Phase 1 net payout to driver", split.net).for_job(id),
            LedgerEntry::debit(
                format!("Platform fee ({})", self.config.platform_fee()),
                split.fee,
            )
            .for_job(id),
            LedgerEntry::debit(
                format!("Withholding tax ({})", self.config.withholding_tax()),
                split.tax,
            )
            .for_job(id),
        ]);
        debug!(%job_id, gross = %split.gross, net = %split.net, "phase 1 paid");
        Ok(next)
    }

    /// Marks delivery done and rewards both parties.
    pub fn complete_job(&self, state: &AppState, job_id: &JobId) -> Result<AppState, MarketError> {
        let idx = locate(state, job_id)?;
        if state.jobs[idx].state != JobState::Phase1Paid {
            return Err(state.jobs[idx].invalid_state("complete", "PHASE1_PAID"));
        }

        let mut next = state.clone();
        let job = &mut next.jobs[idx];
        job.transition_to(JobState::Completed, "complete", "PHASE1_PAID")?;
        let carbon = job.projected_carbon_credits;

        next.operator_wallet.adjust_reputation(self.config.operator_completion_bonus());
        next.driver_wallet.adjust_reputation(self.config.driver_completion_bonus());
        for wallet in [&mut next.operator_wallet, &mut next.driver_wallet] {
            wallet.award_carbon(carbon);
            wallet.refresh_tier();
        }
        debug!(%job_id, carbon, "job completed");
        Ok(next)
    }

    /// Releases the second tranche into the driver's pending balance.
    pub fn process_phase2_payout(
        &self,
        state: &AppState,
        job_id: &JobId,
    ) -> Result<AppState, MarketError> {
        let idx = locate(state, job_id)?;
        if state.jobs[idx].was_arbitrated() {
            return Err(state.jobs[idx].invalid_state("pay phase 2 of", "COMPLETED without a ruling"));
        }
        let split = payout::phase_two(state.jobs[idx].value_total, &self.config)?;

        let mut next = state.clone();
        let job = &mut next.jobs[idx];
        job.transition_to(JobState::Phase2Funded, "pay phase 2 of", "COMPLETED")?;
        release_from_escrow(job, split.gross)?;
        job.phase2_paid_at = Some(Utc::now());

        next.operator_wallet.release_escrow(split.gross).map_err(invariant)?;
        next.driver_wallet.release_reserved(split.gross).map_err(invariant)?;
        next.driver_wallet.credit_pending(split.net)?;
        next.driver_wallet.withhold_tax(split.tax)?;

        let id = job_id.as_str();
        next.ledger.record_batch([
            LedgerEntry::debit(format!("Phase 2 release for job {job_id}"), split.gross).for_job(id),
            LedgerEntry::credit("Phase 2 net payout to pending (T+1)", split.net).for_job(id),
            LedgerEntry::debit(
                format!("Withholding tax ({})", self.config.withholding_tax()),
                split.tax,
            )
            .for_job(id),
        ]);
        debug!(%job_id, gross = %split.gross, net = %split.net, "phase 2 funded");
        Ok(next)
    }

    /// Clears the driver's whole pending balance into available.
    pub fn settle_driver_funds(&self, state: &AppState) -> Result<AppState, MarketError> {
        if state.driver_wallet.pending().is_zero() {
            return Err(MarketError::NothingToSettle);
        }

        let mut next = state.clone();
        let settled = next.driver_wallet.settle_pending()?;
        next.ledger
            .record(LedgerEntry::credit("T+1 settlement: pending funds cleared", settled));
        debug!(%settled, "driver funds settled");
        Ok(next)
    }

    /// Adds funds to the operator's available balance.
    pub fn top_up_wallet(&self, state: &AppState, amount: Amount) -> Result<AppState, MarketError> {
        require_role(state, Role::Operator, "top up the wallet")?;
        require_positive(amount)?;

        let mut next = state.clone();
        next.operator_wallet.credit_available(amount)?;
        next.ledger.record(LedgerEntry::credit("Wallet top-up", amount));
        debug!(%amount, "operator wallet topped up");
        Ok(next)
    }

    /// Removes funds from the operator's available balance.
    pub fn withdraw_wallet(&self, state: &AppState, amount: Amount) -> Result<AppState, MarketError> {
        require_role(state, Role::Operator, "withdraw from the wallet")?;
        require_positive(amount)?;

        let mut next = state.clone();
        next.operator_wallet.debit_available(amount)?;
        next.ledger.record(LedgerEntry::debit("Wallet withdrawal", amount));
        debug!(%amount, "operator wallet withdrawal");
        Ok(next)
    }

    /// Changes the acting role.
    pub fn switch_role(&self, state: &AppState, role: Role) -> Result<AppState, MarketError> {
        let mut next = state.clone();
        next.current_role = role;
        debug!(%role, "role switched");
        Ok(next)
    }

    /// Jobs stranded between a verification and its payout.
    #[must_use]
    pub fn stalled_jobs<'a>(&self, state: &'a AppState) -> Vec<&'a Job> {
        state.jobs.iter().filter(|job| job.is_stalled()).collect()
    }
}

fn require_role(
    state: &AppState,
    role: Role,
    operation: &'static str,
) -> Result<(), MarketError> {
    if state.current_role == role {
        Ok(())
    } else {
        Err(MarketError::Unauthorized {
            role: state.current_role,
            operation,
        })
    }
}

pub(crate) fn locate(state: &AppState, job_id: &JobId) -> Result<usize, MarketError> {
    state
        .job_index(job_id)
        .ok_or_else(|| MarketError::JobNotFound(job_id.to_string()))
}

fn require_positive(amount: Amount) -> Result<(), MarketError> {
    if amount.is_zero() {
        Err(MarketError::Validation("amount must be positive".into()))
    } else {
        Ok(())
    }
}

pub(crate) fn release_from_escrow(job: &mut Job, amount: Amount) -> Result<(), MarketError> {
    job.escrow_outstanding = job.escrow_outstanding.checked_sub(amount).ok_or_else(|| {
        MarketError::Arithmetic(format!(
            "job {} has {} outstanding, cannot release {amount}",
            job.id, job.escrow_outstanding
        ))
    })?;
    Ok(())
}
