//! Dispute raising and arbitration.
//!
//! Raising a dispute freezes the workflow without touching any wallet. The
//! ruling then settles whatever the job still holds in escrow, read from
//! [`Job::escrow_outstanding`](crate::job::Job::escrow_outstanding): the full
//! value if phase 1 never ran, the second tranche if it did, nothing if the job
//! was never funded.

use arween_core::{Amount, LedgerEntry};
use tracing::debug;

use crate::error::{MarketError, invariant};
use crate::job::{DisputeRuling, JobId, JobState};
use crate::lifecycle::{Lifecycle, locate, release_from_escrow};
use crate::payout;
use crate::snapshot::AppState;

impl Lifecycle {
    /// Freezes a job pending arbitration.
    pub fn raise_dispute(
        &self,
        state: &AppState,
        job_id: &JobId,
        reason: &str,
    ) -> Result<AppState, MarketError> {
        let idx = locate(state, job_id)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(MarketError::Validation("dispute reason must not be empty".into()));
        }
        if state.jobs[idx].was_arbitrated() {
            return Err(state.jobs[idx].invalid_state("dispute", "a job without a ruling"));
        }

        let mut next = state.clone();
        let job = &mut next.jobs[idx];
        job.transition_to(JobState::Dispute, "dispute", "any state before PHASE2_FUNDED")?;
        job.dispute_reason = Some(reason.to_string());

        next.ledger.record(
            LedgerEntry::debit(format!("Dispute raised: {reason}"), Amount::ZERO)
                .for_job(job_id.as_str()),
        );
        debug!(%job_id, reason, "dispute raised");
        Ok(next)
    }

    /// Settles a disputed job's remaining escrow and closes it as `COMPLETED`.
    ///
    /// A refund returns the remainder to the operator and penalises the
    /// driver; a payout sends it, less the platform fee, to the driver and
    /// penalises the operator. A job no driver accepted can only be refunded,
    /// and nobody is penalised for it.
    pub fn resolve_dispute(
        &self,
        state: &AppState,
        job_id: &JobId,
        ruling: DisputeRuling,
    ) -> Result<AppState, MarketError> {
        let idx = locate(state, job_id)?;
        if state.jobs[idx].state != JobState::Dispute {
            return Err(state.jobs[idx].invalid_state("resolve", "DISPUTE"));
        }
        if ruling == DisputeRuling::Payout && !state.jobs[idx].has_driver() {
            return Err(MarketError::Validation(format!(
                "job {job_id} has no driver to compensate, only a refund ruling applies"
            )));
        }
        let penalty = self.config().dispute_penalty();

        let mut next = state.clone();
        let job = &mut next.jobs[idx];
        let remaining = job.escrow_outstanding;
        release_from_escrow(job, remaining)?;
        job.ruling = Some(ruling);
        job.transition_to(JobState::Completed, "resolve", "DISPUTE")?;
        let driver_bound = job.has_driver();

        next.operator_wallet.release_escrow(remaining).map_err(invariant)?;
        if driver_bound {
            next.driver_wallet.clear_reserved(remaining);
        }

        let id = job_id.as_str();
        match ruling {
            DisputeRuling::Refund => {
                next.operator_wallet.credit_available(remaining)?;
                if driver_bound {
                    next.driver_wallet.adjust_reputation(-penalty);
                }
                next.ledger.record(
                    LedgerEntry::credit(
                        format!("Dispute ruling: escrow refunded for job {job_id}"),
                        remaining,
                    )
                    .for_job(id),
                );
            }
            DisputeRuling::Payout => {
                let split = payout::ruling_payout(remaining, self.config())?;
                next.driver_wallet.credit_available(split.net)?;
                next.operator_wallet.adjust_reputation(-penalty);
                next.ledger.record_batch([
                    LedgerEntry::credit(
                        format!("Dispute ruling: compensation paid for job {job_id}"),
                        split.net,
                    )
                    .for_job(id),
                    LedgerEntry::debit(
                        format!("Platform fee on ruling ({})", self.config().platform_fee()),
                        split.fee,
                    )
                    .for_job(id),
                ]);
            }
        }
        debug!(%job_id, %ruling, %remaining, "dispute resolved");
        Ok(next)
    }
}
