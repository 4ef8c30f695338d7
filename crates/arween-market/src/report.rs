//! Local, deterministic [`Advisor`] backed by the snapshot itself.
//!
//! [`LedgerReporter`] renders a Markdown compliance summary for one party and
//! seals it with a BLAKE3 digest of the serialized ledger, so a report can
//! later be matched against the exact ledger it was produced from.

use std::fmt::Write as _;

use arween_core::{Amount, EntryKind, Ledger, Tier, TrustScore};
use chrono::Utc;

use crate::config::MarketConfig;
use crate::job::JobState;
use crate::oracle::{Advisor, OracleError};
use crate::payout;
use crate::snapshot::{AppState, Role};

/// Number of most recent ledger entries listed in a report.
const RECENT_ENTRIES: usize = 10;

/// BLAKE3 digest of the ledger's JSON form.
pub fn ledger_digest(ledger: &Ledger) -> Result<blake3::Hash, serde_json::Error> {
    let bytes = serde_json::to_vec(ledger)?;
    Ok(blake3::hash(&bytes))
}

/// Renders reports and advice from the snapshot without any network call.
#[derive(Debug, Clone, Default)]
pub struct LedgerReporter {
    config: MarketConfig,
}

impl LedgerReporter {
    /// Creates a reporter using the given configuration for rates and values.
    #[must_use]
    pub const fn new(config: MarketConfig) -> Self {
        Self { config }
    }

    /// Renders the Markdown compliance report.
    pub fn render_report(&self, role: Role, state: &AppState) -> Result<String, OracleError> {
        let wallet = state.wallet(role);
        let digest = ledger_digest(&state.ledger)
            .map_err(|e| OracleError::Malformed(format!("ledger not serializable: {e}")))?;

        let mut out = String::new();
        let _ = writeln!(out, "# ARWEEN Compliance Report");
        let _ = writeln!(out);
        let _ = writeln!(out, "- Party: {role} (wallet `{}`)", wallet.id());
        let _ = writeln!(out, "- Generated: {}", Utc::now().to_rfc3339());
        let _ = writeln!(out, "- Reputation: {} ({} tier)", wallet.reputation(), wallet.tier());
        let _ = writeln!(out);

        let _ = writeln!(out, "## Financial Summary");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Balance | Amount |");
        let _ = writeln!(out, "|---|---|");
        for (label, amount) in [
            ("Available", wallet.available()),
            ("Escrow", wallet.escrow()),
            ("Reserved", wallet.reserved()),
            ("Pending (T+1)", wallet.pending()),
        ] {
            let _ = writeln!(out, "| {label} | {amount} |");
        }
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Ledger: {} entries, {} credited, {} debited.",
            state.ledger.len(),
            state.ledger.total(EntryKind::Credit),
            state.ledger.total(EntryKind::Debit),
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "## Withholding Tax");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Tax withheld to date: {} at {} per payout phase.",
            wallet.tax_withheld(),
            self.config.withholding_tax()
        );
        if role == Role::Driver {
            let _ = writeln!(
                out,
                "Withheld on marketplace payouts in this ledger: {}.",
                self.marketplace_tax(state)
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "## Green Achievement");
        let _ = writeln!(out);
        let delivered = state
            .jobs
            .iter()
            .filter(|job| matches!(job.state, JobState::Completed | JobState::Phase2Funded))
            .count();
        let _ = writeln!(
            out,
            "Carbon points: {}, estimated tax shield {} at {} per point. Jobs delivered: {delivered}.",
            wallet.carbon_points(),
            wallet.carbon_tax_shield(self.config.carbon_point_value()),
            self.config.carbon_point_value(),
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "## Recent Ledger Entries");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Time | Type | Amount | Description |");
        let _ = writeln!(out, "|---|---|---|---|");
        for entry in state.ledger.entries().take(RECENT_ENTRIES) {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                entry.kind,
                entry.amount,
                entry.description
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "## Digital Signature");
        let _ = writeln!(out);
        let _ = writeln!(out, "Ledger BLAKE3: `{}`", digest.to_hex());
        Ok(out)
    }

    /// Rule-based advice for the given role.
    #[must_use]
    pub fn render_advice(&self, role: Role, state: &AppState) -> String {
        let wallet = state.wallet(role);
        let mut tips = Vec::new();

        match role {
            Role::Operator => {
                let unfunded: Vec<_> = state
                    .jobs
                    .iter()
                    .filter(|job| job.state == JobState::Created)
                    .collect();
                let needed = unfunded
                    .iter()
                    .fold(Amount::ZERO, |sum, job| sum.saturating_add(job.value_total));
                if !unfunded.is_empty() {
                    tips.push(format!(
                        "{} job(s) await funding, {needed} in total.",
                        unfunded.len()
                    ));
                }
                if needed > wallet.available() {
                    tips.push(format!(
                        "Top up at least {} to fund every posted job.",
                        needed.saturating_sub(wallet.available())
                    ));
                }
                if wallet.reputation() < self.config.compliance_min_reputation() {
                    tips.push(format!(
                        "Reputation {} is below {}: contracts above {} will be rejected.",
                        wallet.reputation(),
                        self.config.compliance_min_reputation(),
                        self.config.compliance_value_threshold()
                    ));
                }
            }
            Role::Driver => {
                if !wallet.pending().is_zero() {
                    tips.push(format!(
                        "Settle {} of pending funds to make them available.",
                        wallet.pending()
                    ));
                }
                let open = state
                    .jobs
                    .iter()
                    .filter(|job| job.state == JobState::Funded && !job.has_driver());
                if let Some(best) = open.min_by_key(|job| (job.risk_score, std::cmp::Reverse(job.value_total))) {
                    tips.push(format!(
                        "Lowest-risk open job: {} ({}, risk {}).",
                        best.id, best.value_total, best.risk_score
                    ));
                }
            }
        }

        let stalled = state.jobs.iter().filter(|job| job.is_stalled()).count();
        if stalled > 0 {
            tips.push(format!("{stalled} job(s) are waiting on a payout step."));
        }
        if let Some((tier, score)) = next_tier(wallet.reputation()) {
            tips.push(format!(
                "{} more reputation reaches {tier}.",
                score - wallet.reputation().value()
            ));
        }
        if tips.is_empty() {
            tips.push("Nothing needs attention.".to_string());
        }
        tips.join("\n")
    }

    fn marketplace_tax(&self, state: &AppState) -> Amount {
        state.jobs.iter().fold(Amount::ZERO, |sum, job| {
            let mut tax = Amount::ZERO;
            if job.phase1_paid_at.is_some() {
                if let Ok(split) = payout::phase_one(job.value_total, &self.config) {
                    tax = tax.saturating_add(split.tax);
                }
            }
            if job.phase2_paid_at.is_some() {
                if let Ok(split) = payout::phase_two(job.value_total, &self.config) {
                    tax = tax.saturating_add(split.tax);
                }
            }
            sum.saturating_add(tax)
        })
    }
}

fn next_tier(score: TrustScore) -> Option<(Tier, u8)> {
    [(Tier::Silver, 80), (Tier::Gold, 90), (Tier::Platinum, 95)]
        .into_iter()
        .find(|&(_, threshold)| score.value() < threshold)
}

impl Advisor for LedgerReporter {
    async fn strategic_advice(&self, role: Role, state: &AppState) -> Result<String, OracleError> {
        Ok(self.render_advice(role, state))
    }

    async fn compliance_report(
        &self,
        role: Role,
        state: &AppState,
    ) -> Result<String, OracleError> {
        self.render_report(role, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobId;
    use crate::lifecycle::Lifecycle;

    fn delivered() -> AppState {
        let lc = Lifecycle::default();
        let id = JobId::new("JOB-24-A001");
        let state = AppState::demo();
        let state = lc.accept_job(&state, &id, "u_dr_001").unwrap();
        let state = lc.verify_pickup(&state, &id).unwrap();
        let state = lc.process_phase1_payout(&state, &id).unwrap();
        let state = lc.complete_job(&state, &id).unwrap();
        lc.process_phase2_payout(&state, &id).unwrap()
    }

    #[test]
    fn digest_changes_with_ledger() {
        let state = delivered();
        let before = ledger_digest(&AppState::demo().ledger).unwrap();
        let after = ledger_digest(&state.ledger).unwrap();
        assert_ne!(before, after);
        assert_eq!(after, ledger_digest(&state.ledger.clone()).unwrap());
    }

    #[test]
    fn report_contains_sections_and_seal() {
        let state = delivered();
        let report = LedgerReporter::default().render_report(Role::Driver, &state).unwrap();
        assert!(report.contains("## Financial Summary"));
        assert!(report.contains("## Withholding Tax"));
        assert!(report.contains("## Green Achievement"));
        assert!(report.contains(&ledger_digest(&state.ledger).unwrap().to_hex().to_string()));
        // 127.50 THB per phase on an 8500 THB job.
        assert!(report.contains("Withheld on marketplace payouts in this ledger: 255.00 THB."));
    }

    #[test]
    fn driver_advice_mentions_pending_and_open_jobs() {
        let state = delivered();
        let advice = LedgerReporter::default().render_advice(Role::Driver, &state);
        assert!(advice.contains("Settle 4122.50 THB"));
        assert!(advice.contains("Lowest-risk open job: JOB-24-A003"));
    }

    #[test]
    fn operator_advice_flags_low_reputation() {
        let mut state = AppState::demo();
        state.operator_wallet = state.operator_wallet.clone().with_reputation(TrustScore::new(60));
        let advice = LedgerReporter::default().render_advice(Role::Operator, &state);
        assert!(advice.contains("below 80%"));
        assert!(advice.contains("20 more reputation reaches SILVER"));
    }

    #[test]
    fn next_tier_thresholds() {
        assert_eq!(next_tier(TrustScore::new(79)), Some((Tier::Silver, 80)));
        assert_eq!(next_tier(TrustScore::new(92)), Some((Tier::Platinum, 95)));
        assert_eq!(next_tier(TrustScore::new(95)), None);
    }

    #[tokio::test]
    async fn advisor_impl_delegates() {
        let state = AppState::demo();
        let reporter = LedgerReporter::default();
        let advice = reporter.strategic_advice(Role::Driver, &state).await.unwrap();
        assert_eq!(advice, reporter.render_advice(Role::Driver, &state));
        assert!(reporter.compliance_report(Role::Operator, &state).await.is_ok());
    }
}
