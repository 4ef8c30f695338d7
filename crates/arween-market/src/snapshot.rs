//! The application snapshot every transition consumes and produces.

use std::fmt;

use arween_core::{Amount, Ledger, Tier, TrustScore, Wallet};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::job::{Job, JobDraft, JobId, JobState};

/// The acting party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Posts and funds jobs.
    Operator,
    /// Accepts and carries jobs.
    Driver,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Operator => "OPERATOR",
            Self::Driver => "DRIVER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete marketplace state: both wallets, all jobs, the ledger and the
/// acting role.
///
/// Jobs and ledger entries are kept newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// Role the next intent acts as.
    pub current_role: Role,
    /// The operator's wallet.
    pub operator_wallet: Wallet,
    /// The driver's wallet.
    pub driver_wallet: Wallet,
    /// All jobs, newest first.
    pub jobs: Vec<Job>,
    /// Append-only ledger, newest first.
    pub ledger: Ledger,
}

impl AppState {
    /// Creates a state with no jobs and an empty ledger.
    #[must_use]
    pub const fn new(current_role: Role, operator_wallet: Wallet, driver_wallet: Wallet) -> Self {
        Self {
            current_role,
            operator_wallet,
            driver_wallet,
            jobs: Vec::new(),
            ledger: Ledger::new(),
        }
    }

    /// Finds a job by ID.
    #[must_use]
    pub fn job(&self, id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| &job.id == id)
    }

    pub(crate) fn job_index(&self, id: &JobId) -> Option<usize> {
        self.jobs.iter().position(|job| &job.id == id)
    }

    /// Returns true if a job with this ID string exists.
    #[must_use]
    pub fn has_job(&self, id: &str) -> bool {
        self.jobs.iter().any(|job| job.id.as_str() == id)
    }

    /// Wallet of the given role.
    #[must_use]
    pub const fn wallet(&self, role: Role) -> &Wallet {
        match role {
            Role::Operator => &self.operator_wallet,
            Role::Driver => &self.driver_wallet,
        }
    }

    /// Sum of escrow still owed by all jobs.
    ///
    /// Equals the operator's escrow balance in any reachable state.
    #[must_use]
    pub fn escrow_committed(&self) -> Amount {
        outstanding(&self.jobs)
    }

    /// A seeded marketplace with five funded jobs on Thai freight lanes.
    ///
    /// The operator's escrow equals the sum of the seeded jobs' values.
    #[must_use]
    pub fn demo() -> Self {
        let now = Utc::now();
        let seeds = [
            ("JOB-24-A001", "High-tech electronic components", "Amata City, Rayong", "ICD Lat Krabang", 8_500, 12, 45, 2),
            ("JOB-24-A002", "Royal Project produce (cold chain)", "Chiang Mai collection center", "Talad Thai, Pathum Thani", 14_500, 25, 120, 5),
            ("JOB-24-A003", "Bulk cement powder, 30 t", "Kaeng Khoi, Saraburi", "Bang Sue construction site", 6_200, 15, 30, 8),
            ("JOB-24-A007", "Industrial chemicals (class 3)", "Map Ta Phut, Rayong", "Laem Chabang terminal B", 18_500, 85, 40, 12),
            ("JOB-24-A010", "Urgent medical supplies", "Nonthaburi", "Khon Kaen hospital", 11_000, 45, 90, 20),
        ];

        let jobs: Vec<Job> = seeds
            .into_iter()
            .map(|(id, title, origin, destination, baht, risk, carbon, minutes_ago)| {
                let value = Amount::from_baht(baht);
                let mut job = JobDraft::new(title, origin, destination, value)
                    .with_risk_score(risk)
                    .with_carbon_credits(carbon)
                    .into_job(
                        JobId::new(id),
                        "u_op_001".to_string(),
                        now - Duration::minutes(minutes_ago),
                    );
                job.state = JobState::Funded;
                job.escrow_outstanding = value;
                job
            })
            .collect();

        let escrow = outstanding(&jobs);
        let operator = Wallet::new("w_op_001", "u_op_001")
            .with_available(Amount::from_baht(500_000))
            .with_escrow(escrow)
            .with_reputation(TrustScore::new(85))
            .with_carbon_points(120)
            .with_tier(Tier::Silver);
        let driver = Wallet::new("w_dr_001", "u_dr_001")
            .with_available(Amount::from_baht(1_200))
            .with_reputation(TrustScore::new(92))
            .with_credit_score(780)
            .with_carbon_points(450)
            .with_tax_withheld(Amount::from_baht(3_500))
            .with_tier(Tier::Gold);

        let mut state = Self::new(Role::Driver, operator, driver);
        state.jobs = jobs;
        state
    }
}

fn outstanding(jobs: &[Job]) -> Amount {
    jobs.iter()
        .fold(Amount::ZERO, |sum, job| sum.saturating_add(job.escrow_outstanding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_escrow_matches_funded_jobs() {
        let state = AppState::demo();
        assert_eq!(state.jobs.len(), 5);
        assert!(state.jobs.iter().all(|job| job.state == JobState::Funded));
        assert_eq!(state.operator_wallet.escrow(), Amount::from_baht(58_700));
        assert_eq!(state.escrow_committed(), state.operator_wallet.escrow());
        assert!(state.ledger.is_empty());
    }

    #[test]
    fn demo_wallets() {
        let state = AppState::demo();
        assert_eq!(state.current_role, Role::Driver);
        assert_eq!(state.operator_wallet.available(), Amount::from_baht(500_000));
        assert_eq!(state.operator_wallet.tier(), Tier::Silver);
        assert_eq!(state.driver_wallet.reputation().value(), 92);
        assert_eq!(state.driver_wallet.credit_score(), 780);
        assert_eq!(state.driver_wallet.tax_withheld(), Amount::from_baht(3_500));
    }

    #[test]
    fn job_lookup() {
        let state = AppState::demo();
        let id = JobId::new("JOB-24-A007");
        assert_eq!(state.job(&id).map(|j| j.risk_score), Some(85));
        assert!(state.has_job("JOB-24-A001"));
        assert!(state.job(&JobId::new("JOB-missing")).is_none());
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let state = AppState::demo();
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"current_role\":\"DRIVER\""));
        assert!(json.contains("\"state\":\"FUNDED\""));
        let back: AppState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn wallet_by_role() {
        let state = AppState::demo();
        assert_eq!(state.wallet(Role::Operator).id(), "w_op_001");
        assert_eq!(state.wallet(Role::Driver).id(), "w_dr_001");
    }
}
