//! Integration test crate for the ARWEEN marketplace.
//!
//! The tests under `tests/` drive the lifecycle engine, the shell and the
//! snapshot store together. This library only holds the fixtures they share.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use arween_core::{Amount, Tier, TrustScore, Wallet};
use arween_market::{AppState, JobDraft, JobId, Lifecycle, MarketError, Role};

/// Driver owner ID used by the fixtures.
pub const DRIVER_ID: &str = "u_dr_test";

/// A snapshot with an operator holding `operator_baht` and the given
/// reputation, an empty driver wallet at reputation 92, and no jobs.
#[must_use]
pub fn fresh_state(operator_baht: u64, operator_reputation: u8) -> AppState {
    let reputation = TrustScore::new(operator_reputation);
    let operator = Wallet::new("w_op_test", "u_op_test")
        .with_available(Amount::from_baht(operator_baht))
        .with_reputation(reputation)
        .with_tier(Tier::for_score(reputation));
    let driver = Wallet::new("w_dr_test", DRIVER_ID).with_reputation(TrustScore::new(92));
    AppState::new(Role::Operator, operator, driver)
}

/// Posts a job worth `value_baht` as the operator and returns its ID.
///
/// # Errors
///
/// Returns the engine's rejection.
pub fn post_job(engine: &Lifecycle, state: &AppState, value_baht: u64) -> Result<(AppState, JobId), MarketError> {
    let state = engine.switch_role(state, Role::Operator)?;
    let draft = JobDraft::new("Test cargo", "Lat Krabang", "Laem Chabang", Amount::from_baht(value_baht))
        .with_risk_score(10)
        .with_carbon_credits(25);
    let next = engine.create_job(&state, draft)?;
    let id = next
        .jobs
        .iter()
        .find(|job| !state.has_job(job.id.as_str()))
        .map(|job| job.id.clone())
        .ok_or_else(|| MarketError::Validation("created job missing from snapshot".into()))?;
    Ok((next, id))
}

/// Posts, funds and accepts a job worth `value_baht`, leaving the driver as
/// the acting role.
///
/// # Errors
///
/// Returns the engine's rejection.
pub fn accepted_job(engine: &Lifecycle, state: &AppState, value_baht: u64) -> Result<(AppState, JobId), MarketError> {
    let (state, id) = post_job(engine, state, value_baht)?;
    let state = engine.fund_job(&state, &id)?;
    let state = engine.switch_role(&state, Role::Driver)?;
    let state = engine.accept_job(&state, &id, DRIVER_ID)?;
    Ok((state, id))
}
