//! Payout arithmetic for the two-phase release and arbitrated payouts.
//!
//! All figures are satang computed through [`Amount::apply_rate`], which rounds
//! half to even on a `u128` intermediate. The second tranche is derived as
//! `value_total - phase1.gross` instead of being rounded on its own, so the
//! two gross tranches always add up to exactly the escrowed value.
//!
//! The platform fee applies to phase 1 and to an arbitrated payout. Phase 2 is
//! fee-free. Withholding tax applies to both phases but not to arbitration.

use arween_core::Amount;
use serde::{Deserialize, Serialize};

use crate::config::MarketConfig;
use crate::error::MarketError;

/// How one gross tranche divides between the driver, the platform and tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseBreakdown {
    /// Amount released from escrow.
    pub gross: Amount,
    /// Platform fee retained.
    pub fee: Amount,
    /// Withholding tax retained.
    pub tax: Amount,
    /// Amount credited to the driver's pending balance.
    pub net: Amount,
}

impl PhaseBreakdown {
    fn split(gross: Amount, fee: Amount, tax: Amount) -> Result<Self, MarketError> {
        let net = fee
            .checked_add(tax)
            .and_then(|deductions| gross.checked_sub(deductions))
            .ok_or_else(|| {
                MarketError::Arithmetic(format!(
                    "deductions {fee} + {tax} exceed gross tranche {gross}"
                ))
            })?;
        Ok(Self {
            gross,
            fee,
            tax,
            net,
        })
    }

    /// Returns true if `net + fee + tax == gross`.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.net
            .checked_add(self.fee)
            .and_then(|sum| sum.checked_add(self.tax))
            == Some(self.gross)
    }
}

/// First tranche: `phase_split` of the value, less fee and tax.
pub fn phase_one(value_total: Amount, config: &MarketConfig) -> Result<PhaseBreakdown, MarketError> {
    let gross = value_total.apply_rate(config.phase_split());
    PhaseBreakdown::split(
        gross,
        gross.apply_rate(config.platform_fee()),
        gross.apply_rate(config.withholding_tax()),
    )
}

/// Second tranche: the rest of the value, less tax only.
pub fn phase_two(value_total: Amount, config: &MarketConfig) -> Result<PhaseBreakdown, MarketError> {
    let first = value_total.apply_rate(config.phase_split());
    let gross = value_total.checked_sub(first).ok_or_else(|| {
        MarketError::Arithmetic(format!("phase 1 tranche {first} exceeds value {value_total}"))
    })?;
    PhaseBreakdown::split(gross, Amount::ZERO, gross.apply_rate(config.withholding_tax()))
}

/// Arbitrated payout of whatever escrow remains: fee only, no tax.
pub fn ruling_payout(remaining: Amount, config: &MarketConfig) -> Result<PhaseBreakdown, MarketError> {
    PhaseBreakdown::split(remaining, remaining.apply_rate(config.platform_fee()), Amount::ZERO)
}
