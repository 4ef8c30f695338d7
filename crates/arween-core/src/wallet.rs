//! Per-party balance sheet.
//!
//! A [`Wallet`] holds four balances: available, escrow (operator side),
//! reserved (driver side), and pending (driver funds awaiting T+1 settlement).
//! All balances are unsigned [`Amount`]s and every movement is checked, so a
//! wallet can never go negative: a debit that exceeds its source balance fails
//! with [`CoreError::InsufficientFunds`] and leaves the wallet untouched.

use serde::{Deserialize, Serialize};

use crate::{Amount, CoreError, Tier, TrustScore};

/// A participant's balance sheet and standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    id: String,
    owner_id: String,
    balance_available: Amount,
    balance_escrow: Amount,
    balance_reserved: Amount,
    balance_pending: Amount,
    reputation: TrustScore,
    credit_score: u32,
    carbon_points: u64,
    tax_withheld: Amount,
    tier: Tier,
}

fn add(balance: &'static str, current: Amount, amount: Amount) -> Result<Amount, CoreError> {
    current
        .checked_add(amount)
        .ok_or(CoreError::Overflow(balance))
}

fn sub(balance: &'static str, current: Amount, amount: Amount) -> Result<Amount, CoreError> {
    current
        .checked_sub(amount)
        .ok_or(CoreError::InsufficientFunds {
            balance,
            required: amount,
            available: current,
        })
}

impl Wallet {
    /// Creates an empty wallet with neutral reputation.
    #[must_use]
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            balance_available: Amount::ZERO,
            balance_escrow: Amount::ZERO,
            balance_reserved: Amount::ZERO,
            balance_pending: Amount::ZERO,
            reputation: TrustScore::default(),
            credit_score: 0,
            carbon_points: 0,
            tax_withheld: Amount::ZERO,
            tier: Tier::Basic,
        }
    }

    /// Sets the opening available balance.
    #[must_use]
    pub const fn with_available(mut self, amount: Amount) -> Self {
        self.balance_available = amount;
        self
    }

    /// Sets the opening escrow balance.
    #[must_use]
    pub const fn with_escrow(mut self, amount: Amount) -> Self {
        self.balance_escrow = amount;
        self
    }

    /// Sets the opening reserved balance.
    #[must_use]
    pub const fn with_reserved(mut self, amount: Amount) -> Self {
        self.balance_reserved = amount;
        self
    }

    /// Sets the opening pending balance.
    #[must_use]
    pub const fn with_pending(mut self, amount: Amount) -> Self {
        self.balance_pending = amount;
        self
    }

    /// Sets the opening reputation.
    #[must_use]
    pub const fn with_reputation(mut self, score: TrustScore) -> Self {
        self.reputation = score;
        self
    }

    /// Sets the opening credit score.
    #[must_use]
    pub const fn with_credit_score(mut self, score: u32) -> Self {
        self.credit_score = score;
        self
    }

    /// Sets the opening carbon points.
    #[must_use]
    pub const fn with_carbon_points(mut self, points: u64) -> Self {
        self.carbon_points = points;
        self
    }

    /// Sets the opening withheld-tax total.
    #[must_use]
    pub const fn with_tax_withheld(mut self, amount: Amount) -> Self {
        self.tax_withheld = amount;
        self
    }

    /// Sets the opening tier.
    #[must_use]
    pub const fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    /// Wallet identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identifier of the owning party.
    #[must_use]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Funds free to spend or withdraw.
    #[must_use]
    pub const fn available(&self) -> Amount {
        self.balance_available
    }

    /// Operator funds locked against open jobs.
    #[must_use]
    pub const fn escrow(&self) -> Amount {
        self.balance_escrow
    }

    /// Driver income guaranteed by accepted jobs.
    #[must_use]
    pub const fn reserved(&self) -> Amount {
        self.balance_reserved
    }

    /// Driver funds awaiting settlement.
    #[must_use]
    pub const fn pending(&self) -> Amount {
        self.balance_pending
    }

    /// Current trust score.
    #[must_use]
    pub const fn reputation(&self) -> TrustScore {
        self.reputation
    }

    /// Credit score.
    #[must_use]
    pub const fn credit_score(&self) -> u32 {
        self.credit_score
    }

    /// Accumulated carbon points.
    #[must_use]
    pub const fn carbon_points(&self) -> u64 {
        self.carbon_points
    }

    /// Cumulative withholding tax.
    #[must_use]
    pub const fn tax_withheld(&self) -> Amount {
        self.tax_withheld
    }

    /// Loyalty tier.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// Estimated tax deduction from carbon points, for display only.
    #[must_use]
    pub fn carbon_tax_shield(&self, point_value: Amount) -> Amount {
        point_value
            .checked_mul(self.carbon_points)
            .unwrap_or(Amount::MAX)
    }

    /// Adds external funds to the available balance.
    pub fn credit_available(&mut self, amount: Amount) -> Result<(), CoreError> {
        self.balance_available = add("available", self.balance_available, amount)?;
        Ok(())
    }

    /// Removes funds from the available balance.
    pub fn debit_available(&mut self, amount: Amount) -> Result<(), CoreError> {
        self.balance_available = sub("available", self.balance_available, amount)?;
        Ok(())
    }

    /// Moves funds from available into escrow.
    pub fn lock_escrow(&mut self, amount: Amount) -> Result<(), CoreError> {
        let available = sub("available", self.balance_available, amount)?;
        let escrow = add("escrow", self.balance_escrow, amount)?;
        self.balance_available = available;
        self.balance_escrow = escrow;
        Ok(())
    }

    /// Releases funds out of escrow (to the counterparty or back to available).
    pub fn release_escrow(&mut self, amount: Amount) -> Result<(), CoreError> {
        self.balance_escrow = sub("escrow", self.balance_escrow, amount)?;
        Ok(())
    }

    /// Increases the reserved (guaranteed income) balance.
    pub fn reserve(&mut self, amount: Amount) -> Result<(), CoreError> {
        self.balance_reserved = add("reserved", self.balance_reserved, amount)?;
        Ok(())
    }

    /// Decreases the reserved balance.
    pub fn release_reserved(&mut self, amount: Amount) -> Result<(), CoreError> {
        self.balance_reserved = sub("reserved", self.balance_reserved, amount)?;
        Ok(())
    }

    /// Decreases the reserved balance, flooring at zero.
    pub fn clear_reserved(&mut self, amount: Amount) {
        self.balance_reserved = self.balance_reserved.saturating_sub(amount);
    }

    /// Adds released funds to the pending balance.
    pub fn credit_pending(&mut self, amount: Amount) -> Result<(), CoreError> {
        self.balance_pending = add("pending", self.balance_pending, amount)?;
        Ok(())
    }

    /// Moves the whole pending balance to available and returns the amount moved.
    pub fn settle_pending(&mut self) -> Result<Amount, CoreError> {
        let amount = self.balance_pending;
        self.balance_available = add("available", self.balance_available, amount)?;
        self.balance_pending = Amount::ZERO;
        Ok(amount)
    }

    /// Records withholding tax deducted from a payout.
    pub fn withhold_tax(&mut self, amount: Amount) -> Result<(), CoreError> {
        self.tax_withheld = add("tax withheld", self.tax_withheld, amount)?;
        Ok(())
    }

    /// Moves the reputation by `delta`, clamped to `[0, 100]`.
    pub fn adjust_reputation(&mut self, delta: i16) {
        self.reputation = self.reputation.adjust(delta);
    }

    /// Adds carbon points.
    pub fn award_carbon(&mut self, points: u64) {
        self.carbon_points = self.carbon_points.saturating_add(points);
    }

    /// Promotes the tier to whatever the current reputation qualifies for.
    pub fn refresh_tier(&mut self) {
        self.tier = self.tier.promote(self.reputation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded(baht: u64) -> Wallet {
        Wallet::new("w_op_001", "u_op_001").with_available(Amount::from_baht(baht))
    }

    #[test]
    fn new_wallet_is_empty() {
        let wallet = Wallet::new("w", "u");
        assert!(wallet.available().is_zero());
        assert!(wallet.escrow().is_zero());
        assert!(wallet.reserved().is_zero());
        assert!(wallet.pending().is_zero());
        assert_eq!(wallet.tier(), Tier::Basic);
    }

    #[test]
    fn lock_escrow_moves_funds() {
        let mut wallet = funded(1000);
        wallet.lock_escrow(Amount::from_baht(400)).unwrap();
        assert_eq!(wallet.available(), Amount::from_baht(600));
        assert_eq!(wallet.escrow(), Amount::from_baht(400));
    }

    #[test]
    fn lock_escrow_insufficient_leaves_wallet_untouched() {
        let mut wallet = funded(100);
        let before = wallet.clone();
        let err = wallet.lock_escrow(Amount::from_baht(500)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientFunds { balance: "available", .. }
        ));
        assert_eq!(wallet, before);
    }

    #[test]
    fn release_escrow_cannot_underflow() {
        let mut wallet = funded(0).with_escrow(Amount::from_baht(10));
        assert!(wallet.release_escrow(Amount::from_baht(11)).is_err());
        assert_eq!(wallet.escrow(), Amount::from_baht(10));
    }

    #[test]
    fn clear_reserved_floors_at_zero() {
        let mut wallet = Wallet::new("w", "u").with_reserved(Amount::from_baht(5));
        wallet.clear_reserved(Amount::from_baht(50));
        assert!(wallet.reserved().is_zero());
    }

    #[test]
    fn settle_pending_moves_everything() {
        let mut wallet = Wallet::new("w", "u")
            .with_available(Amount::from_baht(1200))
            .with_pending(Amount::from_satang(412_250));
        let moved = wallet.settle_pending().unwrap();
        assert_eq!(moved, Amount::from_satang(412_250));
        assert!(wallet.pending().is_zero());
        assert_eq!(wallet.available(), Amount::from_satang(532_250));
    }

    #[test]
    fn debit_available_rejects_overdraft() {
        let mut wallet = funded(10);
        assert!(wallet.debit_available(Amount::from_satang(1_001)).is_err());
        wallet.debit_available(Amount::from_baht(10)).unwrap();
        assert!(wallet.available().is_zero());
    }

    #[test]
    fn reputation_adjust_clamps() {
        let mut wallet = Wallet::new("w", "u").with_reputation(TrustScore::new(98));
        wallet.adjust_reputation(5);
        assert_eq!(wallet.reputation(), TrustScore::MAX);
        wallet.adjust_reputation(-200);
        assert_eq!(wallet.reputation(), TrustScore::ZERO);
    }

    #[test]
    fn refresh_tier_promotes_only() {
        let mut wallet = Wallet::new("w", "u")
            .with_reputation(TrustScore::new(91))
            .with_tier(Tier::Silver);
        wallet.refresh_tier();
        assert_eq!(wallet.tier(), Tier::Gold);

        wallet.adjust_reputation(-50);
        wallet.refresh_tier();
        assert_eq!(wallet.tier(), Tier::Gold);
    }

    #[test]
    fn carbon_tax_shield_multiplies_points() {
        let wallet = Wallet::new("w", "u").with_carbon_points(45);
        assert_eq!(wallet.carbon_tax_shield(Amount::from_baht(10)), Amount::from_baht(450));
    }

    #[test]
    fn wallet_serde_roundtrip() {
        let wallet = funded(500_000).with_escrow(Amount::from_satang(15));
        let json = serde_json::to_string(&wallet).unwrap();
        assert!(json.contains(r#""balance_available":"500000""#));
        let restored: Wallet = serde_json::from_str(&json).unwrap();
        assert_eq!(wallet, restored);
    }
}
