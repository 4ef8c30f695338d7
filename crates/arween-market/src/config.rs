//! Marketplace configuration.
//!
//! [`MarketConfig`] carries the commercial constants of the marketplace. The
//! defaults are the production values (10% platform fee, 50/50 phase split, 3%
//! withholding tax, 10 000 THB compliance threshold at reputation 80). A JSON
//! file may override any subset of them.

use std::path::Path;

use arween_core::{Amount, Rate, TrustScore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The values are inconsistent.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Commercial constants used by the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    platform_fee: Rate,
    phase_split: Rate,
    withholding_tax: Rate,
    compliance_value_threshold: Amount,
    compliance_min_reputation: TrustScore,
    operator_completion_bonus: i16,
    driver_completion_bonus: i16,
    dispute_penalty: i16,
    carbon_point_value: Amount,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            platform_fee: Rate::percent(10),
            phase_split: Rate::percent(50),
            withholding_tax: Rate::percent(3),
            compliance_value_threshold: Amount::from_baht(10_000),
            compliance_min_reputation: TrustScore::new(80),
            operator_completion_bonus: 2,
            driver_completion_bonus: 5,
            dispute_penalty: 15,
            carbon_point_value: Amount::from_baht(10),
        }
    }
}

impl MarketConfig {
    /// Creates a new config builder starting from the defaults.
    #[must_use]
    pub fn builder() -> MarketConfigBuilder {
        MarketConfigBuilder::default()
    }

    /// Loads and validates a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that fee and tax together never exceed a payout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.platform_fee.checked_add(self.withholding_tax).is_none() {
            return Err(ConfigError::Invalid(format!(
                "platform fee {} plus withholding tax {} exceeds 100%",
                self.platform_fee, self.withholding_tax
            )));
        }
        if self.dispute_penalty < 0
            || self.operator_completion_bonus < 0
            || self.driver_completion_bonus < 0
        {
            return Err(ConfigError::Invalid(
                "reputation bonuses and penalties must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Platform fee taken from phase-1 and arbitrated payouts.
    #[must_use]
    pub const fn platform_fee(&self) -> Rate {
        self.platform_fee
    }

    /// Share of the contract value released in phase 1.
    #[must_use]
    pub const fn phase_split(&self) -> Rate {
        self.phase_split
    }

    /// Withholding tax deducted from each phase.
    #[must_use]
    pub const fn withholding_tax(&self) -> Rate {
        self.withholding_tax
    }

    /// Contract value above which the reputation floor applies.
    #[must_use]
    pub const fn compliance_value_threshold(&self) -> Amount {
        self.compliance_value_threshold
    }

    /// Minimum operator reputation for high-value contracts.
    #[must_use]
    pub const fn compliance_min_reputation(&self) -> TrustScore {
        self.compliance_min_reputation
    }

    /// Reputation awarded to the operator on completion.
    #[must_use]
    pub const fn operator_completion_bonus(&self) -> i16 {
        self.operator_completion_bonus
    }

    /// Reputation awarded to the driver on completion.
    #[must_use]
    pub const fn driver_completion_bonus(&self) -> i16 {
        self.driver_completion_bonus
    }

    /// Reputation removed from the losing side of a dispute.
    #[must_use]
    pub const fn dispute_penalty(&self) -> i16 {
        self.dispute_penalty
    }

    /// Display value of one carbon point.
    #[must_use]
    pub const fn carbon_point_value(&self) -> Amount {
        self.carbon_point_value
    }
}

/// Builder for constructing [`MarketConfig`] instances.
#[derive(Debug, Clone, Default)]
pub struct MarketConfigBuilder {
    config: MarketConfig,
}

impl MarketConfigBuilder {
    /// Sets the platform fee.
    #[must_use]
    pub const fn platform_fee(mut self, rate: Rate) -> Self {
        self.config.platform_fee = rate;
        self
    }

    /// Sets the phase-1 share.
    #[must_use]
    pub const fn phase_split(mut self, rate: Rate) -> Self {
        self.config.phase_split = rate;
        self
    }

    /// Sets the withholding tax.
    #[must_use]
    pub const fn withholding_tax(mut self, rate: Rate) -> Self {
        self.config.withholding_tax = rate;
        self
    }

    /// Sets the compliance rule.
    #[must_use]
    pub const fn compliance(mut self, threshold: Amount, min_reputation: TrustScore) -> Self {
        self.config.compliance_value_threshold = threshold;
        self.config.compliance_min_reputation = min_reputation;
        self
    }

    /// Sets the completion bonuses for operator and driver.
    #[must_use]
    pub const fn completion_bonus(mut self, operator: i16, driver: i16) -> Self {
        self.config.operator_completion_bonus = operator;
        self.config.driver_completion_bonus = driver;
        self
    }

    /// Sets the dispute penalty.
    #[must_use]
    pub const fn dispute_penalty(mut self, penalty: i16) -> Self {
        self.config.dispute_penalty = penalty;
        self
    }

    /// Sets the carbon point value.
    #[must_use]
    pub const fn carbon_point_value(mut self, value: Amount) -> Self {
        self.config.carbon_point_value = value;
        self
    }

    /// Builds and validates the config.
    pub fn build(self) -> Result<MarketConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
