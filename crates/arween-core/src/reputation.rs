//! Reputation scoring for marketplace participants.
//!
//! A [`TrustScore`] is an integer in `[0, 100]`. Every update clamps, so no
//! sequence of rewards and penalties can push it out of range. [`Tier`] is the
//! loyalty band derived from the score.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A trust score between 0 and 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct TrustScore(u8);

impl TrustScore {
    /// Highest score.
    pub const MAX: Self = Self(100);

    /// Lowest score.
    pub const ZERO: Self = Self(0);

    /// Creates a score, clamping values above 100.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        if value > 100 { Self::MAX } else { Self(value) }
    }

    /// Returns the raw score.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns the score moved by `delta`, clamped to `[0, 100]`.
    #[must_use]
    pub const fn adjust(self, delta: i16) -> Self {
        let moved = self.0 as i16 + delta;
        if moved < 0 {
            Self::ZERO
        } else if moved > 100 {
            Self::MAX
        } else {
            Self(moved as u8)
        }
    }
}

impl Default for TrustScore {
    fn default() -> Self {
        Self(50)
    }
}

impl From<u8> for TrustScore {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<TrustScore> for u8 {
    fn from(score: TrustScore) -> Self {
        score.0
    }
}

impl fmt::Display for TrustScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Loyalty tier of a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    /// Entry tier.
    #[default]
    Basic,
    /// Reputation 80 and above.
    Silver,
    /// Reputation 90 and above.
    Gold,
    /// Reputation 95 and above.
    Platinum,
}

impl Tier {
    /// The tier a given score qualifies for.
    #[must_use]
    pub const fn for_score(score: TrustScore) -> Self {
        match score.value() {
            95.. => Self::Platinum,
            90..=94 => Self::Gold,
            80..=89 => Self::Silver,
            _ => Self::Basic,
        }
    }

    /// Returns `self` or the tier `score` qualifies for, whichever is higher.
    ///
    /// Tiers are only ever promoted.
    #[must_use]
    pub fn promote(self, score: TrustScore) -> Self {
        self.max(Self::for_score(score))
    }

    /// Returns the string representation of this tier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::Silver => "SILVER",
            Self::Gold => "GOLD",
            Self::Platinum => "PLATINUM",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
