//! Baht amounts with fixed-point precision.
//!
//! An [`Amount`] is stored as a count of satang (1/100 THB) so that fee and
//! tax arithmetic reconciles exactly against the ledger. Percentages are
//! [`Rate`]s in basis points; applying a rate rounds half-to-even to the
//! nearest satang.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::CoreError;

/// Number of decimal places for THB precision.
pub const DECIMALS: u32 = 2;

/// One whole baht in satang.
pub const SATANG_PER_BAHT: u64 = 100;

/// Basis points in 100%.
pub const BPS_PER_WHOLE: u32 = 10_000;

/// A non-negative THB amount with satang precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    /// Zero amount constant.
    pub const ZERO: Self = Self(0);

    /// Maximum possible amount.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates an Amount from satang.
    #[must_use]
    pub const fn from_satang(satang: u64) -> Self {
        Self(satang)
    }

    /// Creates an Amount from whole baht. Saturates at [`Amount::MAX`].
    #[must_use]
    pub const fn from_baht(baht: u64) -> Self {
        Self(baht.saturating_mul(SATANG_PER_BAHT))
    }

    /// Returns the amount in satang.
    #[must_use]
    pub const fn as_satang(self) -> u64 {
        self.0
    }

    /// Returns the whole-baht part (truncates satang).
    #[must_use]
    pub const fn whole_baht(self) -> u64 {
        self.0 / SATANG_PER_BAHT
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on underflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Saturating addition, capping at [`Amount::MAX`].
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction, flooring at zero.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Checked multiplication by a scalar. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_mul(self, rhs: u64) -> Option<Self> {
        match self.0.checked_mul(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Applies a rate, rounding half-to-even to the nearest satang.
    ///
    /// The product is formed in `u128`, so no input overflows; a rate is at
    /// most 100%, so the result never exceeds `self`.
    ///
    /// ```
    /// use arween_core::{Amount, Rate};
    ///
    /// // 10% of 4250.00 THB
    /// let fee = Amount::from_baht(4250).apply_rate(Rate::percent(10));
    /// assert_eq!(fee, Amount::from_satang(42_500));
    ///
    /// // 0.5 satang rounds to the even neighbour
    /// assert_eq!(Amount::from_satang(1).apply_rate(Rate::percent(50)), Amount::ZERO);
    /// assert_eq!(Amount::from_satang(3).apply_rate(Rate::percent(50)), Amount::from_satang(2));
    /// ```
    #[must_use]
    pub const fn apply_rate(self, rate: Rate) -> Self {
        let numerator = self.0 as u128 * rate.0 as u128;
        let whole = BPS_PER_WHOLE as u128;
        let quotient = numerator / whole;
        let remainder = numerator % whole;

        let rounded = if remainder * 2 > whole || (remainder * 2 == whole && quotient % 2 == 1) {
            quotient + 1
        } else {
            quotient
        };

        Self(rounded as u64)
    }

    /// Returns true if this amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SATANG_PER_BAHT;
        let frac = self.0 % SATANG_PER_BAHT;
        write!(f, "{whole}.{frac:02} THB")
    }
}

impl FromStr for Amount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(CoreError::InvalidAmount("negative values not allowed".into()));
        }

        let (whole_str, frac_str) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };

        if frac_str.len() > DECIMALS as usize {
            return Err(CoreError::InvalidAmount(format!(
                "at most {DECIMALS} decimal places allowed: {s}"
            )));
        }
        if whole_str.is_empty() && frac_str.is_empty() {
            return Err(CoreError::InvalidAmount(format!("invalid number: {s:?}")));
        }

        let whole: u64 = if whole_str.is_empty() {
            0
        } else {
            whole_str
                .parse()
                .map_err(|_| CoreError::InvalidAmount(format!("invalid whole part: {s}")))?
        };

        let frac: u64 = if frac_str.is_empty() {
            0
        } else {
            if !frac_str.bytes().all(|b| b.is_ascii_digit()) {
                return Err(CoreError::InvalidAmount(format!("invalid fractional part: {s}")));
            }
            let padded = format!("{frac_str:0<2}");
            padded
                .parse()
                .map_err(|_| CoreError::InvalidAmount(format!("invalid fractional part: {s}")))?
        };

        whole
            .checked_mul(SATANG_PER_BAHT)
            .and_then(|w| w.checked_add(frac))
            .map(Amount)
            .ok_or_else(|| CoreError::InvalidAmount("overflow".into()))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Decimal string without trailing zeros, e.g. "3697.5"
        let whole = self.0 / SATANG_PER_BAHT;
        let frac = self.0 % SATANG_PER_BAHT;

        let s = if frac == 0 {
            format!("{whole}")
        } else {
            let frac_str = format!("{frac:02}");
            format!("{whole}.{}", frac_str.trim_end_matches('0'))
        };

        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A percentage in basis points (1 bps = 0.01%), at most 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Rate(u32);

impl Rate {
    /// 0%.
    pub const ZERO: Self = Self(0);

    /// 100%.
    pub const WHOLE: Self = Self(BPS_PER_WHOLE);

    /// Creates a rate from basis points.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidRate` above 10 000 bps.
    pub fn from_bps(bps: u32) -> Result<Self, CoreError> {
        if bps > BPS_PER_WHOLE {
            return Err(CoreError::InvalidRate(format!(
                "{bps} bps exceeds {BPS_PER_WHOLE} bps"
            )));
        }
        Ok(Self(bps))
    }

    /// Creates a rate from a whole percentage, clamped to 100%.
    #[must_use]
    pub const fn percent(pct: u32) -> Self {
        let bps = pct.saturating_mul(100);
        if bps > BPS_PER_WHOLE {
            Self(BPS_PER_WHOLE)
        } else {
            Self(bps)
        }
    }

    /// Returns the rate in basis points.
    #[must_use]
    pub const fn bps(self) -> u32 {
        self.0
    }

    /// Sum of two rates, if it stays within 100%.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        let sum = self.0 + rhs.0;
        if sum > BPS_PER_WHOLE { None } else { Some(Self(sum)) }
    }
}

impl TryFrom<u32> for Rate {
    type Error = CoreError;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        Self::from_bps(bps)
    }
}

impl From<Rate> for u32 {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{whole}%")
        } else {
            write!(f, "{whole}.{frac:02}%")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test]
    fn amount_from_baht_converts_correctly() {
        assert_eq!(Amount::from_baht(8500).as_satang(), 850_000);
    }

    #[test]
    fn amount_whole_baht_truncates() {
        assert_eq!(Amount::from_satang(369_750).whole_baht(), 3697);
    }

    #[test]
    fn checked_sub_returns_none_on_underflow() {
        let a = Amount::from_baht(1);
        let b = Amount::from_baht(5);
        assert_eq!(a.checked_sub(b), None);
    }

    #[test]
    fn checked_add_returns_none_on_overflow() {
        assert_eq!(Amount::MAX.checked_add(Amount::from_satang(1)), None);
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        let a = Amount::from_baht(1);
        assert_eq!(a.saturating_sub(Amount::from_baht(3)), Amount::ZERO);
    }

    #[test_case(850_000, 5_000 => 425_000 ; "half of 8500")]
    #[test_case(425_000, 1_000 => 42_500 ; "ten percent fee")]
    #[test_case(425_000, 300 => 12_750 ; "three percent tax")]
    #[test_case(5, 5_000 => 2 ; "2.5 rounds down to even")]
    #[test_case(7, 5_000 => 4 ; "3.5 rounds up to even")]
    #[test_case(17, 300 => 1 ; "0.51 rounds up")]
    #[test_case(16, 300 => 0 ; "0.48 rounds down")]
    #[test_case(u64::MAX, 10_000 => u64::MAX ; "whole rate is identity")]
    fn apply_rate_rounds_half_even(satang: u64, bps: u32) -> u64 {
        let rate = Rate::from_bps(bps).unwrap();
        Amount::from_satang(satang).apply_rate(rate).as_satang()
    }

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(Amount::from_satang(369_750).to_string(), "3697.50 THB");
        assert_eq!(Amount::ZERO.to_string(), "0.00 THB");
    }

    #[test_case("8500" => 850_000 ; "whole")]
    #[test_case("8500.5" => 850_050 ; "one decimal")]
    #[test_case("8500.05" => 850_005 ; "two decimals")]
    #[test_case(".75" => 75 ; "no whole part")]
    #[test_case(" 12 " => 1_200 ; "surrounding whitespace")]
    fn from_str_parses(input: &str) -> u64 {
        input.parse::<Amount>().unwrap().as_satang()
    }

    #[test_case("abc" ; "letters")]
    #[test_case("-1" ; "negative")]
    #[test_case("1.234" ; "too precise")]
    #[test_case("1.x" ; "bad fraction")]
    #[test_case("." ; "lone dot")]
    #[test_case("" ; "empty")]
    fn from_str_rejects(input: &str) {
        assert!(input.parse::<Amount>().is_err());
    }

    #[test]
    fn serde_uses_trimmed_decimal_string() {
        let json = serde_json::to_string(&Amount::from_satang(369_750)).unwrap();
        assert_eq!(json, r#""3697.5""#);
        let restored: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, Amount::from_satang(369_750));
    }

    #[test]
    fn rate_rejects_above_whole() {
        assert!(Rate::from_bps(10_001).is_err());
        assert!(serde_json::from_str::<Rate>("20000").is_err());
    }

    #[test]
    fn rate_percent_clamps() {
        assert_eq!(Rate::percent(250), Rate::WHOLE);
        assert_eq!(Rate::percent(3).bps(), 300);
    }

    #[test]
    fn rate_display() {
        assert_eq!(Rate::percent(10).to_string(), "10%");
        assert_eq!(Rate::from_bps(125).unwrap().to_string(), "1.25%");
    }

    #[test]
    fn rate_checked_add_caps_at_whole() {
        assert_eq!(Rate::percent(60).checked_add(Rate::percent(40)), Some(Rate::WHOLE));
        assert_eq!(Rate::percent(60).checked_add(Rate::percent(41)), None);
    }

    proptest! {
        #[test]
        fn apply_rate_never_exceeds_input(satang in any::<u64>(), bps in 0u32..=10_000) {
            let rate = Rate::from_bps(bps).unwrap();
            prop_assert!(Amount::from_satang(satang).apply_rate(rate) <= Amount::from_satang(satang));
        }

        #[test]
        fn display_parse_roundtrip(satang in 0u64..1_000_000_000_000) {
            let amount = Amount::from_satang(satang);
            let text = amount.to_string();
            let number = text.trim_end_matches(" THB");
            prop_assert_eq!(number.parse::<Amount>().unwrap(), amount);
        }
    }
}
