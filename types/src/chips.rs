//! Chip amounts and balances.
//!
//! Chips are stored as integer cents so wager and payout math stays exact
//! under the enabled overflow checks. The wire speaks chip units as plain
//! JSON numbers; fractional input is rounded half-up to the nearest cent at
//! this boundary and nowhere else.

use serde::{
    de::{self, Deserializer},
    ser::Serializer,
    Deserialize, Serialize,
};
use std::{fmt, iter::Sum};

/// Largest chip amount accepted from the wire. Keeps cent math far away
/// from `u64` overflow even after a 12x payout.
const MAX_WIRE_AMOUNT: f64 = 1_000_000_000_000.0;

/// Chips granted once when a player first registers.
pub const STARTING_CHIPS: Chips = Chips::from_whole(1_000);

/// A non-negative chip amount, held as cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Chips(u64);

impl Chips {
    pub const ZERO: Chips = Chips(0);

    pub const fn from_cents(cents: u64) -> Chips {
        Chips(cents)
    }

    /// Builds an amount from whole chips.
    pub const fn from_whole(chips: u64) -> Chips {
        Chips(chips * 100)
    }

    /// Parses a wire amount (chip units, possibly fractional) by rounding
    /// half-up to the nearest cent. Rejects non-finite, negative, and
    /// oversized values.
    pub fn from_amount(amount: f64) -> Option<Chips> {
        if !amount.is_finite() || amount < 0.0 || amount > MAX_WIRE_AMOUNT {
            return None;
        }
        Some(Chips((amount * 100.0).round() as u64))
    }

    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Value in chip units for display and the wire.
    pub fn amount(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Chips) -> Option<Chips> {
        self.0.checked_add(other.0).map(Chips)
    }

    pub fn saturating_add(self, other: Chips) -> Chips {
        Chips(self.0.saturating_add(other.0))
    }

    pub fn checked_sub(self, other: Chips) -> Option<Chips> {
        self.0.checked_sub(other.0).map(Chips)
    }

    pub fn saturating_sub(self, other: Chips) -> Chips {
        Chips(self.0.saturating_sub(other.0))
    }

    /// Multiplies by a payout multiplier.
    pub fn checked_mul(self, factor: u64) -> Option<Chips> {
        self.0.checked_mul(factor).map(Chips)
    }

    pub fn saturating_mul(self, factor: u64) -> Chips {
        Chips(self.0.saturating_mul(factor))
    }

    /// Signed difference `self - other` in cents. Wire amounts are capped
    /// well inside `i64` range, so the casts cannot overflow.
    pub fn signed_diff_cents(self, other: Chips) -> i64 {
        self.0 as i64 - other.0 as i64
    }
}

impl Sum for Chips {
    fn sum<I: Iterator<Item = Chips>>(iter: I) -> Chips {
        iter.fold(Chips::ZERO, Chips::saturating_add)
    }
}

impl fmt::Display for Chips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}", self.0 / 100)
        } else {
            write!(f, "{:.2}", self.amount())
        }
    }
}

impl Serialize for Chips {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_u64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.amount())
        }
    }
}

impl<'de> Deserialize<'de> for Chips {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Chips, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Chips::from_amount(amount)
            .ok_or_else(|| de::Error::custom(format!("chip amount out of range: {amount}")))
    }
}
