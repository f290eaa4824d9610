//! Fixed-point simulation time.
//!
//! [`SimTime`] is the single representation of authoritative time in the
//! simulation. It counts 1/65536ths of a time unit in a signed 64-bit
//! integer, so ordering and equality are exact and identical on every
//! network peer.
//!
//! # Design Principles
//!
//! - No floating point. Conversions to and from fractional values go
//!   through [`Decimal`].
//! - Operator arithmetic saturates at [`SimTime::MIN`] and [`SimTime::MAX`].
//!   The `checked_*` methods report overflow instead.
//! - [`SimTime::NEVER`] is the "no longer relevant" sentinel returned by
//!   event classes. It shares its value with [`SimTime::MIN`].

use core::fmt;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Number of fractional bits in a [`SimTime`].
pub const FRACTION_BITS: u32 = 16;

/// Raw value of one whole time unit.
const ONE_RAW: i64 = 1 << FRACTION_BITS;

/// `1 / 65536` written as an integer with [`FRACTION_SCALE`] decimal places.
const FRACTION_STEP: i128 = 152_587_890_625;

/// Decimal places of [`FRACTION_STEP`].
const FRACTION_SCALE: u32 = 16;

/// Errors that can occur when constructing a [`SimTime`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    /// The result does not fit into the 64-bit fixed-point range.
    #[error("simulation time overflow")]
    Overflow,

    /// A decimal value lies outside the representable range.
    #[error("value {value} cannot be represented as simulation time")]
    OutOfRange {
        /// The rejected value.
        value: Decimal,
    },
}

/// A point (or span) of simulation time in 48.16 fixed-point format.
///
/// Serialized as its raw integer so that replays and network messages carry
/// the exact bit pattern.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimTime(i64);

impl SimTime {
    /// Time zero.
    pub const ZERO: Self = Self(0);

    /// Exactly one time unit.
    pub const ONE: Self = Self(ONE_RAW);

    /// The earliest representable time.
    pub const MIN: Self = Self(i64::MIN);

    /// The latest representable time.
    pub const MAX: Self = Self(i64::MAX);

    /// Sentinel meaning "this event is no longer relevant".
    pub const NEVER: Self = Self::MIN;

    /// Create a time from its raw fixed-point representation.
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Return the raw fixed-point representation.
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Create a time from a whole number of time units.
    pub fn from_int(units: i32) -> Self {
        Self(i64::from(units).saturating_mul(ONE_RAW))
    }

    /// Create a time from a whole number of time units, reporting overflow.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::Overflow`] if `units` exceeds the 48-bit
    /// integer range.
    pub fn checked_from_int(units: i64) -> Result<Self, TimeError> {
        units
            .checked_mul(ONE_RAW)
            .map(Self)
            .ok_or(TimeError::Overflow)
    }

    /// Convert a decimal number of time units, rounding toward negative
    /// infinity to the nearest 1/65536.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::OutOfRange`] if the value cannot be represented.
    pub fn from_decimal(value: Decimal) -> Result<Self, TimeError> {
        let scaled = value
            .checked_mul(Decimal::from(ONE_RAW))
            .ok_or(TimeError::OutOfRange { value })?;
        scaled
            .floor()
            .to_i64()
            .map(Self)
            .ok_or(TimeError::OutOfRange { value })
    }

    /// Convert to an exact decimal number of time units.
    pub fn to_decimal(self) -> Decimal {
        let whole = Decimal::from(self.whole_units());
        let fraction = i128::from(self.0.rem_euclid(ONE_RAW)).saturating_mul(FRACTION_STEP);
        whole.saturating_add(Decimal::from_i128_with_scale(fraction, FRACTION_SCALE))
    }

    /// Return the whole time units, rounded toward negative infinity.
    pub const fn whole_units(self) -> i64 {
        self.0.div_euclid(ONE_RAW)
    }

    /// Whether this is the [`SimTime::NEVER`] sentinel.
    pub const fn is_never(self) -> bool {
        self.0 == i64::MIN
    }

    /// Checked addition. Returns `None` on overflow.
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on overflow.
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Saturating addition.
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Multiply a duration by a whole factor, saturating at the bounds.
    pub const fn saturating_mul_int(self, factor: i64) -> Self {
        Self(self.0.saturating_mul(factor))
    }
}

impl From<i32> for SimTime {
    fn from(units: i32) -> Self {
        Self::from_int(units)
    }
}

impl Add for SimTime {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl AddAssign for SimTime {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl Sub for SimTime {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

impl SubAssign for SimTime {
    fn sub_assign(&mut self, rhs: Self) {
        *self = self.saturating_sub(rhs);
    }
}

impl Neg for SimTime {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            return f.write_str("never");
        }
        write!(f, "{}", self.to_decimal().normalize())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn whole_units_round_trip() {
        let t = SimTime::from_int(42);
        assert_eq!(t.raw(), 42 * 65536);
        assert_eq!(t.whole_units(), 42);
        assert_eq!(t.to_decimal(), dec!(42));
    }

    #[test]
    fn fractional_values_are_exact() {
        let half = SimTime::from_raw(32768);
        assert_eq!(half.to_decimal().normalize(), dec!(0.5));

        let smallest = SimTime::from_raw(1);
        assert_eq!(smallest.to_decimal(), dec!(0.0000152587890625));
    }

    #[test]
    fn negative_fractions_floor() {
        let t = SimTime::from_raw(-32768);
        assert_eq!(t.whole_units(), -1);
        assert_eq!(t.to_decimal().normalize(), dec!(-0.5));
    }

    #[test]
    fn from_decimal_rounds_down() {
        let t = SimTime::from_decimal(dec!(1.5)).unwrap();
        assert_eq!(t.raw(), 98304);

        // 0.1 is not representable; the result is the next lower step.
        let tenth = SimTime::from_decimal(dec!(0.1)).unwrap();
        assert_eq!(tenth.raw(), 6553);

        let negative = SimTime::from_decimal(dec!(-0.1)).unwrap();
        assert_eq!(negative.raw(), -6554);
    }

    #[test]
    fn from_decimal_rejects_out_of_range() {
        let huge = Decimal::from(i64::MAX);
        assert!(matches!(
            SimTime::from_decimal(huge),
            Err(TimeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn arithmetic_saturates() {
        assert_eq!(SimTime::MAX + SimTime::ONE, SimTime::MAX);
        assert_eq!(SimTime::MIN - SimTime::ONE, SimTime::MIN);
        assert_eq!(-SimTime::MIN, SimTime::MAX);
        assert!(SimTime::MAX.checked_add(SimTime::ONE).is_none());
        assert!(SimTime::checked_from_int(i64::MAX).is_err());
    }

    #[test]
    fn ordering_is_exact() {
        let a = SimTime::from_raw(65535);
        let b = SimTime::ONE;
        assert!(a < b);
        assert_eq!(SimTime::from_int(3) - SimTime::from_int(1), SimTime::from_int(2));
    }

    #[test]
    fn never_is_the_minimum() {
        assert!(SimTime::NEVER.is_never());
        assert!(SimTime::NEVER < SimTime::from_int(i32::MIN));
        assert_eq!(SimTime::NEVER.to_string(), "never");
    }

    #[test]
    fn display_uses_decimal_form() {
        assert_eq!(SimTime::from_int(12).to_string(), "12");
        assert_eq!(SimTime::from_raw(98304).to_string(), "1.5");
    }

    #[test]
    fn serializes_as_raw_integer() {
        let t = SimTime::from_int(2);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "131072");
        let back: SimTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
