//! Deterministic linear interpolation between keyframe values.
//!
//! Every implementation evaluates `a + (b - a) * elapsed / span` without
//! floating point, so two peers replaying the same keyframes read the same
//! bits:
//!
//! - integers and [`SimTime`] widen to `i128` and round toward negative
//!   infinity;
//! - [`Decimal`] multiplies before it divides and rounds like `rust_decimal`
//!   always does (28 significant digits);
//! - fixed-size arrays interpolate component-wise.

use keyframe_types::SimTime;
use rust_decimal::Decimal;

use crate::error::CurveError;

/// A value that can be linearly interpolated between two keyframes.
pub trait Interpolate: Clone {
    /// Interpolate from `self` toward `to`.
    ///
    /// `elapsed` is the time since the `self` keyframe and `span` the time
    /// between the two keyframes. A non-positive `span` yields `self`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::ArithmeticOverflow`] if an intermediate result
    /// does not fit.
    fn interpolate(&self, to: &Self, elapsed: SimTime, span: SimTime) -> Result<Self, CurveError>;
}

/// Integer interpolation with floor rounding.
fn lerp_i128(from: i128, to: i128, elapsed: SimTime, span: SimTime) -> Result<i128, CurveError> {
    if span.raw() <= 0 {
        return Ok(from);
    }
    let step = to
        .checked_sub(from)
        .and_then(|delta| delta.checked_mul(i128::from(elapsed.raw())))
        .and_then(|scaled| scaled.checked_div_euclid(i128::from(span.raw())))
        .ok_or(CurveError::ArithmeticOverflow)?;
    from.checked_add(step).ok_or(CurveError::ArithmeticOverflow)
}

macro_rules! impl_integer_interpolate {
    ($($ty:ty),*) => {
        $(
            impl Interpolate for $ty {
                fn interpolate(
                    &self,
                    to: &Self,
                    elapsed: SimTime,
                    span: SimTime,
                ) -> Result<Self, CurveError> {
                    let value = lerp_i128(i128::from(*self), i128::from(*to), elapsed, span)?;
                    <$ty>::try_from(value).map_err(|_err| CurveError::ArithmeticOverflow)
                }
            }
        )*
    };
}

impl_integer_interpolate!(i32, i64);

impl Interpolate for SimTime {
    fn interpolate(&self, to: &Self, elapsed: SimTime, span: SimTime) -> Result<Self, CurveError> {
        let raw = lerp_i128(
            i128::from(self.raw()),
            i128::from(to.raw()),
            elapsed,
            span,
        )?;
        i64::try_from(raw)
            .map(Self::from_raw)
            .map_err(|_err| CurveError::ArithmeticOverflow)
    }
}

impl Interpolate for Decimal {
    fn interpolate(&self, to: &Self, elapsed: SimTime, span: SimTime) -> Result<Self, CurveError> {
        if span.raw() <= 0 {
            return Ok(*self);
        }
        let step = to
            .checked_sub(*self)
            .and_then(|delta| delta.checked_mul(Self::from(elapsed.raw())))
            .and_then(|scaled| scaled.checked_div(Self::from(span.raw())))
            .ok_or(CurveError::ArithmeticOverflow)?;
        self.checked_add(step).ok_or(CurveError::ArithmeticOverflow)
    }
}

impl<T: Interpolate, const N: usize> Interpolate for [T; N] {
    fn interpolate(&self, to: &Self, elapsed: SimTime, span: SimTime) -> Result<Self, CurveError> {
        let mut out = self.clone();
        for (slot, target) in out.iter_mut().zip(to.iter()) {
            *slot = slot.interpolate(target, elapsed, span)?;
        }
        Ok(out)
    }
}
