//! Continuous curves: values interpolated linearly between keyframes.
//!
//! Used for anything that moves smoothly (positions, paddle offsets). After
//! the last keyframe the value is held constant.

use keyframe_types::SimTime;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::CurveError;
use crate::interpolate::Interpolate;
use crate::keyframe::{Keyframe, KeyframeContainer};

/// A piecewise-linear curve.
///
/// Keyframe times are unique: writing at an existing time replaces the
/// value stored there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continuous<T> {
    /// Keyframes with strictly increasing times.
    frames: KeyframeContainer<T>,
}

impl<T> Default for Continuous<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Continuous<T> {
    /// Create a curve without keyframes.
    pub const fn new() -> Self {
        Self {
            frames: KeyframeContainer::new(),
        }
    }

    /// Create a curve holding `value` from `time` on.
    pub fn with_initial(time: SimTime, value: T) -> Self {
        let mut curve = Self::new();
        curve.frames.push(Keyframe::new(time, value));
        curve
    }

    /// Authoritative write: drop every keyframe at or after `time` and
    /// append `(time, value)`.
    pub fn set_last(&mut self, time: SimTime, value: T) {
        self.frames.truncate_from(time);
        self.frames.push(Keyframe::new(time, value));
    }

    /// Insert (or replace) the keyframe at `time` without truncating.
    pub fn set_insert(&mut self, time: SimTime, value: T) {
        self.frames
            .replace_at(time, core::iter::once(Keyframe::new(time, value)));
    }

    /// Time of the first keyframe.
    pub fn first_time(&self) -> Option<SimTime> {
        self.frames.first().map(|k| k.time)
    }

    /// Time of the last keyframe.
    pub fn last_time(&self) -> Option<SimTime> {
        self.frames.last().map(|k| k.time)
    }

    /// Number of keyframes.
    pub const fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the curve has no keyframes.
    pub const fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Read-only view of the keyframes.
    pub fn keyframes(&self) -> &[Keyframe<T>] {
        self.frames.as_slice()
    }
}

impl<T: Interpolate> Continuous<T> {
    /// Value at `time`, interpolated between the bracketing keyframes.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Uninitialized`] if `time` is before the first
    /// keyframe, or [`CurveError::ArithmeticOverflow`] if interpolation
    /// overflows.
    ///
    /// A read before the first keyframe is not a panic or debug assertion in
    /// any build.
    pub fn get(&self, time: SimTime) -> Result<T, CurveError> {
        let idx = self
            .frames
            .last_at_or_before(time)
            .ok_or(CurveError::Uninitialized { time })?;
        let current = self
            .frames
            .get(idx)
            .ok_or(CurveError::Uninitialized { time })?;

        let Some(next) = idx.checked_add(1).and_then(|n| self.frames.get(n)) else {
            return Ok(current.value.clone());
        };
        if current.time == time {
            return Ok(current.value.clone());
        }

        let elapsed = time.saturating_sub(current.time);
        let span = next.time.saturating_sub(current.time);
        trace!(%time, from = %current.time, to = %next.time, "interpolating curve");
        current.value.interpolate(&next.value, elapsed, span)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;

    fn t(units: i32) -> SimTime {
        SimTime::from_int(units)
    }

    #[test]
    fn empty_curve_is_uninitialized() {
        let curve: Continuous<Decimal> = Continuous::new();
        assert_eq!(
            curve.get(t(0)),
            Err(CurveError::Uninitialized { time: t(0) })
        );
    }

    #[test]
    fn read_before_first_keyframe_fails() {
        let curve = Continuous::with_initial(t(5), dec!(1));
        assert!(curve.get(t(4)).is_err());
        assert_eq!(curve.get(t(5)).unwrap(), dec!(1));
    }

    #[test]
    fn interpolates_between_keyframes() {
        let mut curve = Continuous::with_initial(t(0), dec!(0));
        curve.set_last(t(10), dec!(100));
        assert_eq!(curve.get(t(0)).unwrap(), dec!(0));
        assert_eq!(curve.get(t(5)).unwrap(), dec!(50));
        assert_eq!(curve.get(t(10)).unwrap(), dec!(100));
    }

    #[test]
    fn holds_value_after_last_keyframe() {
        let mut curve = Continuous::with_initial(t(0), 0_i64);
        curve.set_last(t(4), 8);
        assert_eq!(curve.get(t(100)).unwrap(), 8);
    }

    #[test]
    fn set_insert_replaces_without_truncating() {
        let mut curve = Continuous::with_initial(t(0), 0_i64);
        curve.set_last(t(10), 10);
        curve.set_insert(t(5), 0);
        assert_eq!(curve.len(), 3);
        assert_eq!(curve.get(t(5)).unwrap(), 0);
        assert_eq!(curve.get(t(10)).unwrap(), 10);

        curve.set_insert(t(5), 7);
        assert_eq!(curve.len(), 3);
        assert_eq!(curve.get(t(5)).unwrap(), 7);
    }

    #[test]
    fn introspection_reports_bounds() {
        let mut curve = Continuous::with_initial(t(1), 1_i32);
        curve.set_last(t(3), 3);
        assert_eq!(curve.first_time(), Some(t(1)));
        assert_eq!(curve.last_time(), Some(t(3)));
        assert_eq!(curve.keyframes().len(), 2);
    }
}
