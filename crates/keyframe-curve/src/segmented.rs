//! Segmented curves: step functions with explicit jump discontinuities.
//!
//! A jump at time `t` is two keyframes sharing `t`: the value just before
//! the jump followed by the value from `t` on. Reads at `t` see the second
//! one; [`Segmented::get_before`] sees the first.

use keyframe_types::SimTime;
use serde::{Deserialize, Serialize};

use crate::error::CurveError;
use crate::keyframe::{Keyframe, KeyframeContainer};

/// A stepwise curve that records its discontinuities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segmented<T> {
    /// Keyframes in non-decreasing time order; equal times form a jump.
    frames: KeyframeContainer<T>,
}

impl<T> Default for Segmented<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Segmented<T> {
    /// Create a curve without keyframes.
    pub const fn new() -> Self {
        Self {
            frames: KeyframeContainer::new(),
        }
    }

    /// Authoritative write of a plain keyframe. Every keyframe at or after
    /// `time` is dropped first.
    pub fn set_last(&mut self, time: SimTime, value: T) {
        self.frames.truncate_from(time);
        self.frames.push(Keyframe::new(time, value));
    }

    /// Authoritative write of a jump from `before` to `after` at `time`.
    pub fn set_last_jump(&mut self, time: SimTime, before: T, after: T) {
        self.frames.truncate_from(time);
        self.frames.push(Keyframe::new(time, before));
        self.frames.push(Keyframe::new(time, after));
    }

    /// Insert a plain keyframe without truncating, replacing whatever was
    /// stored at `time` (including a jump).
    pub fn set_insert(&mut self, time: SimTime, value: T) {
        self.frames
            .replace_at(time, core::iter::once(Keyframe::new(time, value)));
    }

    /// Insert a jump without truncating, replacing whatever was stored at
    /// `time`.
    pub fn set_insert_jump(&mut self, time: SimTime, before: T, after: T) {
        self.frames.replace_at(
            time,
            [Keyframe::new(time, before), Keyframe::new(time, after)],
        );
    }

    /// Whether a jump is stored at exactly `time`.
    pub fn is_jump(&self, time: SimTime) -> bool {
        self.frames.range_at(time).len() > 1
    }

    /// Time of the first keyframe.
    pub fn first_time(&self) -> Option<SimTime> {
        self.frames.first().map(|k| k.time)
    }

    /// Time of the last keyframe.
    pub fn last_time(&self) -> Option<SimTime> {
        self.frames.last().map(|k| k.time)
    }

    /// Number of keyframes. A jump counts twice.
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

impl<T: Clone> Segmented<T> {
    /// Value in effect at `time`; the "after" side of a jump at `time`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Uninitialized`] if `time` precedes the first
    /// keyframe. This is not a panic or debug assertion in any build.
    pub fn get(&self, time: SimTime) -> Result<T, CurveError> {
        self.frames
            .at_or_before(time)
            .map(|k| k.value.clone())
            .ok_or(CurveError::Uninitialized { time })
    }

    /// The "before" side of a jump at `time`. Equal to [`Segmented::get`]
    /// when there is no jump there.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Uninitialized`] if `time` precedes the first
    /// keyframe.
    pub fn get_before(&self, time: SimTime) -> Result<T, CurveError> {
        let range = self.frames.range_at(time);
        if range.len() < 2 {
            return self.get(time);
        }
        self.frames
            .get(range.start)
            .map(|k| k.value.clone())
            .ok_or(CurveError::Uninitialized { time })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn t(units: i32) -> SimTime {
        SimTime::from_int(units)
    }

    #[test]
    fn jump_exposes_both_sides() {
        let mut curve = Segmented::new();
        curve.set_last(t(0), 1_i32);
        curve.set_last_jump(t(5), 1, 9);

        assert!(curve.is_jump(t(5)));
        assert!(!curve.is_jump(t(0)));
        assert_eq!(curve.get(t(4)).unwrap(), 1);
        assert_eq!(curve.get(t(5)).unwrap(), 9);
        assert_eq!(curve.get_before(t(5)).unwrap(), 1);
        assert_eq!(curve.get_before(t(6)).unwrap(), 9);
    }

    #[test]
    fn insert_jump_between_existing_keyframes() {
        let mut curve = Segmented::new();
        curve.set_last(t(0), 0_i32);
        curve.set_last(t(10), 10);
        curve.set_insert_jump(t(5), 0, 5);

        assert_eq!(curve.len(), 4);
        assert_eq!(curve.get(t(7)).unwrap(), 5);
        assert_eq!(curve.get(t(10)).unwrap(), 10);

        curve.set_insert(t(5), 3);
        assert!(!curve.is_jump(t(5)));
        assert_eq!(curve.len(), 3);
    }

    #[test]
    fn set_last_truncates_jumps_too() {
        let mut curve = Segmented::new();
        curve.set_last(t(0), 0_i32);
        curve.set_last_jump(t(5), 0, 5);
        curve.set_last(t(5), 2);
        assert!(!curve.is_jump(t(5)));
        assert_eq!(curve.get_before(t(5)).unwrap(), 2);
    }

    #[test]
    fn uninitialized_before_first_keyframe() {
        let curve: Segmented<i32> = Segmented::new();
        assert_eq!(
            curve.get_before(t(0)),
            Err(CurveError::Uninitialized { time: t(0) })
        );
    }
}
