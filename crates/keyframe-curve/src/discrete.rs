//! Discrete curves: step functions that hold each value until the next
//! keyframe.

use keyframe_types::SimTime;
use serde::{Deserialize, Serialize};

use crate::error::CurveError;
use crate::keyframe::{Keyframe, KeyframeContainer};

/// A step-function curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrete<T> {
    /// Keyframes with strictly increasing times.
    frames: KeyframeContainer<T>,
}

impl<T> Default for Discrete<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Discrete<T> {
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

    fn frame_at(&self, time: SimTime) -> Result<&Keyframe<T>, CurveError> {
        self.frames
            .at_or_before(time)
            .ok_or(CurveError::Uninitialized { time })
    }
}

impl<T: Clone> Discrete<T> {
    /// Value of the last keyframe at or before `time`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Uninitialized`] if `time` precedes the first
    /// keyframe. This is not a panic or debug assertion in any build.
    pub fn get(&self, time: SimTime) -> Result<T, CurveError> {
        self.frame_at(time).map(|k| k.value.clone())
    }

    /// Like [`Discrete::get`], but also returns the keyframe's own time.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Uninitialized`] if `time` precedes the first
    /// keyframe.
    pub fn get_time(&self, time: SimTime) -> Result<(SimTime, T), CurveError> {
        self.frame_at(time).map(|k| (k.time, k.value.clone()))
    }

    /// The keyframe strictly before the one [`Discrete::get`] would use.
    ///
    /// Returns `None` when there is no such keyframe.
    pub fn get_previous(&self, time: SimTime) -> Option<(SimTime, T)> {
        let idx = self.frames.last_at_or_before(time)?.checked_sub(1)?;
        self.frames.get(idx).map(|k| (k.time, k.value.clone()))
    }
}
