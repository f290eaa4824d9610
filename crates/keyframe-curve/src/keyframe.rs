//! Time-ordered keyframe storage shared by all curve kinds.
//!
//! A [`KeyframeContainer`] is a vector kept sorted by time. Lookups are
//! binary searches; insertion places a keyframe *after* every keyframe with
//! the same time, which is what lets [`Segmented`] store the two sides of a
//! jump in order.
//!
//! [`Segmented`]: crate::Segmented

use core::ops::Range;

use keyframe_types::SimTime;
use serde::{Deserialize, Serialize};

/// One authoritative `(time, value)` sample of a curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    /// When the value takes effect.
    pub time: SimTime,
    /// The value at that time.
    pub value: T,
}

impl<T> Keyframe<T> {
    /// Create a keyframe.
    pub const fn new(time: SimTime, value: T) -> Self {
        Self { time, value }
    }
}

/// Sorted keyframe sequence owned by exactly one curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyframeContainer<T> {
    /// Keyframes in non-decreasing time order.
    frames: Vec<Keyframe<T>>,
}

impl<T> Default for KeyframeContainer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> KeyframeContainer<T> {
    /// Create an empty container.
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Number of stored keyframes.
    pub const fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no keyframe has been stored yet.
    pub const fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// All keyframes in time order.
    pub fn as_slice(&self) -> &[Keyframe<T>] {
        &self.frames
    }

    /// Iterate keyframes in time order.
    pub fn iter(&self) -> core::slice::Iter<'_, Keyframe<T>> {
        self.frames.iter()
    }

    /// The keyframe at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Keyframe<T>> {
        self.frames.get(index)
    }

    /// The earliest keyframe.
    pub fn first(&self) -> Option<&Keyframe<T>> {
        self.frames.first()
    }

    /// The latest keyframe.
    pub fn last(&self) -> Option<&Keyframe<T>> {
        self.frames.last()
    }

    /// Index of the last keyframe with `time <= at`.
    ///
    /// When several keyframes share that time, the last of them is returned.
    pub fn last_at_or_before(&self, at: SimTime) -> Option<usize> {
        self.upper_bound(at).checked_sub(1)
    }

    /// The last keyframe with `time <= at`.
    pub fn at_or_before(&self, at: SimTime) -> Option<&Keyframe<T>> {
        self.last_at_or_before(at).and_then(|idx| self.frames.get(idx))
    }

    /// Index range of all keyframes whose time is exactly `at`.
    pub fn range_at(&self, at: SimTime) -> Range<usize> {
        self.lower_bound(at)..self.upper_bound(at)
    }

    /// Insert a keyframe after every existing keyframe with the same time.
    pub fn insert(&mut self, frame: Keyframe<T>) {
        let idx = self.upper_bound(frame.time);
        self.frames.insert(idx, frame);
    }

    /// Replace all keyframes at exactly `at` with `frames`.
    ///
    /// The replacement keyframes must all carry the time `at`; they are
    /// stored in the given order.
    pub fn replace_at<I>(&mut self, at: SimTime, frames: I)
    where
        I: IntoIterator<Item = Keyframe<T>>,
    {
        let range = self.range_at(at);
        let tail = self.frames.split_off(range.end);
        self.frames.truncate(range.start);
        self.frames.extend(frames);
        self.frames.extend(tail);
    }

    /// Drop every keyframe with `time > at`.
    pub fn truncate_after(&mut self, at: SimTime) {
        let keep = self.upper_bound(at);
        self.frames.truncate(keep);
    }

    /// Drop every keyframe with `time >= at`.
    pub fn truncate_from(&mut self, at: SimTime) {
        let keep = self.lower_bound(at);
        self.frames.truncate(keep);
    }

    /// Append a keyframe, assuming it is not earlier than the current last.
    ///
    /// Callers truncate first; this keeps the ordering invariant.
    pub(crate) fn push(&mut self, frame: Keyframe<T>) {
        debug_assert!(
            self.frames.last().is_none_or(|last| last.time <= frame.time),
            "keyframe pushed out of order"
        );
        self.frames.push(frame);
    }

    /// Number of keyframes with `time <= at`.
    fn upper_bound(&self, at: SimTime) -> usize {
        self.frames.partition_point(|k| k.time <= at)
    }

    /// Number of keyframes with `time < at`.
    fn lower_bound(&self, at: SimTime) -> usize {
        self.frames.partition_point(|k| k.time < at)
    }
}
