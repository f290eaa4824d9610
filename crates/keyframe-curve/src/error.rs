//! Error types for the `keyframe-curve` crate.
//!
//! All fallible curve operations return [`CurveError`].

use keyframe_types::SimTime;

/// Errors that can occur when reading or writing a curve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    /// The curve was read at a time before its first keyframe (or while it
    /// has no keyframes at all). This is a programming error in the caller.
    /// It is returned in every build profile, debug builds included; callers
    /// that cannot recover log it at error level.
    #[error("uninitialized curve: no keyframe at or before t={time}")]
    Uninitialized {
        /// The time that was queried.
        time: SimTime,
    },

    /// A queue curve had no live element at the queried time.
    #[error("empty queue at t={time}")]
    EmptyQueue {
        /// The time that was queried.
        time: SimTime,
    },

    /// An array curve was addressed past its last element.
    #[error("index {index} out of bounds for array of {len} elements")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// Number of elements in the array.
        len: usize,
    },

    /// Arithmetic overflow while interpolating between keyframes.
    #[error("arithmetic overflow in curve interpolation")]
    ArithmeticOverflow,
}
