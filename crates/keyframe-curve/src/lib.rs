//! Keyframed curves for the Keyframe simulation core.
//!
//! A curve stores the authoritative history and prediction of a single value
//! as a time-ordered list of keyframes. Reading a curve at any time yields the
//! value that keyframes imply; writing with `set_last` replaces the predicted
//! future from that point on.
//!
//! # Modules
//!
//! - [`keyframe`] -- [`Keyframe`] and the sorted [`KeyframeContainer`]
//! - [`interpolate`] -- The [`Interpolate`] trait and its fixed-point impls
//! - [`continuous`] -- [`Continuous`], linearly interpolated curves
//! - [`discrete`] -- [`Discrete`], step-function curves
//! - [`segmented`] -- [`Segmented`], step functions with explicit jumps
//! - [`queue`] -- [`Queue`], a FIFO whose contents depend on the read time
//! - [`array`] -- [`Array`], fixed-size arrays of step curves
//! - [`map`] -- [`TimedMap`], keyed entries with lifetimes
//! - [`error`] -- [`CurveError`]
//!
//! # Design Principles
//!
//! - Reads never mutate and never panic; a read before the first keyframe is
//!   an error value.
//! - All arithmetic is integer or [`rust_decimal::Decimal`], so every peer
//!   computes the same bits.

pub mod array;
pub mod continuous;
pub mod discrete;
pub mod error;
pub mod interpolate;
pub mod keyframe;
pub mod map;
pub mod queue;
pub mod segmented;

// Re-export all public types at crate root for convenience.
pub use array::Array;
pub use continuous::Continuous;
pub use discrete::Discrete;
pub use error::CurveError;
pub use interpolate::Interpolate;
pub use keyframe::{Keyframe, KeyframeContainer};
pub use map::{MapElement, TimedMap};
pub use queue::{Queue, QueueElement};
pub use segmented::Segmented;
