//! Shared type definitions for the Keyframe simulation core.
//!
//! This crate sits at the bottom of the workspace and has no knowledge of
//! curves or events. It defines the two values every other layer agrees on.
//!
//! # Modules
//!
//! - [`time`] -- [`SimTime`], the 48.16 fixed-point simulation time
//! - [`ids`] -- Integer identifier newtypes such as [`TargetId`]

pub mod ids;
pub mod time;

// Re-export all public types at crate root for convenience.
pub use ids::TargetId;
pub use time::{FRACTION_BITS, SimTime, TimeError};
