//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode of startup and of the simulation run.

use crate::config::ConfigError;

/// Top-level error for the engine binary.
///
/// Each variant wraps a subsystem error so that `main` can propagate
/// everything with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// A configured time could not be represented as simulation time.
    #[error("time error: {source}")]
    Time {
        /// The underlying conversion error.
        #[from]
        source: keyframe_types::TimeError,
    },

    /// A curve read failed while building or summarising the match.
    #[error("curve error: {source}")]
    Curve {
        /// The underlying curve error.
        #[from]
        source: keyframe_curve::CurveError,
    },

    /// The event loop failed.
    #[error("event error: {source}")]
    Event {
        /// The underlying event error.
        #[from]
        source: keyframe_events::EventError,
    },

    /// The configuration parsed but describes an unusable run.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Which setting is wrong and why.
        message: String,
    },
}
