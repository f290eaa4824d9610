//! Error types for the `keyframe-events` crate.

use keyframe_types::SimTime;

/// Errors that can occur when creating or executing events.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// An event was requested for a class id that was never registered.
    #[error("event class not registered: {0}")]
    ClassNotRegistered(String),

    /// Events kept re-triggering each other and did not settle.
    #[error("events did not settle at t={time} after {rounds} rounds")]
    SettleLimitExceeded {
        /// The time the loop was trying to reach.
        time: SimTime,
        /// Number of rounds executed before giving up.
        rounds: u32,
    },
}
