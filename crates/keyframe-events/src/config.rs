//! Tunables of the fixpoint loop.

use serde::Deserialize;

/// Default upper bound on fixpoint rounds per `execute_until` call.
const DEFAULT_MAX_ROUNDS: u32 = 1000;

/// Configuration of an [`EventManager`](crate::EventManager).
///
/// Loaded from the `event_loop` section of the engine config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LoopConfig {
    /// Rounds of change processing plus execution after which
    /// `execute_until` gives up with
    /// [`EventError::SettleLimitExceeded`](crate::EventError::SettleLimitExceeded).
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

const fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}
