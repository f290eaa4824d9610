//! Drives the event loop across the configured time range.
//!
//! The loop advances in fixed steps of `run.step` and calls
//! [`EventManager::execute_until`] once per step. Steps only bound how far
//! the loop runs per call; when events fire is decided by the events
//! themselves.

use keyframe_events::EventManager;
use keyframe_types::SimTime;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::pong::{self, MatchSummary, PongState};

/// Outcome of a complete run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Number of `execute_until` calls.
    pub steps: u32,
    /// The time the last call ran up to.
    pub reached: Decimal,
    /// Fixpoint rounds over all calls.
    pub rounds: u64,
    /// Target changes applied to the queue over all calls.
    pub changes_processed: usize,
    /// Event bodies executed over all calls.
    pub events_executed: usize,
    /// State of the match at the end of the run.
    pub summary: MatchSummary,
}

/// Play the demo match described by `config`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidConfig`] or [`EngineError::Time`] for a
/// configuration that cannot drive a run, and [`EngineError::Event`] if
/// the event loop does not settle within `event_loop.max_rounds`.
pub fn run(config: &EngineConfig) -> Result<RunReport, EngineError> {
    config.validate()?;
    let end = SimTime::from_decimal(config.run.end_time)?;
    let step = SimTime::from_decimal(config.run.step)?;
    if step <= SimTime::ZERO {
        return Err(EngineError::InvalidConfig {
            message: format!("run.step {} is below the time resolution", config.run.step),
        });
    }

    let mut manager = EventManager::with_config(config.event_loop);
    pong::register_classes(&mut manager, &config.pong)?;
    let mut state = PongState::new(&manager, config.pong.clone(), SimTime::ZERO);
    pong::start_match(&mut manager, &state, SimTime::ZERO)?;

    let mut steps = 0_u32;
    let mut rounds = 0_u64;
    let mut changes_processed = 0_usize;
    let mut events_executed = 0_usize;
    let mut now = SimTime::ZERO;
    loop {
        now = now.saturating_add(step).min(end);
        let done = manager.execute_until(now, &mut state)?;
        steps = steps.saturating_add(1);
        rounds = rounds.saturating_add(u64::from(done.rounds));
        changes_processed = changes_processed.saturating_add(done.changes_processed);
        events_executed = events_executed.saturating_add(done.events_executed);
        debug!(
            time = %now,
            rounds = done.rounds,
            executed = done.events_executed,
            pending = manager.queue().len(),
            "step complete"
        );

        if now >= end {
            break;
        }
        if config.run.stop_when_finished && state.is_finished() {
            info!(time = %now, misses = state.stats().misses, "match decided, stopping early");
            break;
        }
    }

    Ok(RunReport {
        steps,
        reached: now.to_decimal(),
        rounds,
        changes_processed,
        events_executed,
        summary: state.summary(now)?,
    })
}
