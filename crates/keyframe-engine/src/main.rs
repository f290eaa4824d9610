//! Engine binary for the keyframe simulation core.
//!
//! Loads the configuration, sets up structured logging and plays a
//! headless Pong match in which every collision, serve and paddle move is
//! an event scheduled from curves. The final match summary is written to
//! stdout as JSON.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `keyframe-config.yaml` (or `KEYFRAME_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Register the event classes and schedule the match
//! 4. Drive the event loop up to `run.end_time`
//! 5. Log and print the result

mod config;
mod error;
mod pong;
mod run;

use std::path::{Path, PathBuf};

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{EngineConfig, LoggingConfig};
use crate::error::EngineError;

/// Config file read when `KEYFRAME_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "keyframe-config.yaml";

/// Environment variable overriding the config file location.
const CONFIG_PATH_VAR: &str = "KEYFRAME_CONFIG";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the run
/// fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging depends on it, so it comes first.
    let config_path = config_path();
    let loaded = load_config(&config_path)?;
    let found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("keyframe-engine starting");
    if found {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        end_time = %config.run.end_time,
        step = %config.run.step,
        max_rounds = config.event_loop.max_rounds,
        seed = config.pong.seed,
        "Run parameters"
    );

    // 3-4. Schedule the match and drive the event loop.
    let report = run::run(&config)?;

    // 5. Log the result.
    info!(
        reached = %report.reached,
        steps = report.steps,
        rounds = report.rounds,
        events_executed = report.events_executed,
        serves = report.summary.serves,
        winner = ?report.summary.winner,
        "Run finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Where to read the configuration from.
fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_VAR)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the configuration file, or `None` if it does not exist.
fn load_config(path: &Path) -> Result<Option<EngineConfig>, EngineError> {
    if path.exists() {
        let config = EngineConfig::from_file(path)?;
        Ok(Some(config))
    } else {
        Ok(None)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
