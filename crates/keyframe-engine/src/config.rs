//! Configuration loading and typed config structures for the engine.
//!
//! The configuration lives in `keyframe-config.yaml` next to the binary
//! (or wherever `KEYFRAME_CONFIG` points). Every section and field is
//! optional; anything left out falls back to the defaults below.

use std::path::Path;

use keyframe_events::LoopConfig;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::EngineError;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration, mirroring `keyframe-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Fixpoint loop tunables handed to the event manager.
    #[serde(default)]
    pub event_loop: LoopConfig,

    /// How far and in which increments the simulation is driven.
    #[serde(default)]
    pub run: RunConfig,

    /// Parameters of the demo match.
    #[serde(default)]
    pub pong: PongConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Reject values that parse but cannot drive a run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), EngineError> {
        let checks = [
            (self.run.step > Decimal::ZERO, "run.step must be positive"),
            (
                self.run.end_time >= Decimal::ZERO,
                "run.end_time must not be negative",
            ),
            (self.pong.width > Decimal::ZERO, "pong.width must be positive"),
            (self.pong.height > Decimal::ZERO, "pong.height must be positive"),
            (
                self.pong.paddle_size > Decimal::ZERO && self.pong.paddle_size <= self.pong.height,
                "pong.paddle_size must be positive and fit the field",
            ),
            (self.pong.lives > 0, "pong.lives must be positive"),
            (
                self.pong.ball_speed > Decimal::ZERO,
                "pong.ball_speed must be positive",
            ),
            (
                self.pong.paddle_speed >= Decimal::ZERO,
                "pong.paddle_speed must not be negative",
            ),
            (
                self.pong.steer_interval > Decimal::ZERO,
                "pong.steer_interval must be positive",
            ),
            (
                self.event_loop.max_rounds > 0,
                "event_loop.max_rounds must be positive",
            ),
        ];
        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, message)) => Err(EngineError::InvalidConfig {
                message: (*message).to_owned(),
            }),
            None => Ok(()),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit one JSON object per line instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// Run bounds, in simulation time units.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// The run stops once the event loop has been driven up to this time.
    #[serde(default = "default_end_time")]
    pub end_time: Decimal,

    /// Increment between two `execute_until` calls.
    #[serde(default = "default_step")]
    pub step: Decimal,

    /// Stop early as soon as the match has a loser.
    #[serde(default = "default_stop_when_finished")]
    pub stop_when_finished: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            end_time: default_end_time(),
            step: default_step(),
            stop_when_finished: default_stop_when_finished(),
        }
    }
}

fn default_end_time() -> Decimal {
    Decimal::new(300, 0)
}

const fn default_step() -> Decimal {
    Decimal::ONE
}

const fn default_stop_when_finished() -> bool {
    true
}

/// Field geometry and player settings of the demo match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PongConfig {
    /// Distance between the two goal lines.
    #[serde(default = "default_width")]
    pub width: Decimal,

    /// Distance between the two walls.
    #[serde(default = "default_height")]
    pub height: Decimal,

    /// Length of each paddle.
    #[serde(default = "default_paddle_size")]
    pub paddle_size: Decimal,

    /// Misses a player survives before losing.
    #[serde(default = "default_lives")]
    pub lives: i64,

    /// Horizontal ball speed after a serve.
    #[serde(default = "default_ball_speed")]
    pub ball_speed: Decimal,

    /// Top speed of a paddle.
    #[serde(default = "default_paddle_speed")]
    pub paddle_speed: Decimal,

    /// Time between two steering decisions of a paddle.
    #[serde(default = "default_steer_interval")]
    pub steer_interval: Decimal,

    /// Seed of the serve direction generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for PongConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            paddle_size: default_paddle_size(),
            lives: default_lives(),
            ball_speed: default_ball_speed(),
            paddle_speed: default_paddle_speed(),
            steer_interval: default_steer_interval(),
            seed: default_seed(),
        }
    }
}

fn default_width() -> Decimal {
    Decimal::new(40, 0)
}

fn default_height() -> Decimal {
    Decimal::new(20, 0)
}

fn default_paddle_size() -> Decimal {
    Decimal::new(4, 0)
}

const fn default_lives() -> i64 {
    3
}

fn default_ball_speed() -> Decimal {
    Decimal::new(8, 0)
}

fn default_paddle_speed() -> Decimal {
    Decimal::new(6, 0)
}

fn default_steer_interval() -> Decimal {
    Decimal::new(25, 2)
}

const fn default_seed() -> u64 {
    42
}
