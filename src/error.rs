//! Domain error types for autoscroll
//!
//! Provides structured error types for different domains:
//! - `ConfigError` for rejected configuration values
//! - `SinkError` for commands sent to the host application
//! - `InputError` for the pointer/button backend
//! - `AutoscrollError` as the top-level error type

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for autoscroll
#[derive(Debug, Error)]
pub enum AutoscrollError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scroll sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Errors raised while validating configuration values
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("frequency_hz must be a positive number, got {0}")]
    InvalidFrequency(f64),

    #[error("gain must be a positive number, got {0}")]
    InvalidGain(f64),

    #[error("max_rate must be a positive number, got {0}")]
    InvalidMaxRate(f64),

    #[error("dead_zone_px must be zero or positive, got {0}")]
    InvalidDeadZone(f64),

    #[error("max_hold_secs must be zero or positive, got {0}")]
    InvalidMaxHold(f64),

    #[error("watchdog timeout_secs must be positive, got {0} (use policy = \"disabled\" instead of 0)")]
    InvalidWatchdogTimeout(f64),

    #[error("missing host application path argument")]
    MissingTarget,
}

/// Errors from commands sent to the host application
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' exited with {status}")]
    CommandFailed { command: String, status: String },
}

/// Errors related to the pointer/button input backend
#[derive(Debug, Error)]
pub enum InputError {
    #[error("No input device reports the {0} button with relative motion")]
    NoDevices(String),

    #[error("Failed to read input device {0}: {1}")]
    Device(PathBuf, String),

    #[error("No input backend is available on this platform")]
    #[cfg_attr(target_os = "linux", allow(dead_code))]
    Unsupported,
}

/// Result type alias for AutoscrollError
pub type Result<T> = std::result::Result<T, AutoscrollError>;

/// Result type alias for ConfigError
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for SinkError
pub type SinkResult<T> = std::result::Result<T, SinkError>;

impl From<tokio::task::JoinError> for AutoscrollError {
    fn from(err: tokio::task::JoinError) -> Self {
        AutoscrollError::Worker(err.to_string())
    }
}
