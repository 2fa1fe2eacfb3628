//! Configuration file support for autoscroll.
//!
//! Configuration is loaded from `~/.config/autoscroll/config.toml` (or the
//! path in `AUTOSCROLL_CONFIG`). Every key is optional; missing keys keep
//! their defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.config/autoscroll/config.toml
//! frequency_hz = 240.0
//! dead_zone_px = 8.0
//! gain = 0.3
//! max_rate = 240.0
//! max_hold_secs = 60.0   # 0 disables the ceiling
//! button = "middle"
//! release = "persistent"
//!
//! [watchdog]
//! policy = "inactivity"
//! timeout_secs = 120.0
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::input::Button;
use crate::log;
use crate::scroll::RateParams;

/// Upper bound on the watchdog poll interval
const MAX_WATCHDOG_POLL: Duration = Duration::from_millis(250);

/// Main configuration structure, as read from the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control loop sampling frequency
    pub frequency_hz: f64,

    /// Jitter band around the anchor, in pixels
    pub dead_zone_px: f64,

    /// Pixels beyond the dead zone -> steps per second
    pub gain: f64,

    /// Maximum steps per second
    pub max_rate: f64,

    /// Longest allowed single hold in seconds (0 = no limit)
    pub max_hold_secs: f64,

    /// Button that starts a drag
    pub button: Button,

    /// What releasing the button does to the session
    pub release: ReleasePolicy,

    /// When the whole process gives up waiting
    pub watchdog: WatchdogConfig,

    /// Status text shown in the host application while the session runs
    pub status_text: String,

    /// Log scroll commands instead of sending them
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frequency_hz: 240.0,
            dead_zone_px: 8.0,
            gain: 0.3,
            max_rate: 240.0,
            max_hold_secs: 60.0,
            button: Button::Middle,
            release: ReleasePolicy::SingleShot,
            watchdog: WatchdogConfig::default(),
            status_text: "Scrolling...".to_string(),
            dry_run: false,
        }
    }
}

/// Behaviour of the gesture listener when the button is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleasePolicy {
    /// Releasing the button ends the whole session
    SingleShot,
    /// Releasing only stops scrolling; the listener waits for another press
    Persistent,
}

/// Watchdog section of the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum WatchdogConfig {
    /// Exit if no gesture starts within `timeout_secs` of launch
    Startup { timeout_secs: f64 },
    /// Exit after `timeout_secs` without press/release while not holding
    Inactivity { timeout_secs: f64 },
    /// Never exit on a timer
    Disabled,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        WatchdogConfig::Startup { timeout_secs: 30.0 }
    }
}

/// Validated watchdog policy with its timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogPolicy {
    Startup(Duration),
    Inactivity(Duration),
    Disabled,
}

impl WatchdogPolicy {
    /// How often the watchdog looks at the session timestamps.
    pub fn poll_interval(&self) -> Option<Duration> {
        match self {
            WatchdogPolicy::Startup(timeout) | WatchdogPolicy::Inactivity(timeout) => {
                Some((*timeout / 10).min(MAX_WATCHDOG_POLL))
            }
            WatchdogPolicy::Disabled => None,
        }
    }
}

/// Control loop parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSettings {
    /// Time between ticks
    pub period: Duration,
    pub rate: RateParams,
    pub max_hold: Option<Duration>,
}

/// Runtime settings, produced by [`Config::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub control: LoopSettings,
    pub button: Button,
    pub release: ReleasePolicy,
    pub watchdog: WatchdogPolicy,
    pub status_text: String,
    pub dry_run: bool,
}

impl Config {
    /// Load configuration from the config file path.
    ///
    /// Returns default configuration if the file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::log_error(&format!(
                        "Failed to parse config file {}: {}",
                        config_path.display(),
                        e
                    ));
                    Self::default()
                }
            },
            Err(e) => {
                log::log_error(&format!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                ));
                Self::default()
            }
        }
    }

    /// Get the configuration file path, honouring `AUTOSCROLL_CONFIG`.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("AUTOSCROLL_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("autoscroll")
            .join("config.toml")
    }

    /// Apply environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("AUTOSCROLL_DRY_RUN") {
            self.dry_run = matches!(value.trim(), "1" | "true" | "yes");
        }
        self
    }

    /// Check every numeric parameter and build runtime settings.
    pub fn validate(&self) -> ConfigResult<Settings> {
        if !(self.frequency_hz.is_finite() && self.frequency_hz > 0.0) {
            return Err(ConfigError::InvalidFrequency(self.frequency_hz));
        }
        if !(self.gain.is_finite() && self.gain > 0.0) {
            return Err(ConfigError::InvalidGain(self.gain));
        }
        if !(self.max_rate.is_finite() && self.max_rate > 0.0) {
            return Err(ConfigError::InvalidMaxRate(self.max_rate));
        }
        if !(self.dead_zone_px.is_finite() && self.dead_zone_px >= 0.0) {
            return Err(ConfigError::InvalidDeadZone(self.dead_zone_px));
        }
        if !(self.max_hold_secs.is_finite() && self.max_hold_secs >= 0.0) {
            return Err(ConfigError::InvalidMaxHold(self.max_hold_secs));
        }

        let watchdog = match self.watchdog {
            WatchdogConfig::Startup { timeout_secs } => {
                WatchdogPolicy::Startup(positive_secs(timeout_secs)?)
            }
            WatchdogConfig::Inactivity { timeout_secs } => {
                WatchdogPolicy::Inactivity(positive_secs(timeout_secs)?)
            }
            WatchdogConfig::Disabled => WatchdogPolicy::Disabled,
        };

        let max_hold = if self.max_hold_secs > 0.0 {
            let limit = Duration::try_from_secs_f64(self.max_hold_secs)
                .map_err(|_| ConfigError::InvalidMaxHold(self.max_hold_secs))?;
            Some(limit)
        } else {
            None
        };

        // A period outside Duration's range (or rounded to zero) cannot be slept on
        let period = Duration::try_from_secs_f64(1.0 / self.frequency_hz)
            .ok()
            .filter(|period| !period.is_zero())
            .ok_or(ConfigError::InvalidFrequency(self.frequency_hz))?;

        Ok(Settings {
            control: LoopSettings {
                period,
                rate: RateParams {
                    dead_zone: self.dead_zone_px,
                    gain: self.gain,
                    max_rate: self.max_rate,
                },
                max_hold,
            },
            button: self.button,
            release: self.release,
            watchdog,
            status_text: self.status_text.clone(),
            dry_run: self.dry_run,
        })
    }
}

fn positive_secs(secs: f64) -> ConfigResult<Duration> {
    if !(secs.is_finite() && secs > 0.0) {
        return Err(ConfigError::InvalidWatchdogTimeout(secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidWatchdogTimeout(secs))
}
