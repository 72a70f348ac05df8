//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Environment variable that overrides `serial.port`
pub const PORT_ENV_VAR: &str = "ARDUINO_PORT";

/// Baud rates accepted for the Arduino link
const STANDARD_BAUD_RATES: &[u32] = &[
    1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200, 230400, 250000, 500000, 1000000,
];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    /// Pause after opening the port; most boards reset when DTR toggles.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

/// Raw-to-normalized signal mapping
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MappingConfig {
    /// Left stick deadzone in raw counts (0 disables it)
    #[serde(default)]
    pub deadzone_left: i32,

    /// Right stick deadzone in raw counts (0 disables it)
    #[serde(default)]
    pub deadzone_right: i32,

    #[serde(default = "default_trigger_threshold")]
    pub trigger_threshold: i32,

    #[serde(default = "default_trigger_max_input")]
    pub trigger_max_input: i32,
}

/// Controller session tuning
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SessionConfig {
    #[serde(default = "default_keep_alive_ms")]
    pub keep_alive_ms: u64,

    #[serde(default = "default_stick_change_threshold")]
    pub stick_change_threshold: i32,

    #[serde(default = "default_trigger_change_threshold")]
    pub trigger_change_threshold: i32,

    #[serde(default = "default_error_pause_ms")]
    pub error_pause_ms: u64,

    #[serde(default = "default_device_name")]
    pub device_name: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rotated log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 9600 }
fn default_timeout_ms() -> u64 { 1000 }
fn default_reconnect_interval_ms() -> u64 { 3000 }
fn default_settle_ms() -> u64 { 2000 }

fn default_trigger_threshold() -> i32 { 10 }
fn default_trigger_max_input() -> i32 { 512 }

fn default_keep_alive_ms() -> u64 { 100 }
fn default_stick_change_threshold() -> i32 { 1000 }
fn default_trigger_change_threshold() -> i32 { 5 }
fn default_error_pause_ms() -> u64 { 100 }
fn default_device_name() -> String { "Arduino Custom Gamepad".to_string() }

fn default_log_level() -> String { "info".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            deadzone_left: 0,
            deadzone_right: 0,
            trigger_threshold: default_trigger_threshold(),
            trigger_max_input: default_trigger_max_input(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keep_alive_ms: default_keep_alive_ms(),
            stick_change_threshold: default_stick_change_threshold(),
            trigger_change_threshold: default_trigger_change_threshold(),
            error_pause_ms: default_error_pause_ms(),
            device_name: default_device_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            mapping: MappingConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SerialConfig {
    /// Read timeout for a single line
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Fixed delay between connection attempts
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl SessionConfig {
    /// Longest gap allowed between two device flushes while frames arrive
    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms)
    }

    pub fn error_pause(&self) -> Duration {
        Duration::from_millis(self.error_pause_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// The `ARDUINO_PORT` environment variable, when set, replaces
    /// `serial.port` before validation.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use arduino_pad_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.apply_port_override(std::env::var(PORT_ENV_VAR).ok());
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults with the environment override applied
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_port_override(std::env::var(PORT_ENV_VAR).ok());
        config.validate()?;
        Ok(config)
    }

    /// Replace the serial port when an override is present and non-blank
    pub fn apply_port_override(&mut self, port: Option<String>) {
        if let Some(port) = port.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()) {
            self.serial.port = port;
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !STANDARD_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate {} is not a standard rate",
                self.serial.baud_rate
            )));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        if self.serial.reconnect_interval_ms == 0 || self.serial.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        if self.serial.settle_ms > 10000 {
            return Err(invalid("settle_ms must be at most 10000"));
        }

        for (name, value) in [
            ("deadzone_left", self.mapping.deadzone_left),
            ("deadzone_right", self.mapping.deadzone_right),
        ] {
            if !(0..=512).contains(&value) {
                return Err(invalid(format!("{} must be between 0 and 512", name)));
            }
        }

        if !(0..=1023).contains(&self.mapping.trigger_threshold) {
            return Err(invalid("trigger_threshold must be between 0 and 1023"));
        }

        if !(1..=1023).contains(&self.mapping.trigger_max_input) {
            return Err(invalid("trigger_max_input must be between 1 and 1023"));
        }

        if self.mapping.trigger_threshold >= self.mapping.trigger_max_input {
            return Err(invalid("trigger_threshold must be less than trigger_max_input"));
        }

        if self.session.keep_alive_ms == 0 || self.session.keep_alive_ms > 10000 {
            return Err(invalid("keep_alive_ms must be between 1 and 10000"));
        }

        if self.session.error_pause_ms == 0 || self.session.error_pause_ms > 10000 {
            return Err(invalid("error_pause_ms must be between 1 and 10000"));
        }

        if !(0..=65535).contains(&self.session.stick_change_threshold) {
            return Err(invalid("stick_change_threshold must be between 0 and 65535"));
        }

        if !(0..=255).contains(&self.session.trigger_change_threshold) {
            return Err(invalid("trigger_change_threshold must be between 0 and 255"));
        }

        if self.session.device_name.trim().is_empty() {
            return Err(invalid("device_name cannot be empty"));
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(invalid(format!("unknown log level '{}'", self.logging.level)));
        }

        if matches!(&self.logging.log_dir, Some(dir) if dir.is_empty()) {
            return Err(invalid("log_dir cannot be empty when set"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> BridgeError {
    BridgeError::Config(toml::de::Error::custom(msg))
}
