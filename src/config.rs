//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{RingError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ring device configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub address: String,

    #[serde(default = "default_scan_timeout_ms")]
    pub scan_timeout_ms: u64,
}

/// Measurement session configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_raw_motion_settle_ms")]
    pub raw_motion_settle_ms: u64,

    #[serde(default = "default_spo2_max_readings")]
    pub spo2_max_readings: usize,
}

/// Output and log file configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,

    #[serde(default = "default_log_format")]
    pub format: OutputFormat,
}

/// How measurement results are printed
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable lines
    Text,

    /// One JSON object per line
    Json,
}

// Default value functions
fn default_scan_timeout_ms() -> u64 { 10_000 }

fn default_settle_delay_ms() -> u64 { 500 }
fn default_raw_motion_settle_ms() -> u64 { 2000 }
fn default_spo2_max_readings() -> usize { 5 }

fn default_log_format() -> OutputFormat { OutputFormat::Text }

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            address: String::new(),
            scan_timeout_ms: default_scan_timeout_ms(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            raw_motion_settle_ms: default_raw_motion_settle_ms(),
            spo2_max_readings: default_spo2_max_readings(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: default_log_format(),
        }
    }
}

impl DeviceConfig {
    /// Display label, `name [address]` when a name is known
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.address.clone()
        } else {
            format!("{} [{}]", self.name, self.address)
        }
    }

    /// Time allowed for the configured ring to be seen
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
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
    /// use colmi_ring::config::Config;
    ///
    /// let config = Config::load("colmi-ring.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// The device address is not checked here; it may come from the command
    /// line instead.
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.device.scan_timeout_ms == 0 || self.device.scan_timeout_ms > 60000 {
            return Err(RingError::Config(
                toml::de::Error::custom("scan_timeout_ms must be between 1 and 60000")
            ));
        }

        if self.session.settle_delay_ms > 10000 {
            return Err(RingError::Config(
                toml::de::Error::custom("settle_delay_ms must be between 0 and 10000")
            ));
        }

        if self.session.raw_motion_settle_ms > 10000 {
            return Err(RingError::Config(
                toml::de::Error::custom("raw_motion_settle_ms must be between 0 and 10000")
            ));
        }

        if self.session.spo2_max_readings == 0 || self.session.spo2_max_readings > 100 {
            return Err(RingError::Config(
                toml::de::Error::custom("spo2_max_readings must be between 1 and 100")
            ));
        }

        if let Some(dir) = &self.logging.dir {
            if dir.as_os_str().is_empty() {
                return Err(RingError::Config(
                    toml::de::Error::custom("logging dir cannot be empty when set")
                ));
            }
        }

        Ok(())
    }
}
