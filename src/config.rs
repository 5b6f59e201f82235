//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{BridgeError, Result};
use crate::hid::ReportLayout;
use crate::receiver::PeerFilter;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub receiver: ReceiverConfig,
    pub link: LinkConfig,
    pub hid: HidConfig,
    pub calibration: CalibrationConfig,
    pub status: StatusConfig,
    pub logging: LoggingConfig,
}

/// Sensor datagram receiver configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReceiverConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default)]
    pub allowed_peers: Vec<String>,
}

/// Host link (HID gadget serial port) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_link_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// HID report configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct HidConfig {
    #[serde(default)]
    pub layout: ReportLayout,
}

/// Calibration configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CalibrationConfig {
    #[serde(default = "default_calibration_duration_ms")]
    pub default_duration_ms: u64,
}

/// Periodic status logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StatusConfig {
    #[serde(default = "default_status_interval_ms")]
    pub interval_ms: u64,
}

/// Log file configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for daily log files; empty disables file logging
    #[serde(default)]
    pub dir: String,
}

// Default value functions
fn default_bind() -> String { "0.0.0.0:4210".to_string() }

fn default_link_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 115200 }

fn default_calibration_duration_ms() -> u64 { 5000 }

fn default_status_interval_ms() -> u64 { 10000 }

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_peers: Vec::new(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: default_link_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: default_calibration_duration_ms(),
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_status_interval_ms(),
        }
    }
}

/// Baud rates the HID gadget firmware accepts
const SUPPORTED_BAUD_RATES: [u32; 6] = [9600, 57600, 115200, 230400, 460800, 921600];

fn invalid(msg: impl std::fmt::Display) -> BridgeError {
    BridgeError::Config(toml::de::Error::custom(msg))
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
    /// use clutch_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
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
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        self.peer_filter()?;

        if self.link.port.is_empty() {
            return Err(invalid("link port cannot be empty"));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.link.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                SUPPORTED_BAUD_RATES
            )));
        }

        if self.calibration.default_duration_ms == 0
            || self.calibration.default_duration_ms > 600_000
        {
            return Err(invalid("default_duration_ms must be between 1 and 600000"));
        }

        if self.status.interval_ms == 0 || self.status.interval_ms > 3_600_000 {
            return Err(invalid("status interval_ms must be between 1 and 3600000"));
        }

        Ok(())
    }

    /// Parsed receiver bind address
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if `receiver.bind` is not a socket address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.receiver
            .bind
            .parse()
            .map_err(|_| invalid(format!("receiver bind '{}' is not a socket address", self.receiver.bind)))
    }

    /// Parsed peer filter
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if any peer is not a socket address
    pub fn peer_filter(&self) -> Result<PeerFilter> {
        self.receiver
            .allowed_peers
            .iter()
            .map(|peer| {
                peer.parse::<SocketAddr>()
                    .map_err(|_| invalid(format!("allowed peer '{}' is not a socket address", peer)))
            })
            .collect()
    }

    /// Duration of an operator-started calibration without an explicit length
    pub fn default_calibration_duration(&self) -> Duration {
        Duration::from_millis(self.calibration.default_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load_str(toml_content: &str) -> Result<Config> {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        Config::load(temp_file.path())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hid.layout, ReportLayout::DualAxis12);
        assert_eq!(config.default_calibration_duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_config_from_file() {
        let config = load_str(
            r#"
[receiver]
bind = "127.0.0.1:5000"
allowed_peers = ["192.168.4.2:4210"]

[link]
port = "/dev/ttyACM1"

[hid]
layout = "dual_axis_16"

[calibration]
default_duration_ms = 3000

[status]

[logging]
"#,
        )
        .unwrap();

        assert_eq!(config.bind_addr().unwrap(), "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.peer_filter().unwrap().len(), 1);
        assert_eq!(config.link.port, "/dev/ttyACM1");
        assert_eq!(config.link.baud_rate, 115200);
        assert_eq!(config.hid.layout, ReportLayout::DualAxis16);
        assert_eq!(config.calibration.default_duration_ms, 3000);
        assert_eq!(config.status.interval_ms, 10000);
        assert!(config.logging.dir.is_empty());
    }

    #[test]
    fn test_load_missing_section_fails() {
        assert!(load_str("[receiver]\n").is_err());
    }

    #[test]
    fn test_load_unknown_layout_fails() {
        let result = load_str(
            "[receiver]\n[link]\n[hid]\nlayout = \"triple\"\n[calibration]\n[status]\n[logging]\n",
        );
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(matches!(
            Config::load("/nonexistent/clutch-bridge.toml"),
            Err(BridgeError::Io(_))
        ));
    }

    #[test]
    fn test_invalid_bind() {
        let mut config = Config::default();
        config.receiver.bind = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_peer() {
        let mut config = Config::default();
        config.receiver.allowed_peers = vec!["10.0.0.1:4210".to_string(), "bogus".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_link_port() {
        let mut config = Config::default();
        config.link.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = Config::default();
        config.link.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_baud_rates() {
        for &baud in &SUPPORTED_BAUD_RATES {
            let mut config = Config::default();
            config.link.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_calibration_duration_zero() {
        let mut config = Config::default();
        config.calibration.default_duration_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_calibration_duration_too_high() {
        let mut config = Config::default();
        config.calibration.default_duration_ms = 600_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_status_interval_zero() {
        let mut config = Config::default();
        config.status.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_status_interval_too_high() {
        let mut config = Config::default();
        config.status.interval_ms = 3_600_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_bind(), "0.0.0.0:4210");
        assert_eq!(default_link_port(), "/dev/ttyACM0");
        assert_eq!(default_baud_rate(), 115200);
        assert_eq!(default_calibration_duration_ms(), 5000);
        assert_eq!(default_status_interval_ms(), 10000);
    }
}
