// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Monitor configuration.
//!
//! Loaded from an optional TOML file; command-line flags override file values.
//!
//! ```toml
//! bind = "0.0.0.0:5568"
//! interface = "192.168.1.20"
//! universes = [1, 2, 3]
//! timeout_ms = 2500
//! format = "json"
//! ```

use sacn::config::{validate_universe, ReceiverConfig, DEFAULT_SINK_CAPACITY, TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Output format of data and error lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Local bind address.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Interface for multicast membership.
    #[serde(default)]
    pub interface: Option<Ipv4Addr>,

    /// Join universe multicast groups (disable for unicast-only senders).
    #[serde(default = "default_true")]
    pub multicast: bool,

    /// Universes to activate.
    #[serde(default)]
    pub universes: Vec<u16>,

    /// Source and universe timeout (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Bound of the data and error channels.
    #[serde(default = "default_sink_capacity")]
    pub sink_capacity: usize,

    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_bind() -> SocketAddr {
    ReceiverConfig::default().bind_addr
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    TIMEOUT_MS
}

fn default_sink_capacity() -> usize {
    DEFAULT_SINK_CAPACITY
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            interface: None,
            multicast: true,
            universes: Vec::new(),
            timeout_ms: TIMEOUT_MS,
            sink_capacity: DEFAULT_SINK_CAPACITY,
            format: OutputFormat::Text,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file (not validated; flags may still apply).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.universes.is_empty() {
            return Err(ConfigError::Invalid("No universes configured".into()));
        }

        for &universe in &self.universes {
            validate_universe(universe).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be non-zero".into()));
        }

        Ok(())
    }

    /// Receiver settings for this configuration.
    pub fn receiver_config(&self) -> ReceiverConfig {
        let mut config = ReceiverConfig::default()
            .bind_addr(self.bind)
            .multicast(self.multicast)
            .timeout(Duration::from_millis(self.timeout_ms))
            .sink_capacity(self.sink_capacity);
        if let Some(iface) = self.interface {
            config = config.multicast_interface(iface);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.bind.port(), 5568);
        assert_eq!(config.timeout_ms, 2500);
        assert!(config.multicast);
        // No universes yet
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
bind = "127.0.0.1:6000"
interface = "10.0.0.5"
universes = [1, 512]
timeout_ms = 1000
format = "json"
"#
        )
        .expect("write config");

        let config = MonitorConfig::from_file(file.path()).expect("parse");
        assert_eq!(config.bind, "127.0.0.1:6000".parse().expect("valid addr"));
        assert_eq!(config.interface, Some(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(config.universes, vec![1, 512]);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.sink_capacity, DEFAULT_SINK_CAPACITY);
        assert!(config.validate().is_ok());

        let receiver = config.receiver_config();
        assert_eq!(receiver.timeout, Duration::from_millis(1000));
        assert_eq!(receiver.multicast_interface, Some(Ipv4Addr::new(10, 0, 0, 5)));
    }

    #[test]
    fn test_from_file_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "universe = 1").expect("write config");
        assert!(matches!(
            MonitorConfig::from_file(file.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            MonitorConfig::from_file("/nonexistent/sacn-monitor.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_validate_universe_range() {
        let config = MonitorConfig {
            universes: vec![1, 64000],
            ..Default::default()
        };
        let err = config.validate().expect_err("64000 out of range");
        assert!(err.to_string().contains("64000"));
    }

    #[test]
    fn test_validate_timeout() {
        let config = MonitorConfig {
            universes: vec![1],
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
