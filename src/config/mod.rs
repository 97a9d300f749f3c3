// src/config/mod.rs - Controller configuration (TOML)
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub axis: AxisPair,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub buttons: ButtonConfig,

    #[serde(default)]
    pub timing: TimingConfig,
}

/// Host-facing serial channel.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    #[serde(default = "default_host_port")]
    pub port: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AxisPair {
    #[serde(default = "default_axis_x")]
    pub x: AxisConfig,
    #[serde(default = "default_axis_y")]
    pub y: AxisConfig,
}

/// One downstream drive link.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AxisConfig {
    pub port: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// The drive's unit address on its own point-to-point link.
    #[serde(default = "default_drive_unit")]
    pub unit: u8,
    /// The unit id the host uses to reach this drive through the gateway.
    pub subordinate_unit: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// The gateway's own slave unit id.
    #[serde(default = "default_gateway_unit")]
    pub unit: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ButtonConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// "polled" samples the level each cycle; "interrupt" consumes edge
    /// events. The controller only depends on the debounce capability.
    #[serde(default = "default_button_mode")]
    pub mode: ButtonMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonMode {
    Polled,
    Interrupt,
}

/// Cycle pacing. The drive-facing settle delay is not here: command
/// spacing toward the drive is a protocol constant, not an installation
/// tunable.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    /// Gap between the two axes inside a both-axis operation.
    #[serde(default = "default_inter_axis_ms")]
    pub inter_axis_ms: u64,
    /// Pause between control-cycle phases.
    #[serde(default = "default_cycle_ms")]
    pub cycle_ms: u64,
    /// Drive response timeout.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

impl TimingConfig {
    pub fn inter_axis(&self) -> Duration {
        Duration::from_millis(self.inter_axis_ms)
    }

    pub fn cycle(&self) -> Duration {
        Duration::from_millis(self.cycle_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

// Default value functions
fn default_host_port() -> String {
    "/dev/ttyUSB0".to_string()
}
fn default_baud() -> u32 {
    115200
}
fn default_drive_unit() -> u8 {
    1
}
fn default_gateway_unit() -> u8 {
    1
}
fn default_debounce_ms() -> u64 {
    1000
}
fn default_button_mode() -> ButtonMode {
    ButtonMode::Polled
}
fn default_inter_axis_ms() -> u64 {
    50
}
fn default_cycle_ms() -> u64 {
    50
}
fn default_response_timeout_ms() -> u64 {
    500
}
fn default_axis_x() -> AxisConfig {
    AxisConfig {
        port: "/dev/ttyUSB1".to_string(),
        baud: default_baud(),
        unit: default_drive_unit(),
        subordinate_unit: 2,
    }
}
fn default_axis_y() -> AxisConfig {
    AxisConfig {
        port: "/dev/ttyUSB2".to_string(),
        baud: default_baud(),
        unit: default_drive_unit(),
        subordinate_unit: 3,
    }
}

impl Default for AxisPair {
    fn default() -> Self {
        Self {
            x: default_axis_x(),
            y: default_axis_y(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            port: default_host_port(),
            baud: default_baud(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            unit: default_gateway_unit(),
        }
    }
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            mode: default_button_mode(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            inter_axis_ms: default_inter_axis_ms(),
            cycle_ms: default_cycle_ms(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        tracing::info!("Loaded configuration from {}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.port.is_empty() {
            return Err(ConfigError::Invalid("host port must be specified".into()));
        }
        if self.host.baud == 0 {
            return Err(ConfigError::Invalid(
                "host baud rate must be positive".into(),
            ));
        }
        for (name, axis) in [("x", &self.axis.x), ("y", &self.axis.y)] {
            if axis.port.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "axis {} port must be specified",
                    name
                )));
            }
            if axis.baud == 0 {
                return Err(ConfigError::Invalid(format!(
                    "axis {} baud rate must be positive",
                    name
                )));
            }
            if axis.subordinate_unit == self.gateway.unit {
                return Err(ConfigError::Invalid(format!(
                    "axis {} subordinate unit collides with the gateway unit id",
                    name
                )));
            }
        }
        if self.axis.x.subordinate_unit == self.axis.y.subordinate_unit {
            return Err(ConfigError::Invalid(
                "axis subordinate unit ids must differ".into(),
            ));
        }
        Ok(())
    }
}
