//! Configuration file management.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use enerdash_types::DeviceKind;

/// Default backend URL (the simulator's Flask default).
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the simulation backend
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-device poll interval overrides
    #[serde(default)]
    pub intervals: IntervalOverrides,
}

/// Poll interval overrides, in milliseconds.
///
/// Unset entries fall back to the device type's built-in cadence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntervalOverrides {
    #[serde(default)]
    pub powermeter_ms: Option<u64>,
    #[serde(default)]
    pub solar_ms: Option<u64>,
    #[serde(default)]
    pub battery_ms: Option<u64>,
    #[serde(default)]
    pub inverter_ms: Option<u64>,
    #[serde(default)]
    pub load_ms: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("enerdash")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        let path = Self::path();
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Base URL after applying the fallback chain: CLI flag, config file,
    /// built-in default.
    pub fn resolve_base_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Poll period for a device: the override if set, the device type's
    /// cadence otherwise.
    pub fn poll_period(&self, kind: DeviceKind) -> Duration {
        let override_ms = match kind {
            DeviceKind::PowerMeter => self.intervals.powermeter_ms,
            DeviceKind::Solar => self.intervals.solar_ms,
            DeviceKind::Battery => self.intervals.battery_ms,
            DeviceKind::Inverter => self.intervals.inverter_ms,
            DeviceKind::Load | DeviceKind::LoadPhase(_) => self.intervals.load_ms,
        };
        override_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| kind.poll_interval())
    }
}
