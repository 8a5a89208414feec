//! Operating-mode enumerations for the inverter panel.
//!
//! Both enums travel over the wire as their exact variant names
//! (`"SelfUse"`, `"Charge"`, ...). `Display` renders the human-readable
//! labels used by the dashboard, which differ from the wire strings.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// How the inverter routes solar production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolarUseMode {
    /// Consume production locally, export the surplus.
    SelfUse,
    /// Reserve production for backup capacity.
    Backup,
    /// Operator-controlled; enables the battery use sub-mode.
    Manual,
}

impl SolarUseMode {
    /// All modes, in selection order.
    pub const ALL: [SolarUseMode; 3] = [
        SolarUseMode::SelfUse,
        SolarUseMode::Backup,
        SolarUseMode::Manual,
    ];

    /// The exact wire string for this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SolarUseMode::SelfUse => "SelfUse",
            SolarUseMode::Backup => "Backup",
            SolarUseMode::Manual => "Manual",
        }
    }
}

impl FromStr for SolarUseMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SelfUse" => Ok(SolarUseMode::SelfUse),
            "Backup" => Ok(SolarUseMode::Backup),
            "Manual" => Ok(SolarUseMode::Manual),
            other => Err(ParseError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for SolarUseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolarUseMode::SelfUse => write!(f, "Self use"),
            SolarUseMode::Backup => write!(f, "Backup"),
            SolarUseMode::Manual => write!(f, "Manual"),
        }
    }
}

/// Forced battery behavior, meaningful only under [`SolarUseMode::Manual`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatteryUseMode {
    /// Battery idle.
    Stop,
    /// Force charging.
    Charge,
    /// Force discharging.
    Discharge,
}

impl BatteryUseMode {
    /// All modes, in selection order.
    pub const ALL: [BatteryUseMode; 3] = [
        BatteryUseMode::Stop,
        BatteryUseMode::Charge,
        BatteryUseMode::Discharge,
    ];

    /// The exact wire string for this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BatteryUseMode::Stop => "Stop",
            BatteryUseMode::Charge => "Charge",
            BatteryUseMode::Discharge => "Discharge",
        }
    }
}

impl FromStr for BatteryUseMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Stop" => Ok(BatteryUseMode::Stop),
            "Charge" => Ok(BatteryUseMode::Charge),
            "Discharge" => Ok(BatteryUseMode::Discharge),
            other => Err(ParseError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for BatteryUseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatteryUseMode::Stop => write!(f, "Stop"),
            BatteryUseMode::Charge => write!(f, "Force charge"),
            BatteryUseMode::Discharge => write!(f, "Force discharge"),
        }
    }
}
