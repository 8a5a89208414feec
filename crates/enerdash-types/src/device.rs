//! Device identities: endpoints and polling cadences.

use core::fmt;
use std::time::Duration;

use crate::error::{ParseError, ParseResult};

/// One monitored device or sub-resource.
///
/// The load aggregate and its three phases are distinct kinds: the
/// aggregate carries the phase fields under dotted paths via `/api/load`,
/// while each phase is also independently pollable and editable through
/// its dedicated flat endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Grid smart meter.
    PowerMeter,
    /// Solar panel.
    Solar,
    /// Home battery.
    Battery,
    /// Inverter.
    Inverter,
    /// Three-phase load aggregate (nested phase fields).
    Load,
    /// A single load phase (1..=3), flat fields.
    LoadPhase(u8),
}

impl DeviceKind {
    /// The five top-level dashboard panels, in display order.
    pub const PANELS: [DeviceKind; 5] = [
        DeviceKind::PowerMeter,
        DeviceKind::Solar,
        DeviceKind::Battery,
        DeviceKind::Inverter,
        DeviceKind::Load,
    ];

    /// Kind for a single load phase.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::PhaseOutOfRange`] unless `phase` is 1..=3.
    pub fn load_phase(phase: u8) -> ParseResult<Self> {
        if (1..=3).contains(&phase) {
            Ok(DeviceKind::LoadPhase(phase))
        } else {
            Err(ParseError::PhaseOutOfRange(phase))
        }
    }

    /// REST endpoint path for this device, relative to the base URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        match self {
            DeviceKind::PowerMeter => "/api/powermeter".to_string(),
            DeviceKind::Solar => "/api/solar".to_string(),
            DeviceKind::Battery => "/api/battery".to_string(),
            DeviceKind::Inverter => "/api/inverter".to_string(),
            DeviceKind::Load => "/api/load".to_string(),
            DeviceKind::LoadPhase(n) => format!("/api/load/phase/{n}"),
        }
    }

    /// Polling cadence for this device type.
    ///
    /// Fast-moving electrical quantities refresh every second, the load
    /// every three seconds, and the slow solar state every thirty.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        match self {
            DeviceKind::PowerMeter | DeviceKind::Battery | DeviceKind::Inverter => {
                Duration::from_millis(1000)
            }
            DeviceKind::Load | DeviceKind::LoadPhase(_) => Duration::from_millis(3000),
            DeviceKind::Solar => Duration::from_millis(30000),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::PowerMeter => write!(f, "Smart Meter"),
            DeviceKind::Solar => write!(f, "Solar Panel"),
            DeviceKind::Battery => write!(f, "Battery"),
            DeviceKind::Inverter => write!(f, "Inverter"),
            DeviceKind::Load => write!(f, "Load"),
            DeviceKind::LoadPhase(n) => write!(f, "Load Phase {n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(DeviceKind::PowerMeter.endpoint(), "/api/powermeter");
        assert_eq!(DeviceKind::Solar.endpoint(), "/api/solar");
        assert_eq!(DeviceKind::Battery.endpoint(), "/api/battery");
        assert_eq!(DeviceKind::Inverter.endpoint(), "/api/inverter");
        assert_eq!(DeviceKind::Load.endpoint(), "/api/load");
        assert_eq!(DeviceKind::LoadPhase(2).endpoint(), "/api/load/phase/2");
    }

    #[test]
    fn test_poll_cadences() {
        assert_eq!(
            DeviceKind::PowerMeter.poll_interval(),
            Duration::from_millis(1000)
        );
        assert_eq!(
            DeviceKind::Battery.poll_interval(),
            Duration::from_millis(1000)
        );
        assert_eq!(
            DeviceKind::Inverter.poll_interval(),
            Duration::from_millis(1000)
        );
        assert_eq!(DeviceKind::Load.poll_interval(), Duration::from_millis(3000));
        assert_eq!(
            DeviceKind::LoadPhase(1).poll_interval(),
            Duration::from_millis(3000)
        );
        assert_eq!(
            DeviceKind::Solar.poll_interval(),
            Duration::from_millis(30000)
        );
    }

    #[test]
    fn test_load_phase_bounds() {
        assert_eq!(DeviceKind::load_phase(1), Ok(DeviceKind::LoadPhase(1)));
        assert_eq!(DeviceKind::load_phase(3), Ok(DeviceKind::LoadPhase(3)));
        assert_eq!(
            DeviceKind::load_phase(0),
            Err(ParseError::PhaseOutOfRange(0))
        );
        assert_eq!(
            DeviceKind::load_phase(4),
            Err(ParseError::PhaseOutOfRange(4))
        );
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(DeviceKind::PowerMeter.to_string(), "Smart Meter");
        assert_eq!(DeviceKind::LoadPhase(3).to_string(), "Load Phase 3");
    }
}
