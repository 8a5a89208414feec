//! Shared types for the enerdash home energy dashboard.
//!
//! This crate holds the data model common to the synchronization core and
//! every renderer: device identities with their endpoints and polling
//! cadences, field values in the backend's wire conventions, per-device
//! state maps, and the inverter mode enumerations.
//!
//! # Example
//!
//! ```
//! use enerdash_types::{DeviceKind, DeviceState, FieldValue};
//!
//! let mut state = DeviceState::new();
//! state.set("voltage", FieldValue::Number(230.0));
//! assert_eq!(state.number("voltage"), Some(230.0));
//! assert_eq!(DeviceKind::PowerMeter.endpoint(), "/api/powermeter");
//! ```

pub mod device;
pub mod error;
pub mod modes;
pub mod value;

pub use device::DeviceKind;
pub use error::{ParseError, ParseResult};
pub use modes::{BatteryUseMode, SolarUseMode};
pub use value::{flatten_fields, nest_fields, DeviceState, FieldValue};
