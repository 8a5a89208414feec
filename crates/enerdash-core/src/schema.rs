//! Declarative field schemas for each device panel.
//!
//! Every panel is described by a static table of [`FieldSpec`] entries:
//! the field's kind, unit label, mutability, and (for dependent fields)
//! the enum value that makes it visible. The renderer and the edit
//! dispatcher both consult these tables; neither carries per-field logic,
//! so adding a field or a device type means adding a table entry.

use thiserror::Error;

use enerdash_types::{DeviceKind, DeviceState, FieldValue};

use crate::dispatch::EditIntent;

/// What kind of value a field holds and how it is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Numeric scalar edited as raw text.
    Scalar,
    /// Boolean switch (0/1 on the wire).
    Flag,
    /// String enumeration with a fixed value set.
    Enum(&'static [&'static str]),
    /// Paired min/max bounds edited as one atomic unit. The entry's own
    /// `path` names the pair; `min` and `max` name the two real fields.
    Range {
        min: &'static str,
        max: &'static str,
    },
}

/// One field of a device panel.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field path; dotted one level for load aggregate phase fields.
    pub path: &'static str,
    /// Value kind and edit behavior.
    pub kind: FieldKind,
    /// Unit label for display ("" when unitless).
    pub unit: &'static str,
    /// Whether the operator may edit this field.
    pub editable: bool,
    /// `(governing_field, trigger_value)`: the field only exists in the
    /// UI while the governing enum currently equals the trigger value.
    pub visible_when: Option<(&'static str, &'static str)>,
}

impl FieldSpec {
    const fn scalar(path: &'static str, unit: &'static str, editable: bool) -> Self {
        Self {
            path,
            kind: FieldKind::Scalar,
            unit,
            editable,
            visible_when: None,
        }
    }

    const fn flag(path: &'static str) -> Self {
        Self {
            path,
            kind: FieldKind::Flag,
            unit: "",
            editable: true,
            visible_when: None,
        }
    }

    const fn range(
        path: &'static str,
        min: &'static str,
        max: &'static str,
        unit: &'static str,
    ) -> Self {
        Self {
            path,
            kind: FieldKind::Range { min, max },
            unit,
            editable: true,
            visible_when: None,
        }
    }
}

/// Field table for one device kind.
#[derive(Debug)]
pub struct DeviceSchema {
    pub fields: &'static [FieldSpec],
}

/// Wire strings of [`enerdash_types::SolarUseMode`].
pub const SOLAR_USE_MODES: &[&str] = &["SelfUse", "Backup", "Manual"];
/// Wire strings of [`enerdash_types::BatteryUseMode`].
pub const BATTERY_USE_MODES: &[&str] = &["Stop", "Charge", "Discharge"];

static POWERMETER: DeviceSchema = DeviceSchema {
    fields: &[
        FieldSpec::scalar("voltage", "V", false),
        FieldSpec::scalar("current_limit", "A", true),
        FieldSpec::scalar("current", "A", false),
        FieldSpec::scalar("power", "W", false),
        FieldSpec::scalar("injected_power", "W", true),
        FieldSpec::range("load_limit", "load_limit_min", "load_limit_max", "%"),
    ],
};

static SOLAR: DeviceSchema = DeviceSchema {
    fields: &[
        FieldSpec::scalar("latitude", "°", false),
        FieldSpec::scalar("longitude", "°", false),
        FieldSpec::scalar("temperature", "°C", true),
        FieldSpec::scalar("solar_power", "W", true),
        FieldSpec::flag("manual_mode"),
    ],
};

static BATTERY: DeviceSchema = DeviceSchema {
    fields: &[
        FieldSpec::scalar("capacity", "Wh", false),
        FieldSpec::scalar("voltage", "V", true),
        FieldSpec::scalar("current", "A", true),
        FieldSpec::scalar("power", "W", true),
        FieldSpec::scalar("state_of_charge", "%", true),
        FieldSpec::flag("manual_mode"),
    ],
};

static INVERTER: DeviceSchema = DeviceSchema {
    fields: &[
        FieldSpec::scalar("power", "W", false),
        FieldSpec {
            path: "solar_use_mode",
            kind: FieldKind::Enum(SOLAR_USE_MODES),
            unit: "",
            editable: true,
            visible_when: None,
        },
        FieldSpec {
            path: "battery_use_mode",
            kind: FieldKind::Enum(BATTERY_USE_MODES),
            unit: "",
            editable: true,
            visible_when: Some(("solar_use_mode", "Manual")),
        },
        FieldSpec::flag("manual_mode"),
    ],
};

static LOAD: DeviceSchema = DeviceSchema {
    fields: &[
        FieldSpec::scalar("total_power", "W", false),
        FieldSpec::scalar("current_limit", "A", true),
        FieldSpec::scalar("phase1.voltage", "V", true),
        FieldSpec::scalar("phase1.current", "A", false),
        FieldSpec::scalar("phase1.power", "W", false),
        FieldSpec::range(
            "phase1.load_limit",
            "phase1.load_limit_min",
            "phase1.load_limit_max",
            "%",
        ),
        FieldSpec::scalar("phase2.voltage", "V", true),
        FieldSpec::scalar("phase2.current", "A", false),
        FieldSpec::scalar("phase2.power", "W", false),
        FieldSpec::range(
            "phase2.load_limit",
            "phase2.load_limit_min",
            "phase2.load_limit_max",
            "%",
        ),
        FieldSpec::scalar("phase3.voltage", "V", true),
        FieldSpec::scalar("phase3.current", "A", false),
        FieldSpec::scalar("phase3.power", "W", false),
        FieldSpec::range(
            "phase3.load_limit",
            "phase3.load_limit_min",
            "phase3.load_limit_max",
            "%",
        ),
    ],
};

static LOAD_PHASE: DeviceSchema = DeviceSchema {
    fields: &[
        FieldSpec::scalar("voltage", "V", true),
        FieldSpec::scalar("current", "A", false),
        FieldSpec::scalar("power", "W", false),
        FieldSpec::range("load_limit", "load_limit_min", "load_limit_max", "%"),
    ],
};

/// Schema table for a device kind. All three load phases share one table.
#[must_use]
pub fn schema_for(kind: DeviceKind) -> &'static DeviceSchema {
    match kind {
        DeviceKind::PowerMeter => &POWERMETER,
        DeviceKind::Solar => &SOLAR,
        DeviceKind::Battery => &BATTERY,
        DeviceKind::Inverter => &INVERTER,
        DeviceKind::Load => &LOAD,
        DeviceKind::LoadPhase(_) => &LOAD_PHASE,
    }
}

/// Why an edit intent was rejected before touching the store.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field is read-only: {0}")]
    ReadOnly(String),

    #[error("field is hidden under the current mode: {0}")]
    FieldHidden(String),

    #[error("not a number: {0:?}")]
    NotANumber(String),

    #[error("unknown value {value:?} for {field}")]
    UnknownMode { field: String, value: String },

    #[error("range inverted: min {min} > max {max}")]
    RangeInverted { min: f64, max: f64 },

    #[error("{field} expects a {expected} edit")]
    WrongKind {
        field: String,
        expected: &'static str,
    },
}

impl DeviceSchema {
    /// Look up a field spec by path (range specs by their pair path).
    pub fn field(&self, path: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.path == path)
    }

    /// Whether a leaf field is a flag (used to coerce polled 0/1 numbers).
    pub fn is_flag(&self, path: &str) -> bool {
        self.field(path)
            .is_some_and(|spec| matches!(spec.kind, FieldKind::Flag))
    }

    /// Whether a field is currently visible given the device state.
    ///
    /// A dependent field hides while its governing enum holds any other
    /// value; its stored value is preserved regardless.
    pub fn is_visible(&self, spec: &FieldSpec, state: &DeviceState) -> bool {
        match spec.visible_when {
            Some((governing, trigger)) => state.mode(governing) == Some(trigger),
            None => true,
        }
    }

    /// Iterate the fields currently visible for the given state.
    pub fn visible_fields<'a>(
        &'a self,
        state: &'a DeviceState,
    ) -> impl Iterator<Item = &'static FieldSpec> + 'a {
        self.fields
            .iter()
            .filter(move |spec| self.is_visible(spec, state))
    }

    /// Validate an edit intent into concrete field writes.
    ///
    /// Rejects unknown, read-only, and currently-hidden fields, raw text
    /// that is not a finite number, mode values outside the enum's set,
    /// and inverted range pairs. Nothing is written anywhere on rejection.
    pub fn validate(
        &self,
        intent: &EditIntent,
        state: &DeviceState,
    ) -> Result<Vec<(String, FieldValue)>, ValidationError> {
        let spec = self.editable_spec(intent.field(), state)?;
        match (intent, spec.kind) {
            (EditIntent::Scalar { field, raw }, FieldKind::Scalar) => {
                let value = FieldValue::parse_number(raw)
                    .map_err(|_| ValidationError::NotANumber(raw.clone()))?;
                Ok(vec![(field.clone(), value)])
            }
            (EditIntent::Mode { field, value }, FieldKind::Enum(allowed)) => {
                if !allowed.contains(&value.as_str()) {
                    return Err(ValidationError::UnknownMode {
                        field: field.clone(),
                        value: value.clone(),
                    });
                }
                Ok(vec![(field.clone(), FieldValue::Mode(value.clone()))])
            }
            (EditIntent::Flag { field, enabled }, FieldKind::Flag) => {
                Ok(vec![(field.clone(), FieldValue::Flag(*enabled))])
            }
            (EditIntent::Range { min, max, .. }, FieldKind::Range { min: lo, max: hi }) => {
                if !(*min <= *max) {
                    return Err(ValidationError::RangeInverted {
                        min: *min,
                        max: *max,
                    });
                }
                Ok(vec![
                    (lo.to_string(), FieldValue::Number(*min)),
                    (hi.to_string(), FieldValue::Number(*max)),
                ])
            }
            (_, kind) => Err(ValidationError::WrongKind {
                field: intent.field().to_string(),
                expected: match kind {
                    FieldKind::Scalar => "scalar",
                    FieldKind::Flag => "flag",
                    FieldKind::Enum(_) => "mode",
                    FieldKind::Range { .. } => "range",
                },
            }),
        }
    }

    fn editable_spec(
        &self,
        path: &str,
        state: &DeviceState,
    ) -> Result<&'static FieldSpec, ValidationError> {
        let spec = self
            .field(path)
            .ok_or_else(|| ValidationError::UnknownField(path.to_string()))?;
        if !spec.editable {
            return Err(ValidationError::ReadOnly(path.to_string()));
        }
        if !self.is_visible(spec, state) {
            return Err(ValidationError::FieldHidden(path.to_string()));
        }
        Ok(spec)
    }
}
