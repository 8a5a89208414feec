//! Field values and per-device state maps.
//!
//! The backend reports every device as a flat JSON object of numbers,
//! mode strings, and 0/1 flags. The load aggregate nests its three phases
//! one level deep; those fields are addressed here with dotted paths
//! (`phase1.voltage`) so the rest of the crate can treat every device as
//! a flat map.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};
use time::OffsetDateTime;

use crate::error::ParseError;

/// A single telemetry or setpoint value.
///
/// Mirrors the backend's wire types: numbers stay numbers, enumerations
/// travel as strings, and boolean switches travel as the integers 0/1
/// (the backend's convention for `manual_mode` fields).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Numeric scalar (readings, limits, setpoints).
    Number(f64),
    /// Enumeration value transmitted as a string (`"SelfUse"`, `"Stop"`, ...).
    Mode(String),
    /// Boolean switch, transmitted as 0/1.
    Flag(bool),
}

impl FieldValue {
    /// Parse raw user input (prompt text) into a numeric value.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NotANumber`] when the input is not a finite
    /// number.
    pub fn parse_number(raw: &str) -> Result<Self, ParseError> {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(FieldValue::Number(n)),
            _ => Err(ParseError::NotANumber(raw.to_string())),
        }
    }

    /// Convert a JSON scalar into a field value.
    ///
    /// Numbers map to [`FieldValue::Number`], strings to
    /// [`FieldValue::Mode`], booleans to [`FieldValue::Flag`]. Nulls,
    /// arrays, and objects have no field representation and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Mode(s.clone())),
            Value::Bool(b) => Some(FieldValue::Flag(*b)),
            _ => None,
        }
    }

    /// Encode for the wire. Flags become the integers 0/1.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Number(n) => Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Mode(s) => Value::String(s.clone()),
            FieldValue::Flag(b) => Value::Number(Number::from(u8::from(*b))),
        }
    }

    /// Reinterpret a 0/1 number as a flag. Non-numeric values and real
    /// flags pass through unchanged.
    #[must_use]
    pub fn coerce_flag(self) -> Self {
        match self {
            FieldValue::Number(n) => FieldValue::Flag(n != 0.0),
            other => other,
        }
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Mode-string view of the value, if it is a mode.
    pub fn as_mode(&self) -> Option<&str> {
        match self {
            FieldValue::Mode(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view of the value, if it is a flag.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Mode(s) => write!(f, "{s}"),
            FieldValue::Flag(true) => write!(f, "on"),
            FieldValue::Flag(false) => write!(f, "off"),
        }
    }
}

/// Last-known state of one device (or one load phase).
///
/// A flat map from field path to value, stamped with the time of the most
/// recent successful poll. Field paths are dotted one level for the load
/// aggregate's nested phases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    fields: BTreeMap<String, FieldValue>,
    /// When the state was last refreshed from the backend.
    pub last_poll_at: Option<OffsetDateTime>,
}

impl DeviceState {
    /// Create an empty state (panel just mounted, nothing polled yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field by path.
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.fields.get(path)
    }

    /// Numeric value of a field, if present and numeric.
    pub fn number(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(FieldValue::as_number)
    }

    /// Mode string of a field, if present and a mode.
    pub fn mode(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(FieldValue::as_mode)
    }

    /// Flag value of a field, if present and a flag.
    pub fn flag(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(FieldValue::as_flag)
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, path: impl Into<String>, value: FieldValue) {
        self.fields.insert(path.into(), value);
    }

    /// Iterate over all fields in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of known fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when nothing has been polled or edited yet.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Flatten a polled JSON object into field paths.
///
/// Scalars stay under their own name; one level of nesting (the load
/// aggregate's `phase1`..`phase3` objects) is folded into dotted paths.
/// Values with no field representation are skipped.
pub fn flatten_fields(object: &Map<String, Value>) -> Vec<(String, FieldValue)> {
    let mut fields = Vec::with_capacity(object.len());
    for (key, value) in object {
        match value {
            Value::Object(nested) => {
                for (sub, sub_value) in nested {
                    if let Some(v) = FieldValue::from_json(sub_value) {
                        fields.push((format!("{key}.{sub}"), v));
                    }
                }
            }
            _ => {
                if let Some(v) = FieldValue::from_json(value) {
                    fields.push((key.clone(), v));
                }
            }
        }
    }
    fields
}

/// Build a partial-update JSON body from edited fields.
///
/// The inverse of [`flatten_fields`]: dotted paths are re-nested so a
/// phase edit posts as `{"phase1": {"load_limit_min": 20.0, ...}}` while
/// flat fields post as `{"current_limit": 15.0}`.
pub fn nest_fields(edits: &[(String, FieldValue)]) -> Value {
    let mut body = Map::new();
    for (path, value) in edits {
        match path.split_once('.') {
            Some((group, field)) => {
                let entry = body
                    .entry(group.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(nested) = entry {
                    nested.insert(field.to_string(), value.to_json());
                }
            }
            None => {
                body.insert(path.clone(), value.to_json());
            }
        }
    }
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number_accepts_decimal() {
        assert_eq!(
            FieldValue::parse_number(" 15.5 "),
            Ok(FieldValue::Number(15.5))
        );
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert!(matches!(
            FieldValue::parse_number("fifteen"),
            Err(ParseError::NotANumber(_))
        ));
        assert!(matches!(
            FieldValue::parse_number(""),
            Err(ParseError::NotANumber(_))
        ));
        assert!(matches!(
            FieldValue::parse_number("NaN"),
            Err(ParseError::NotANumber(_))
        ));
        assert!(matches!(
            FieldValue::parse_number("inf"),
            Err(ParseError::NotANumber(_))
        ));
    }

    #[test]
    fn test_flag_round_trips_as_integer() {
        assert_eq!(FieldValue::Flag(true).to_json(), json!(1));
        assert_eq!(FieldValue::Flag(false).to_json(), json!(0));
        assert_eq!(
            FieldValue::from_json(&json!(1)).map(FieldValue::coerce_flag),
            Some(FieldValue::Flag(true))
        );
        assert_eq!(
            FieldValue::from_json(&json!(0)).map(FieldValue::coerce_flag),
            Some(FieldValue::Flag(false))
        );
    }

    #[test]
    fn test_coerce_flag_leaves_modes_alone() {
        let mode = FieldValue::Mode("Manual".to_string());
        assert_eq!(mode.clone().coerce_flag(), mode);
    }

    #[test]
    fn test_from_json_skips_compound_values() {
        assert_eq!(FieldValue::from_json(&json!(null)), None);
        assert_eq!(FieldValue::from_json(&json!([1, 2])), None);
        assert_eq!(FieldValue::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn test_flatten_flat_object() {
        let object = json!({"voltage": 230.0, "solar_use_mode": "Backup"});
        let fields = flatten_fields(object.as_object().unwrap());
        assert_eq!(fields.len(), 2);
        assert!(fields.contains(&("voltage".to_string(), FieldValue::Number(230.0))));
        assert!(fields.contains(&(
            "solar_use_mode".to_string(),
            FieldValue::Mode("Backup".to_string())
        )));
    }

    #[test]
    fn test_flatten_nested_phases() {
        let object = json!({
            "total_power": 1200.0,
            "phase1": {"voltage": 231.0, "current": 5.2},
        });
        let fields = flatten_fields(object.as_object().unwrap());
        assert!(fields.contains(&("total_power".to_string(), FieldValue::Number(1200.0))));
        assert!(fields.contains(&("phase1.voltage".to_string(), FieldValue::Number(231.0))));
        assert!(fields.contains(&("phase1.current".to_string(), FieldValue::Number(5.2))));
    }

    #[test]
    fn test_nest_flat_edit() {
        let edits = vec![("current_limit".to_string(), FieldValue::Number(15.0))];
        assert_eq!(nest_fields(&edits), json!({"current_limit": 15.0}));
    }

    #[test]
    fn test_nest_phase_pair_edit() {
        let edits = vec![
            ("phase1.load_limit_min".to_string(), FieldValue::Number(20.0)),
            ("phase1.load_limit_max".to_string(), FieldValue::Number(80.0)),
        ];
        assert_eq!(
            nest_fields(&edits),
            json!({"phase1": {"load_limit_min": 20.0, "load_limit_max": 80.0}})
        );
    }

    #[test]
    fn test_nest_flag_edit_uses_integer() {
        let edits = vec![("manual_mode".to_string(), FieldValue::Flag(true))];
        assert_eq!(nest_fields(&edits), json!({"manual_mode": 1}));
    }

    #[test]
    fn test_device_state_accessors() {
        let mut state = DeviceState::new();
        assert!(state.is_empty());
        state.set("voltage", FieldValue::Number(230.0));
        state.set("manual_mode", FieldValue::Flag(true));
        state.set("solar_use_mode", FieldValue::Mode("Manual".to_string()));

        assert_eq!(state.number("voltage"), Some(230.0));
        assert_eq!(state.flag("manual_mode"), Some(true));
        assert_eq!(state.mode("solar_use_mode"), Some("Manual"));
        assert_eq!(state.number("solar_use_mode"), None);
        assert_eq!(state.get("missing"), None);
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn test_flatten_nest_round_trip() {
        let object = json!({
            "current_limit": 16.0,
            "phase2": {"load_limit_min": 10.0, "load_limit_max": 90.0},
        });
        let fields = flatten_fields(object.as_object().unwrap());
        assert_eq!(nest_fields(&fields), object);
    }
}
