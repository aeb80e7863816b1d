//! Per-field converters from raw JSON to typed values.
//!
//! Every converter is a plain function `Value -> Result<T, ConversionError>`
//! so that entities can list them next to their fields.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde_json::Value;

use crate::converter::EntityConverter;
use crate::entity::Entity;
use crate::error::{ConversionError, json_kind};
use crate::maybe::Maybe;

/// An enum carried on the wire as one of a fixed set of strings.
pub trait WireEnum: Copy + Sized + 'static {
    /// Type name, used in error messages.
    const NAME: &'static str;

    /// Every variant, in declaration order.
    const VARIANTS: &'static [Self];

    /// Wire value of this variant.
    fn as_str(self) -> &'static str;

    /// Look up the variant whose wire value is `value`.
    fn from_wire(value: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|variant| variant.as_str() == value)
    }

    /// Accepted wire values.
    fn choices() -> Vec<&'static str> {
        Self::VARIANTS.iter().map(|variant| variant.as_str()).collect()
    }
}

/// A JSON string.
pub fn string(value: Value) -> Result<String, ConversionError> {
    match value {
        Value::String(value) => Ok(value),
        other => Err(ConversionError::invalid_value("string", &other)),
    }
}

/// A JSON integer.
pub fn integer(value: Value) -> Result<i64, ConversionError> {
    value
        .as_i64()
        .ok_or_else(|| ConversionError::invalid_value("integer", &value))
}

/// A JSON boolean.
pub fn boolean(value: Value) -> Result<bool, ConversionError> {
    value
        .as_bool()
        .ok_or_else(|| ConversionError::invalid_value("boolean", &value))
}

/// An ISO-8601 date-time string.
///
/// Values without an offset are taken as UTC.
pub fn datetime(value: Value) -> Result<DateTime<Utc>, ConversionError> {
    match value {
        Value::String(raw) => parse_datetime(&raw),
        other => Err(ConversionError::invalid_value("ISO-8601 string", &other)),
    }
}

/// Parse an ISO-8601 date-time, with or without an offset.
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, ConversionError> {
    if let Ok(parsed) = raw.parse::<DateTime<FixedOffset>>() {
        return Ok(parsed.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|err| ConversionError::InvalidDateTime {
            value: raw.to_string(),
            message: err.to_string(),
        })
}

/// A string naming a variant of `E`.
pub fn enumeration<E: WireEnum>(value: Value) -> Result<E, ConversionError> {
    let raw = match value {
        Value::String(raw) => raw,
        other => {
            return Err(ConversionError::InvalidEnumValue {
                value: other.to_string(),
                enum_name: E::NAME,
                choices: E::choices(),
            });
        }
    };
    E::from_wire(&raw).ok_or_else(|| ConversionError::InvalidEnumValue {
        value: raw,
        enum_name: E::NAME,
        choices: E::choices(),
    })
}

/// A nested object decoded as entity `E`.
pub fn entity<E: Entity + 'static>(value: Value) -> Result<E, ConversionError> {
    let kind = json_kind(&value);
    match EntityConverter::<E>::single().convert_value(value)? {
        Maybe::Value(entity) => Ok(entity),
        Maybe::Null | Maybe::Omitted => Err(ConversionError::InvalidValue {
            expected: "object",
            found: kind.to_string(),
        }),
    }
}

/// Adapt `convert` so that `null` becomes `None`.
pub fn optional<T, F>(convert: F) -> impl Fn(Value) -> Result<Option<T>, ConversionError>
where
    F: Fn(Value) -> Result<T, ConversionError>,
{
    move |value| match value {
        Value::Null => Ok(None),
        other => convert(other).map(Some),
    }
}

/// Apply `convert` to every element of a JSON array.
pub fn list<T, F>(convert: F) -> impl Fn(Value) -> Result<Vec<T>, ConversionError>
where
    F: Fn(Value) -> Result<T, ConversionError>,
{
    move |value| match value {
        Value::Array(items) => items.into_iter().map(&convert).collect(),
        other => Err(ConversionError::invalid_value("array", &other)),
    }
}
