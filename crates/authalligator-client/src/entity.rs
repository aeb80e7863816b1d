//! The base contract shared by every response entity.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::casing::{KeyCase, to_snake_case};
use crate::converter::{Incoming, Resolve, TYPENAME_KEY, take_typename};
use crate::error::ConversionError;
use crate::maybe::Maybe;

/// An immutable record decoded from a GraphQL response object.
///
/// Implementors declare their fields once in [`Entity::FIELDS`] and build
/// themselves in [`Entity::from_fields`] by pulling each field through its
/// converter, in declaration order. The provided methods handle the
/// discriminator check, key casing and serialization.
pub trait Entity: Sized {
    /// Rust type name, used in error messages.
    const NAME: &'static str;

    /// GraphQL type name matched against `__typename`.
    ///
    /// Empty for entities that never take part in a union.
    const TYPENAME: &'static str;

    /// Declared field names, in snake_case.
    const FIELDS: &'static [&'static str];

    /// Build the entity from its converted field set.
    fn from_fields(fields: &mut Fields) -> Result<Self, ConversionError>;

    /// Write every field into `out`.
    fn write_fields(&self, out: &mut FieldWriter);

    /// Build the entity from a raw response object.
    ///
    /// A `__typename` key, if present and non-empty, must equal
    /// [`Entity::TYPENAME`]. Remaining keys are converted to snake_case and
    /// must all be declared in [`Entity::FIELDS`].
    fn from_api_response(mut data: Map<String, Value>) -> Result<Self, ConversionError> {
        if let Some(found) = take_typename(&mut data)? {
            if !found.is_empty() && found != Self::TYPENAME {
                return Err(ConversionError::TypeMismatch {
                    found,
                    expected: Self::TYPENAME,
                    entity: Self::NAME,
                });
            }
        }
        let mut fields = Fields::new(Self::NAME, Self::FIELDS, data)?;
        Self::from_fields(&mut fields)
    }

    /// Serialize into a JSON object using `case` for keys.
    ///
    /// Camel-cased output includes the `__typename` discriminator so that it
    /// can be fed back through [`Entity::from_api_response`] or a union
    /// converter. Override to customize how the entity is rendered, nested
    /// occurrences included.
    fn to_json_map(&self, case: KeyCase) -> Map<String, Value> {
        let mut out = FieldWriter::new(case);
        if case == KeyCase::Camel && !Self::TYPENAME.is_empty() {
            out.map.insert(
                TYPENAME_KEY.to_string(),
                Value::String(Self::TYPENAME.to_string()),
            );
        }
        self.write_fields(&mut out);
        out.finish()
    }

    /// JSON-compatible mapping with snake_case keys.
    fn as_dict(&self) -> Map<String, Value> {
        self.to_json_map(KeyCase::Snake)
    }

    /// JSON-compatible mapping in the service's wire format.
    fn to_wire_format(&self) -> Map<String, Value> {
        self.to_json_map(KeyCase::Camel)
    }
}

/// The remaining fields of a response object during entity construction.
#[derive(Debug)]
pub struct Fields {
    entity: &'static str,
    values: Map<String, Value>,
}

impl Fields {
    pub(crate) fn new(
        entity: &'static str,
        declared: &[&str],
        data: Map<String, Value>,
    ) -> Result<Self, ConversionError> {
        let mut values = Map::new();
        for (key, value) in data {
            let field = to_snake_case(&key);
            if !declared.contains(&field.as_str()) {
                return Err(ConversionError::UnknownField { entity, field });
            }
            values.insert(field, value);
        }
        Ok(Self { entity, values })
    }

    /// Take a field that must be present.
    pub fn required<T, F>(&mut self, field: &'static str, convert: F) -> Result<T, ConversionError>
    where
        F: FnOnce(Value) -> Result<T, ConversionError>,
    {
        let entity = self.entity;
        let value = self
            .values
            .remove(field)
            .ok_or(ConversionError::MissingField { entity, field })?;
        convert(value).map_err(|source| context(entity, field, source))
    }

    /// Take a field that may be omitted or `null`.
    pub fn maybe<T, F>(&mut self, field: &'static str, convert: F) -> Result<Maybe<T>, ConversionError>
    where
        F: FnOnce(Value) -> Result<T, ConversionError>,
    {
        let entity = self.entity;
        match self.values.remove(field) {
            None => Ok(Maybe::Omitted),
            Some(Value::Null) => Ok(Maybe::Null),
            Some(value) => convert(value)
                .map(Maybe::Value)
                .map_err(|source| context(entity, field, source)),
        }
    }

    /// Take a union-typed field that may be omitted or `null`.
    pub fn union<U: Resolve>(&mut self, field: &'static str) -> Result<Maybe<U>, ConversionError> {
        let entity = self.entity;
        let incoming = self
            .values
            .remove(field)
            .map_or(Incoming::Omitted, Incoming::Json);
        U::CONVERTER
            .convert(incoming)
            .map_err(|source| context(entity, field, source))
    }
}

fn context(entity: &'static str, field: &'static str, source: ConversionError) -> ConversionError {
    ConversionError::Field {
        entity,
        field,
        source: Box::new(source),
    }
}

/// Collects an entity's fields into a JSON object.
#[derive(Debug)]
pub struct FieldWriter {
    case: KeyCase,
    map: Map<String, Value>,
}

impl FieldWriter {
    fn new(case: KeyCase) -> Self {
        Self {
            case,
            map: Map::new(),
        }
    }

    /// Key convention in use.
    #[must_use]
    pub const fn case(&self) -> KeyCase {
        self.case
    }

    /// Write a plain field.
    pub fn field<T: ToJson + ?Sized>(&mut self, name: &str, value: &T) {
        let value = value.to_json(self.case);
        self.map.insert(self.case.apply(name), value);
    }

    /// Write a field that may be omitted; omitted fields are skipped.
    pub fn maybe<T: ToJson>(&mut self, name: &str, value: &Maybe<T>) {
        match value {
            Maybe::Omitted => {}
            Maybe::Null => {
                self.map.insert(self.case.apply(name), Value::Null);
            }
            Maybe::Value(value) => self.field(name, value),
        }
    }

    /// Write a nested entity.
    pub fn entity<E: Entity>(&mut self, name: &str, value: &E) {
        let nested = value.to_json_map(self.case);
        self.map.insert(self.case.apply(name), Value::Object(nested));
    }

    fn finish(self) -> Map<String, Value> {
        self.map
    }
}

/// Conversion of a field value back to JSON.
pub trait ToJson {
    /// Render as JSON; `case` applies to nested entities.
    fn to_json(&self, case: KeyCase) -> Value;
}

impl ToJson for str {
    fn to_json(&self, _case: KeyCase) -> Value {
        Value::String(self.to_string())
    }
}

impl ToJson for String {
    fn to_json(&self, _case: KeyCase) -> Value {
        Value::String(self.clone())
    }
}

impl ToJson for i64 {
    fn to_json(&self, _case: KeyCase) -> Value {
        Value::from(*self)
    }
}

impl ToJson for bool {
    fn to_json(&self, _case: KeyCase) -> Value {
        Value::Bool(*self)
    }
}

impl ToJson for Value {
    fn to_json(&self, _case: KeyCase) -> Value {
        self.clone()
    }
}

impl ToJson for DateTime<Utc> {
    fn to_json(&self, _case: KeyCase) -> Value {
        Value::String(self.to_rfc3339())
    }
}

impl<T: ToJson> ToJson for Option<T> {
    fn to_json(&self, case: KeyCase) -> Value {
        self.as_ref().map_or(Value::Null, |value| value.to_json(case))
    }
}

impl<T: ToJson> ToJson for Vec<T> {
    fn to_json(&self, case: KeyCase) -> Value {
        Value::Array(self.iter().map(|value| value.to_json(case)).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::convert;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Sample {
        snake_case_field: String,
        happened_at: Option<DateTime<Utc>>,
        tags: Vec<String>,
        note: Maybe<String>,
    }

    impl Entity for Sample {
        const NAME: &'static str = "Sample";
        const TYPENAME: &'static str = "Sample";
        const FIELDS: &'static [&'static str] =
            &["snake_case_field", "happened_at", "tags", "note"];

        fn from_fields(fields: &mut Fields) -> Result<Self, ConversionError> {
            Ok(Self {
                snake_case_field: fields.required("snake_case_field", convert::string)?,
                happened_at: fields.required("happened_at", convert::optional(convert::datetime))?,
                tags: fields.required("tags", convert::list(convert::string))?,
                note: fields.maybe("note", convert::string)?,
            })
        }

        fn write_fields(&self, out: &mut FieldWriter) {
            out.field("snake_case_field", &self.snake_case_field);
            out.field("happened_at", &self.happened_at);
            out.field("tags", &self.tags);
            out.maybe("note", &self.note);
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Redacted {
        secret: String,
    }

    impl Entity for Redacted {
        const NAME: &'static str = "Redacted";
        const TYPENAME: &'static str = "";
        const FIELDS: &'static [&'static str] = &["secret"];

        fn from_fields(fields: &mut Fields) -> Result<Self, ConversionError> {
            Ok(Self {
                secret: fields.required("secret", convert::string)?,
            })
        }

        fn write_fields(&self, out: &mut FieldWriter) {
            out.field("secret", &self.secret);
        }

        fn to_json_map(&self, _case: KeyCase) -> Map<String, Value> {
            let mut map = Map::new();
            map.insert("secret".into(), Value::String("***".into()));
            map
        }
    }

    #[derive(Debug)]
    struct Holder {
        inner: Redacted,
    }

    impl Entity for Holder {
        const NAME: &'static str = "Holder";
        const TYPENAME: &'static str = "";
        const FIELDS: &'static [&'static str] = &["inner"];

        fn from_fields(fields: &mut Fields) -> Result<Self, ConversionError> {
            Ok(Self {
                inner: fields.required("inner", convert::entity)?,
            })
        }

        fn write_fields(&self, out: &mut FieldWriter) {
            out.entity("inner", &self.inner);
        }
    }

    fn sample() -> Sample {
        Sample {
            snake_case_field: "data".into(),
            happened_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap()),
            tags: vec!["a".into(), "b".into()],
            note: Maybe::Null,
        }
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn from_api_response_converts_camel_case_keys() {
        let entity = Sample::from_api_response(object(json!({
            "snakeCaseField": "data",
            "happenedAt": "2024-01-01T12:30:00",
            "tags": ["a", "b"],
            "note": null,
        })))
        .expect("converts");
        assert_eq!(entity, sample());
    }

    #[test]
    fn omitted_and_null_stay_distinct() {
        let entity = Sample::from_api_response(object(json!({
            "snakeCaseField": "data",
            "happenedAt": null,
            "tags": [],
        })))
        .expect("converts");
        assert_eq!(entity.note, Maybe::Omitted);
        assert_eq!(entity.happened_at, None);
    }

    #[test]
    fn missing_required_field() {
        let err = Sample::from_api_response(object(json!({"happenedAt": null, "tags": []})))
            .expect_err("missing");
        assert_eq!(
            err,
            ConversionError::MissingField {
                entity: "Sample",
                field: "snake_case_field",
            }
        );
    }

    #[test]
    fn first_malformed_field_in_declaration_order_is_reported() {
        let err = Sample::from_api_response(object(json!({
            "snakeCaseField": 1,
            "happenedAt": "not a date",
            "tags": [],
        })))
        .expect_err("malformed");
        assert_eq!(err.field_path(), vec!["snake_case_field"]);
    }

    #[test]
    fn list_errors_carry_field_context() {
        let err = Sample::from_api_response(object(json!({
            "snakeCaseField": "x",
            "happenedAt": null,
            "tags": ["ok", 2],
        })))
        .expect_err("malformed");
        assert_eq!(err.field_path(), vec!["tags"]);
        assert!(matches!(
            err.root_cause(),
            ConversionError::InvalidValue { expected: "string", .. }
        ));
    }

    #[test]
    fn empty_discriminator_counts_as_absent() {
        let entity = Sample::from_api_response(object(json!({
            "__typename": "",
            "snakeCaseField": "data",
            "happenedAt": "2024-01-01T12:30:00Z",
            "tags": ["a", "b"],
            "note": null,
        })))
        .expect("converts");
        assert_eq!(entity, sample());
    }

    #[test]
    fn as_dict_uses_snake_case_and_skips_omitted() {
        let mut entity = sample();
        entity.note = Maybe::Omitted;
        assert_eq!(
            Value::Object(entity.as_dict()),
            json!({
                "snake_case_field": "data",
                "happened_at": "2024-01-01T12:30:00+00:00",
                "tags": ["a", "b"],
            })
        );
    }

    #[test]
    fn wire_format_round_trips() {
        let entity = sample();
        let wire = entity.to_wire_format();
        assert_eq!(wire.get(TYPENAME_KEY), Some(&json!("Sample")));
        assert!(wire.contains_key("snakeCaseField"));
        assert_eq!(Sample::from_api_response(wire), Ok(entity));
    }

    #[test]
    fn nested_entities_prefer_their_own_serialization() {
        let holder = Holder {
            inner: Redacted {
                secret: "hunter2".into(),
            },
        };
        assert_eq!(
            Value::Object(holder.as_dict()),
            json!({"inner": {"secret": "***"}})
        );
    }
}
