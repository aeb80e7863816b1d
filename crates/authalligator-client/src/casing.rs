//! Field name conversion between the service's camelCase and snake_case.

use heck::{ToLowerCamelCase, ToSnakeCase};
use serde_json::{Map, Value};

/// Key convention used when serializing an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyCase {
    /// Rust field names (`access_token`).
    #[default]
    Snake,
    /// Service field names (`accessToken`).
    Camel,
}

impl KeyCase {
    /// Apply this convention to a snake_case field name.
    #[must_use]
    pub fn apply(self, field: &str) -> String {
        match self {
            Self::Snake => field.to_string(),
            Self::Camel => to_camel_case(field),
        }
    }
}

/// Convert `snake_case` to `camelCase`.
#[must_use]
pub fn to_camel_case(name: &str) -> String {
    name.to_lower_camel_case()
}

/// Convert `camelCase` to `snake_case`.
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    name.to_snake_case()
}

/// Rename the top-level keys of an object to camelCase.
#[must_use]
pub fn camel_case_keys(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (to_camel_case(&key), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_service_field_names() {
        let pairs = [
            ("provider", "provider"),
            ("retry_in", "retryIn"),
            ("access_token", "accessToken"),
            ("access_token_expires_at", "accessTokenExpiresAt"),
            ("number_of_account_keys", "numberOfAccountKeys"),
            ("redirect_uri", "redirectUri"),
        ];
        for (snake, camel) in pairs {
            assert_eq!(to_camel_case(snake), camel);
            assert_eq!(to_snake_case(camel), snake);
        }
    }

    #[test]
    fn camel_case_keys_only_touches_keys() {
        let mut map = Map::new();
        map.insert("account_key".into(), Value::String("some_value".into()));
        let renamed = camel_case_keys(map);
        assert_eq!(
            renamed.get("accountKey"),
            Some(&Value::String("some_value".into()))
        );
    }

    #[test]
    fn key_case_apply() {
        assert_eq!(KeyCase::Snake.apply("retry_in"), "retry_in");
        assert_eq!(KeyCase::Camel.apply("retry_in"), "retryIn");
    }
}
