//! Error types for response conversion and client operations.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::AccountError;

/// HTTP error information captured from reqwest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpErrorInfo {
    /// Error message.
    pub message: String,
    /// HTTP status code (if available).
    pub status_code: Option<u16>,
    /// Whether the error was a timeout.
    pub is_timeout: bool,
    /// Whether the error was a connection failure.
    pub is_connect: bool,
}

impl From<reqwest::Error> for HttpErrorInfo {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            status_code: err.status().map(|status| status.as_u16()),
            is_timeout: err.is_timeout(),
            is_connect: err.is_connect(),
        }
    }
}

/// A response did not have the shape the target entity expects.
///
/// These point at a client/server schema mismatch and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Several candidate types were possible and no `__typename` was sent.
    #[error("no \"__typename\" present to disambiguate between possible types: [{}]", .candidates.join(", "))]
    Disambiguation {
        /// Type names that could not be told apart.
        candidates: Vec<&'static str>,
    },

    /// The `__typename` did not name any candidate type.
    #[error("no entity found for type \"{typename}\" (expected one of [{}])", .candidates.join(", "))]
    UnknownType {
        /// Discriminator found in the response.
        typename: String,
        /// Type names that were accepted.
        candidates: Vec<&'static str>,
    },

    /// The `__typename` does not match the entity being constructed.
    #[error("given type \"{found}\" doesn't match this entity's type \"{expected}\"; is {entity} the right entity for this data?")]
    TypeMismatch {
        /// Discriminator found in the response.
        found: String,
        /// Type name of the entity.
        expected: &'static str,
        /// Rust name of the entity.
        entity: &'static str,
    },

    /// An enum field carried a value outside the known set.
    #[error("enum value {value} not found on enum type {enum_name}; valid choices: [{}]", .choices.join(", "))]
    InvalidEnumValue {
        /// Raw value found in the response.
        value: String,
        /// Enum type name.
        enum_name: &'static str,
        /// Accepted wire values.
        choices: Vec<&'static str>,
    },

    /// A date-time field could not be parsed as ISO-8601.
    #[error("invalid ISO-8601 date-time {value:?}: {message}")]
    InvalidDateTime {
        /// Raw value found in the response.
        value: String,
        /// Parser message.
        message: String,
    },

    /// A field carried a JSON value of the wrong kind.
    #[error("expected {expected}, found {found}")]
    InvalidValue {
        /// Expected kind.
        expected: &'static str,
        /// JSON kind found.
        found: String,
    },

    /// A required field was not present in the response.
    #[error("missing field {field} on {entity}")]
    MissingField {
        /// Rust name of the entity.
        entity: &'static str,
        /// Field name.
        field: &'static str,
    },

    /// The response carried a field the entity does not declare.
    #[error("unexpected field {field} on {entity}")]
    UnknownField {
        /// Rust name of the entity.
        entity: &'static str,
        /// Field name after snake_case conversion.
        field: String,
    },

    /// A field converter failed.
    #[error("{entity}.{field}: {source}")]
    Field {
        /// Rust name of the entity.
        entity: &'static str,
        /// Field name.
        field: &'static str,
        /// Underlying failure.
        source: Box<ConversionError>,
    },
}

impl ConversionError {
    /// The innermost error, skipping field context.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Self::Field { source, .. } = current {
            current = source;
        }
        current
    }

    /// Names of the fields leading to the innermost error.
    #[must_use]
    pub fn field_path(&self) -> Vec<&'static str> {
        let mut path = Vec::new();
        let mut current = self;
        while let Self::Field { field, source, .. } = current {
            path.push(*field);
            current = source;
        }
        path
    }

    pub(crate) fn invalid_value(expected: &'static str, found: &serde_json::Value) -> Self {
        Self::InvalidValue {
            expected,
            found: json_kind(found).to_string(),
        }
    }
}

pub(crate) const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Error type for client operations.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// HTTP/network error.
    #[error("HTTP error: {0:?}")]
    Http(HttpErrorInfo),

    /// The service rejected the credentials (401/403).
    #[error("unauthorized (HTTP {status}): {body}")]
    Unauthorized {
        /// HTTP status code.
        status: StatusCode,
        /// Response body.
        body: String,
    },

    /// Any other non-200 response.
    #[error("unexpected HTTP status {status} with body: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: StatusCode,
        /// Response body.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(String),

    /// GraphQL-level errors returned by the server.
    #[error("GraphQL errors: {errors:?}")]
    Query {
        /// Raw error objects, as sent.
        errors: Vec<serde_json::Value>,
    },

    /// The response envelope was not usable.
    #[error("GraphQL protocol error: {message}")]
    Protocol {
        /// Details.
        message: String,
    },

    /// The response data did not match the expected entities.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// The service reported a business-rule failure.
    #[error("account error: {0}")]
    Account(AccountError),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(HttpErrorInfo::from(err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl ClientError {
    /// Build the status error matching `status`.
    #[must_use]
    pub fn from_status(status: StatusCode, body: String) -> Self {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Self::Unauthorized { status, body }
        } else {
            Self::UnexpectedStatus { status, body }
        }
    }

    /// Returns `true` for transport failures, the only retryable kind.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// HTTP status code for status errors.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { status, .. } | Self::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// The domain error, if the service reported one.
    #[must_use]
    pub const fn account_error(&self) -> Option<&AccountError> {
        match self {
            Self::Account(err) => Some(err),
            _ => None,
        }
    }

    /// Suggested wait before retrying, when the service sent one.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        self.account_error().and_then(AccountError::retry_after)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn root_cause_and_path_skip_field_context() {
        let err = ConversionError::Field {
            entity: "Mutation",
            field: "authorize_account",
            source: Box::new(ConversionError::Field {
                entity: "AuthorizeAccountPayload",
                field: "account",
                source: Box::new(ConversionError::MissingField {
                    entity: "Account",
                    field: "username",
                }),
            }),
        };
        assert!(matches!(
            err.root_cause(),
            ConversionError::MissingField {
                field: "username",
                ..
            }
        ));
        assert_eq!(err.field_path(), vec!["authorize_account", "account"]);
    }

    #[test]
    fn status_errors_split_on_unauthorized() {
        for code in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = ClientError::from_status(code, "denied".into());
            assert!(matches!(err, ClientError::Unauthorized { .. }));
            assert_eq!(err.status(), Some(code));
        }
        let err = ClientError::from_status(StatusCode::BAD_GATEWAY, "oops".into());
        assert!(matches!(err, ClientError::UnexpectedStatus { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn messages_carry_context() {
        let err = ConversionError::InvalidEnumValue {
            value: "NOPE".into(),
            enum_name: "ProviderType",
            choices: vec!["TEST", "GOOGLE"],
        };
        let message = err.to_string();
        assert!(message.contains("NOPE"));
        assert!(message.contains("ProviderType"));
        assert!(message.contains("TEST, GOOGLE"));

        let err = ClientError::Query {
            errors: vec![json!({"message": "boom"})],
        };
        assert!(err.to_string().contains("boom"));
    }
}
