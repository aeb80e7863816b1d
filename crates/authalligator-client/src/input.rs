//! Input objects sent as GraphQL variables.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::casing::camel_case_keys;
use crate::enums::ProviderType;

/// A GraphQL input object.
///
/// Fields are declared in snake_case and sent in camelCase.
pub trait InputObject: Serialize {
    /// Snake-cased JSON mapping of the input.
    fn as_dict(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "input object serialized to a non-object value: {other}"
            ))),
        }
    }

    /// The input as it is sent over the wire.
    fn to_variable(&self) -> Result<Value, serde_json::Error> {
        self.as_dict().map(|map| Value::Object(camel_case_keys(map)))
    }
}

/// Input for `authorizeAccount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizeAccountInput {
    /// Provider to authorize against.
    pub provider: ProviderType,
    /// Code received on the OAuth callback.
    pub authorization_code: String,
    /// Redirect URI used in the authorization request.
    pub redirect_uri: String,
}

impl InputObject for AuthorizeAccountInput {}

/// Proof of access to an existing account.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AccountAccessInput {
    /// Provider the account belongs to.
    pub provider: ProviderType,
    /// Service-assigned user name.
    pub username: String,
    /// Secret account key.
    pub account_key: String,
}

impl std::fmt::Debug for AccountAccessInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountAccessInput")
            .field("provider", &self.provider)
            .field("username", &self.username)
            .field("account_key", &"[redacted]")
            .finish()
    }
}

impl InputObject for AccountAccessInput {}

/// Input for `deleteAccount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteAccountInput {
    /// Provider the account belongs to.
    pub provider: ProviderType,
    /// Service-assigned user name.
    pub username: String,
}

impl InputObject for DeleteAccountInput {}
