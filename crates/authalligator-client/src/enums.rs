//! Enumerations shared by requests and responses.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::casing::KeyCase;
use crate::convert::WireEnum;
use crate::entity::ToJson;

/// OAuth provider an account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderType {
    /// Test provider.
    Test,
    /// Google.
    Google,
    /// Zoom.
    Zoom,
    /// Microsoft.
    Microsoft,
    /// Calendly.
    Calendly,
}

impl WireEnum for ProviderType {
    const NAME: &'static str = "ProviderType";
    const VARIANTS: &'static [Self] = &[
        Self::Test,
        Self::Google,
        Self::Zoom,
        Self::Microsoft,
        Self::Calendly,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Test => "TEST",
            Self::Google => "GOOGLE",
            Self::Zoom => "ZOOM",
            Self::Microsoft => "MICROSOFT",
            Self::Calendly => "CALENDLY",
        }
    }
}

/// Reason reported by an `AccountError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountErrorCode {
    /// The provider refused the authorization.
    AuthorizationError,
    /// The service is misconfigured for this provider.
    ConfigurationError,
    /// The account or account key does not exist.
    DoesNotExist,
    /// The account is locked by a concurrent operation.
    LockError,
    /// The provider could not be reached.
    ProviderConnectionError,
    /// Transient failure; retry later.
    TryLater,
}

impl WireEnum for AccountErrorCode {
    const NAME: &'static str = "AccountErrorCode";
    const VARIANTS: &'static [Self] = &[
        Self::AuthorizationError,
        Self::ConfigurationError,
        Self::DoesNotExist,
        Self::LockError,
        Self::ProviderConnectionError,
        Self::TryLater,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationError => "AUTHORIZATION_ERROR",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
            Self::DoesNotExist => "DOES_NOT_EXIST",
            Self::LockError => "LOCK_ERROR",
            Self::ProviderConnectionError => "PROVIDER_CONNECTION_ERROR",
            Self::TryLater => "TRY_LATER",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AccountErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToJson for ProviderType {
    fn to_json(&self, _case: KeyCase) -> Value {
        Value::String(self.as_str().to_string())
    }
}

impl ToJson for AccountErrorCode {
    fn to_json(&self, _case: KeyCase) -> Value {
        Value::String(self.as_str().to_string())
    }
}
