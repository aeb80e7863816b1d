//! Entities returned by the AuthAlligator service.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::convert;
use crate::entity::{Entity, FieldWriter, Fields};
use crate::enums::{AccountErrorCode, ProviderType};
use crate::error::ConversionError;
use crate::maybe::Maybe;

/// A business-rule failure reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountError {
    /// Failure reason.
    pub code: AccountErrorCode,
    /// Human-readable message.
    pub message: Option<String>,
    /// Seconds to wait before retrying.
    pub retry_in: Option<i64>,
}

impl AccountError {
    /// `retry_in` as a duration; negative values are ignored.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_in
            .and_then(|seconds| u64::try_from(seconds).ok())
            .map(Duration::from_secs)
    }
}

impl fmt::Display for AccountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(retry_in) = self.retry_in {
            write!(f, " (retry in {retry_in}s)")?;
        }
        Ok(())
    }
}

impl Entity for AccountError {
    const NAME: &'static str = "AccountError";
    const TYPENAME: &'static str = "AccountError";
    const FIELDS: &'static [&'static str] = &["code", "message", "retry_in"];

    fn from_fields(fields: &mut Fields) -> Result<Self, ConversionError> {
        Ok(Self {
            code: fields.required("code", convert::enumeration)?,
            message: fields.required("message", convert::optional(convert::string))?,
            retry_in: fields.required("retry_in", convert::optional(convert::integer))?,
        })
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.field("code", &self.code);
        out.field("message", &self.message);
        out.field("retry_in", &self.retry_in);
    }
}

/// A provider account and its current access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Provider the account belongs to.
    pub provider: ProviderType,
    /// Service-assigned user name (not necessarily human readable).
    pub username: String,
    /// OAuth access token.
    pub access_token: Option<String>,
    /// Expiry of `access_token`.
    pub access_token_expires_at: Option<DateTime<Utc>>,
}

impl Entity for Account {
    const NAME: &'static str = "Account";
    const TYPENAME: &'static str = "Account";
    const FIELDS: &'static [&'static str] = &[
        "provider",
        "username",
        "access_token",
        "access_token_expires_at",
    ];

    fn from_fields(fields: &mut Fields) -> Result<Self, ConversionError> {
        Ok(Self {
            provider: fields.required("provider", convert::enumeration)?,
            username: fields.required("username", convert::string)?,
            access_token: fields.required("access_token", convert::optional(convert::string))?,
            access_token_expires_at: fields.required(
                "access_token_expires_at",
                convert::optional(convert::datetime),
            )?,
        })
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.field("provider", &self.provider);
        out.field("username", &self.username);
        out.field("access_token", &self.access_token);
        out.field("access_token_expires_at", &self.access_token_expires_at);
    }
}

/// Result of a successful `authorizeAccount` mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeAccountPayload {
    /// The authorized account.
    pub account: Account,
    /// Secret key granting access to the account.
    pub account_key: String,
    /// Keys now granting access to the account.
    pub number_of_account_keys: i64,
}

impl Entity for AuthorizeAccountPayload {
    const NAME: &'static str = "AuthorizeAccountPayload";
    const TYPENAME: &'static str = "AuthorizeAccountPayload";
    const FIELDS: &'static [&'static str] = &["account", "account_key", "number_of_account_keys"];

    fn from_fields(fields: &mut Fields) -> Result<Self, ConversionError> {
        Ok(Self {
            account: fields.required("account", convert::entity)?,
            account_key: fields.required("account_key", convert::string)?,
            number_of_account_keys: fields.required("number_of_account_keys", convert::integer)?,
        })
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.entity("account", &self.account);
        out.field("account_key", &self.account_key);
        out.field("number_of_account_keys", &self.number_of_account_keys);
    }
}

/// Result of a successful `verifyAccount` mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyAccountPayload {
    /// The verified (and possibly refreshed) account.
    pub account: Account,
}

impl Entity for VerifyAccountPayload {
    const NAME: &'static str = "VerifyAccountPayload";
    const TYPENAME: &'static str = "VerifyAccountPayload";
    const FIELDS: &'static [&'static str] = &["account"];

    fn from_fields(fields: &mut Fields) -> Result<Self, ConversionError> {
        Ok(Self {
            account: fields.required("account", convert::entity)?,
        })
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.entity("account", &self.account);
    }
}

macro_rules! empty_payload {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name;

        impl Entity for $name {
            const NAME: &'static str = stringify!($name);
            const TYPENAME: &'static str = stringify!($name);
            const FIELDS: &'static [&'static str] = &[];

            fn from_fields(_fields: &mut Fields) -> Result<Self, ConversionError> {
                Ok(Self)
            }

            fn write_fields(&self, _out: &mut FieldWriter) {}
        }
    };
}

empty_payload!(
    /// Result of a successful `deleteAccountKey` mutation.
    DeleteAccountKeyPayload
);

empty_payload!(
    /// Result of a successful `deleteOtherAccountKeys` mutation.
    DeleteOtherAccountKeysPayload
);

empty_payload!(
    /// Result of a successful `deleteAccount` mutation.
    DeleteAccountPayload
);

/// A union of one success payload and [`AccountError`].
pub trait Outcome {
    /// Success payload type.
    type Success;

    /// Split into the payload or the domain error.
    fn into_result(self) -> Result<Self::Success, AccountError>;
}

macro_rules! account_result {
    ($(#[$meta:meta])* $name:ident => $success:ty) => {
        crate::entity_union! {
            $(#[$meta])*
            pub enum $name {
                /// The operation succeeded.
                Success($success),
                /// The service reported a domain error.
                Error(AccountError),
            }
        }

        impl Outcome for $name {
            type Success = $success;

            fn into_result(self) -> Result<$success, AccountError> {
                match self {
                    Self::Success(payload) => Ok(payload),
                    Self::Error(err) => Err(err),
                }
            }
        }
    };
}

account_result!(
    /// `Account` or `AccountError`.
    AccountResult => Account
);
account_result!(
    /// `AuthorizeAccountPayload` or `AccountError`.
    AuthorizeAccountResult => AuthorizeAccountPayload
);
account_result!(
    /// `VerifyAccountPayload` or `AccountError`.
    VerifyAccountResult => VerifyAccountPayload
);
account_result!(
    /// `DeleteAccountKeyPayload` or `AccountError`.
    DeleteAccountKeyResult => DeleteAccountKeyPayload
);
account_result!(
    /// `DeleteOtherAccountKeysPayload` or `AccountError`.
    DeleteOtherAccountKeysResult => DeleteOtherAccountKeysPayload
);
account_result!(
    /// `DeleteAccountPayload` or `AccountError`.
    DeleteAccountResult => DeleteAccountPayload
);

/// Root of a query response; only requested fields are populated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    /// `account(access:, scopes:)`.
    pub account: Maybe<AccountResult>,
}

impl Entity for Query {
    const NAME: &'static str = "Query";
    const TYPENAME: &'static str = "";
    const FIELDS: &'static [&'static str] = &["account"];

    fn from_fields(fields: &mut Fields) -> Result<Self, ConversionError> {
        Ok(Self {
            account: fields.union("account")?,
        })
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.maybe("account", &self.account);
    }
}

/// Root of a mutation response; only requested fields are populated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mutation {
    /// `authorizeAccount(input:)`.
    pub authorize_account: Maybe<AuthorizeAccountResult>,
    /// `verifyAccount(input:)`.
    pub verify_account: Maybe<VerifyAccountResult>,
    /// `deleteAccountKey(input:)`.
    pub delete_account_key: Maybe<DeleteAccountKeyResult>,
    /// `deleteOtherAccountKeys(input:)`.
    pub delete_other_account_keys: Maybe<DeleteOtherAccountKeysResult>,
    /// `deleteAccount(input:)`.
    pub delete_account: Maybe<DeleteAccountResult>,
}

impl Entity for Mutation {
    const NAME: &'static str = "Mutation";
    const TYPENAME: &'static str = "";
    const FIELDS: &'static [&'static str] = &[
        "authorize_account",
        "verify_account",
        "delete_account_key",
        "delete_other_account_keys",
        "delete_account",
    ];

    fn from_fields(fields: &mut Fields) -> Result<Self, ConversionError> {
        Ok(Self {
            authorize_account: fields.union("authorize_account")?,
            verify_account: fields.union("verify_account")?,
            delete_account_key: fields.union("delete_account_key")?,
            delete_other_account_keys: fields.union("delete_other_account_keys")?,
            delete_account: fields.union("delete_account")?,
        })
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.maybe("authorize_account", &self.authorize_account);
        out.maybe("verify_account", &self.verify_account);
        out.maybe("delete_account_key", &self.delete_account_key);
        out.maybe("delete_other_account_keys", &self.delete_other_account_keys);
        out.maybe("delete_account", &self.delete_account);
    }
}
