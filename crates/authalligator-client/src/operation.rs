//! Operation definitions and the GraphQL request/response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::converter::EntityConverter;
use crate::entities::{
    Account, AuthorizeAccountPayload, DeleteAccountKeyPayload, DeleteAccountPayload,
    DeleteOtherAccountKeysPayload, Mutation, Outcome, Query, VerifyAccountPayload,
};
use crate::entity::Entity;
use crate::error::ClientError;
use crate::input::{AccountAccessInput, AuthorizeAccountInput, DeleteAccountInput, InputObject};
use crate::maybe::Maybe;

/// Typed GraphQL operation definition.
///
/// Implement this trait for each query/mutation.
pub trait GraphqlOperation {
    /// Root entity the response `data` is decoded into.
    type Root: Entity + 'static;
    /// Value handed back to the caller.
    type Output;

    /// GraphQL query text.
    const QUERY: &'static str;
    /// Operation name (used for observability).
    const OPERATION_NAME: &'static str;

    /// Variables sent with the query.
    fn variables(&self) -> Result<Map<String, Value>, serde_json::Error>;

    /// Pick the requested field out of the decoded root.
    fn extract(root: Self::Root) -> Result<Self::Output, ClientError>;

    /// Whether this operation is safe to retry on transport errors.
    fn is_idempotent() -> bool {
        true
    }
}

/// GraphQL request payload.
#[derive(Debug, Clone, Serialize)]
pub struct GraphqlRequest {
    /// Query text.
    pub query: &'static str,
    /// Variables.
    pub variables: Map<String, Value>,
}

impl GraphqlRequest {
    /// Build the request for `operation`.
    pub fn for_operation<O: GraphqlOperation>(operation: &O) -> Result<Self, ClientError> {
        Ok(Self {
            query: O::QUERY,
            variables: operation.variables()?,
        })
    }
}

/// GraphQL response container.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphqlResponse {
    /// Response data.
    #[serde(default)]
    pub data: Option<Value>,
    /// GraphQL errors.
    #[serde(default)]
    pub errors: Option<Vec<Value>>,
}

impl GraphqlResponse {
    /// Decode `data` into the root entity `R`.
    ///
    /// A non-empty `errors` array wins over any data sent alongside it.
    pub fn into_entity<R: Entity + 'static>(self) -> Result<R, ClientError> {
        if let Some(errors) = self.errors.filter(|errors| !errors.is_empty()) {
            return Err(ClientError::Query { errors });
        }
        let data = self.data.ok_or_else(|| ClientError::Protocol {
            message: "missing GraphQL data".to_string(),
        })?;
        match EntityConverter::<R>::single().convert_value(data)? {
            Maybe::Value(root) => Ok(root),
            Maybe::Null | Maybe::Omitted => Err(ClientError::Protocol {
                message: "GraphQL data is null".to_string(),
            }),
        }
    }
}

/// Parse a 200 response body into the root entity `R`.
pub fn parse_response<R: Entity + 'static>(body: &[u8]) -> Result<R, ClientError> {
    let response: GraphqlResponse = serde_json::from_slice(body)?;
    response.into_entity()
}

fn outcome<U: Outcome>(field: &'static str, value: Maybe<U>) -> Result<U::Success, ClientError> {
    match value {
        Maybe::Value(result) => result.into_result().map_err(ClientError::Account),
        Maybe::Null => Err(ClientError::Protocol {
            message: format!("field {field} is null"),
        }),
        Maybe::Omitted => Err(ClientError::Protocol {
            message: format!("field {field} missing from response"),
        }),
    }
}

fn single_variable(
    name: &str,
    input: &impl InputObject,
) -> Result<Map<String, Value>, serde_json::Error> {
    let mut variables = Map::new();
    variables.insert(name.to_string(), input.to_variable()?);
    Ok(variables)
}

/// `account(access:, scopes:)`: fetch a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAccount {
    /// Proof of access.
    pub access: AccountAccessInput,
    /// OAuth scopes to request for the token.
    pub scopes: Option<Vec<String>>,
}

impl GraphqlOperation for GetAccount {
    type Root = Query;
    type Output = Account;

    const QUERY: &'static str = r"
        query getAccount($access: AccountAccessInput!, $scopes: [String!]) {
          account(access: $access, scopes: $scopes) {
            __typename
            ... on Account {
              provider
              username
              accessToken
              accessTokenExpiresAt
            }
            ... on AccountError {
              code
              message
              retryIn
            }
          }
        }
    ";
    const OPERATION_NAME: &'static str = "getAccount";

    fn variables(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let mut variables = single_variable("access", &self.access)?;
        variables.insert("scopes".to_string(), serde_json::to_value(&self.scopes)?);
        Ok(variables)
    }

    fn extract(root: Query) -> Result<Account, ClientError> {
        outcome("account", root.account)
    }
}

/// `authorizeAccount(input:)`: exchange an authorization code for an account key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeAccount {
    /// Mutation input.
    pub input: AuthorizeAccountInput,
}

impl GraphqlOperation for AuthorizeAccount {
    type Root = Mutation;
    type Output = AuthorizeAccountPayload;

    const QUERY: &'static str = r"
        mutation authorizeAccount($input: AuthorizeAccountInput!) {
          authorizeAccount(input: $input) {
            __typename
            ... on AuthorizeAccountPayload {
              account {
                provider
                username
                accessToken
                accessTokenExpiresAt
              }
              accountKey
              numberOfAccountKeys
            }
            ... on AccountError {
              code
              message
              retryIn
            }
          }
        }
    ";
    const OPERATION_NAME: &'static str = "authorizeAccount";

    fn variables(&self) -> Result<Map<String, Value>, serde_json::Error> {
        single_variable("input", &self.input)
    }

    fn extract(root: Mutation) -> Result<AuthorizeAccountPayload, ClientError> {
        outcome("authorizeAccount", root.authorize_account)
    }

    fn is_idempotent() -> bool {
        false
    }
}

/// `verifyAccount(input:)`: check the access token and refresh it if needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyAccount {
    /// Proof of access.
    pub input: AccountAccessInput,
}

impl GraphqlOperation for VerifyAccount {
    type Root = Mutation;
    type Output = VerifyAccountPayload;

    const QUERY: &'static str = r"
        mutation verifyAccount($input: AccountAccessInput!) {
          verifyAccount(input: $input) {
            __typename
            ... on VerifyAccountPayload {
              account {
                provider
                username
                accessToken
                accessTokenExpiresAt
              }
            }
            ... on AccountError {
              code
              message
              retryIn
            }
          }
        }
    ";
    const OPERATION_NAME: &'static str = "verifyAccount";

    fn variables(&self) -> Result<Map<String, Value>, serde_json::Error> {
        single_variable("input", &self.input)
    }

    fn extract(root: Mutation) -> Result<VerifyAccountPayload, ClientError> {
        outcome("verifyAccount", root.verify_account)
    }

    fn is_idempotent() -> bool {
        false
    }
}

/// `deleteAccountKey(input:)`: revoke this account key only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAccountKey {
    /// Proof of access.
    pub input: AccountAccessInput,
}

impl GraphqlOperation for DeleteAccountKey {
    type Root = Mutation;
    type Output = DeleteAccountKeyPayload;

    const QUERY: &'static str = r"
        mutation deleteAccountKey($input: AccountAccessInput!) {
          deleteAccountKey(input: $input) {
            __typename
            ... on AccountError {
              code
              message
              retryIn
            }
          }
        }
    ";
    const OPERATION_NAME: &'static str = "deleteAccountKey";

    fn variables(&self) -> Result<Map<String, Value>, serde_json::Error> {
        single_variable("input", &self.input)
    }

    fn extract(root: Mutation) -> Result<DeleteAccountKeyPayload, ClientError> {
        outcome("deleteAccountKey", root.delete_account_key)
    }

    fn is_idempotent() -> bool {
        false
    }
}

/// `deleteOtherAccountKeys(input:)`: revoke every key except this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOtherAccountKeys {
    /// Proof of access.
    pub input: AccountAccessInput,
}

impl GraphqlOperation for DeleteOtherAccountKeys {
    type Root = Mutation;
    type Output = DeleteOtherAccountKeysPayload;

    const QUERY: &'static str = r"
        mutation deleteOtherAccountKeys($input: AccountAccessInput!) {
          deleteOtherAccountKeys(input: $input) {
            __typename
            ... on AccountError {
              code
              message
              retryIn
            }
          }
        }
    ";
    const OPERATION_NAME: &'static str = "deleteOtherAccountKeys";

    fn variables(&self) -> Result<Map<String, Value>, serde_json::Error> {
        single_variable("input", &self.input)
    }

    fn extract(root: Mutation) -> Result<DeleteOtherAccountKeysPayload, ClientError> {
        outcome("deleteOtherAccountKeys", root.delete_other_account_keys)
    }

    fn is_idempotent() -> bool {
        false
    }
}

/// `deleteAccount(input:)`: delete the account and all of its keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAccount {
    /// Mutation input.
    pub input: DeleteAccountInput,
}

impl GraphqlOperation for DeleteAccount {
    type Root = Mutation;
    type Output = DeleteAccountPayload;

    const QUERY: &'static str = r"
        mutation deleteAccount($input: DeleteAccountInput!) {
          deleteAccount(input: $input) {
            __typename
            ... on AccountError {
              code
              message
              retryIn
            }
          }
        }
    ";
    const OPERATION_NAME: &'static str = "deleteAccount";

    fn variables(&self) -> Result<Map<String, Value>, serde_json::Error> {
        single_variable("input", &self.input)
    }

    fn extract(root: Mutation) -> Result<DeleteAccountPayload, ClientError> {
        outcome("deleteAccount", root.delete_account)
    }

    fn is_idempotent() -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::enums::{AccountErrorCode, ProviderType};

    fn access() -> AccountAccessInput {
        AccountAccessInput {
            provider: ProviderType::Test,
            username: "u".into(),
            account_key: "k".into(),
        }
    }

    #[test]
    fn request_body_has_query_and_variables_only() {
        let operation = GetAccount {
            access: access(),
            scopes: Some(vec!["calendar".into()]),
        };
        let request = GraphqlRequest::for_operation(&operation).expect("request");
        let body = serde_json::to_value(&request).expect("serializes");
        let body = body.as_object().expect("object");
        assert_eq!(body.len(), 2);
        assert_eq!(body["query"], json!(GetAccount::QUERY));
        assert_eq!(
            body["variables"],
            json!({
                "access": {"provider": "TEST", "username": "u", "accountKey": "k"},
                "scopes": ["calendar"],
            })
        );
    }

    #[test]
    fn scopes_default_to_null() {
        let operation = GetAccount {
            access: access(),
            scopes: None,
        };
        let variables = operation.variables().expect("variables");
        assert_eq!(variables.get("scopes"), Some(&Value::Null));
    }

    #[test]
    fn only_the_query_is_idempotent() {
        assert!(GetAccount::is_idempotent());
        assert!(!AuthorizeAccount::is_idempotent());
        assert!(!VerifyAccount::is_idempotent());
        assert!(!DeleteAccountKey::is_idempotent());
        assert!(!DeleteOtherAccountKeys::is_idempotent());
        assert!(!DeleteAccount::is_idempotent());
    }

    #[test]
    fn errors_take_precedence_over_data() {
        let body = json!({
            "data": {"account": null},
            "errors": [{"message": "boom"}],
        });
        let err = parse_response::<Query>(body.to_string().as_bytes()).expect_err("errors");
        assert!(matches!(err, ClientError::Query { ref errors } if errors.len() == 1));
    }

    #[test]
    fn empty_errors_array_is_ignored() {
        let body = json!({"data": {"deleteAccount": {"__typename": "DeleteAccountPayload"}}, "errors": []});
        let root = parse_response::<Mutation>(body.to_string().as_bytes()).expect("data");
        assert!(matches!(DeleteAccount::extract(root), Ok(DeleteAccountPayload)));
    }

    #[test]
    fn missing_or_null_data_is_a_protocol_error() {
        for body in [json!({}), json!({"data": null})] {
            let err = parse_response::<Query>(body.to_string().as_bytes()).expect_err("no data");
            assert!(matches!(err, ClientError::Protocol { .. }), "{err:?}");
        }
    }

    #[test]
    fn undecodable_body_is_a_json_error() {
        let err = parse_response::<Query>(b"<html>").expect_err("not json");
        assert!(matches!(err, ClientError::Json(_)));
    }

    #[test]
    fn extract_raises_domain_errors() {
        let body = json!({"data": {"verifyAccount": {
            "__typename": "AccountError",
            "code": "AUTHORIZATION_ERROR",
            "message": "revoked",
            "retryIn": null,
        }}});
        let root = parse_response::<Mutation>(body.to_string().as_bytes()).expect("data");
        let err = VerifyAccount::extract(root).expect_err("domain error");
        let account_error = err.account_error().expect("account error");
        assert_eq!(account_error.code, AccountErrorCode::AuthorizationError);
        assert_eq!(account_error.message.as_deref(), Some("revoked"));
    }

    #[test]
    fn extract_requires_the_requested_field() {
        let err = DeleteAccountKey::extract(Mutation::default()).expect_err("omitted");
        assert!(matches!(err, ClientError::Protocol { ref message } if message.contains("deleteAccountKey")));
    }
}
