//! AuthAlligator HTTP client implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::entities::{
    Account, AuthorizeAccountPayload, DeleteAccountKeyPayload, DeleteAccountPayload,
    DeleteOtherAccountKeysPayload, VerifyAccountPayload,
};
use crate::enums::ProviderType;
use crate::error::ClientError;
use crate::input::{AccountAccessInput, AuthorizeAccountInput, DeleteAccountInput};
use crate::operation::{
    AuthorizeAccount, DeleteAccount, DeleteAccountKey, DeleteOtherAccountKeys, GetAccount,
    GraphqlOperation, GraphqlRequest, VerifyAccount, parse_response,
};
use crate::retry::{RetryDecision, RetryPolicy};

/// Client metrics.
#[derive(Debug, Default)]
#[allow(clippy::struct_field_names)]
pub struct ClientMetrics {
    requests_total: AtomicU64,
    requests_success: AtomicU64,
    requests_error: AtomicU64,
    requests_retried: AtomicU64,
}

impl ClientMetrics {
    /// Snapshot current metrics.
    #[must_use]
    pub fn snapshot(&self) -> ClientMetricsSnapshot {
        ClientMetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_success: self.requests_success.load(Ordering::Relaxed),
            requests_error: self.requests_error.load(Ordering::Relaxed),
            requests_retried: self.requests_retried.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_field_names)]
pub struct ClientMetricsSnapshot {
    /// Operations executed.
    pub requests_total: u64,
    /// Operations that produced a decoded response.
    pub requests_success: u64,
    /// Operations that failed.
    pub requests_error: u64,
    /// Retries performed.
    pub requests_retried: u64,
}

/// Client builder.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    config: ClientConfig,
    headers: HeaderMap,
}

impl ClientBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(service_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(service_url, token))
    }

    /// Start from a loaded configuration.
    #[must_use]
    pub fn from_config(config: ClientConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self { config, headers }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<AuthAlligatorClient, ClientError> {
        let http = reqwest::Client::builder()
            .default_headers(self.headers)
            .timeout(self.config.timeout)
            .build()?;
        Ok(AuthAlligatorClient {
            endpoint: self.config.endpoint(),
            http,
            config: self.config,
            metrics: Arc::new(ClientMetrics::default()),
        })
    }
}

/// Client for the AuthAlligator GraphQL API.
#[derive(Debug, Clone)]
pub struct AuthAlligatorClient {
    endpoint: String,
    http: reqwest::Client,
    config: ClientConfig,
    metrics: Arc<ClientMetrics>,
}

impl AuthAlligatorClient {
    /// Create a client with the default timeout and retry policy.
    pub fn new(service_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ClientError> {
        ClientBuilder::new(service_url, token).build()
    }

    /// Create a client from a loaded configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self, ClientError> {
        ClientBuilder::from_config(config).build()
    }

    /// Start building a client.
    #[must_use]
    pub fn builder(service_url: impl Into<String>, token: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(service_url, token)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GraphQL endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Return client metrics snapshot.
    #[must_use]
    pub fn metrics(&self) -> ClientMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Execute an operation and return the decoded root entity.
    ///
    /// Union fields are returned as sent; domain errors are not raised.
    pub async fn execute<O: GraphqlOperation>(&self, operation: &O) -> Result<O::Root, ClientError> {
        self.metrics.requests_total.fetch_add(1, Ordering::Relaxed);
        let result = self.execute_inner(operation).await;
        let counter = if result.is_ok() {
            &self.metrics.requests_success
        } else {
            &self.metrics.requests_error
        };
        counter.fetch_add(1, Ordering::Relaxed);
        result
    }

    /// Execute an operation and return its payload, raising domain errors.
    pub async fn perform<O: GraphqlOperation>(&self, operation: &O) -> Result<O::Output, ClientError> {
        let root = self.execute(operation).await?;
        O::extract(root)
    }

    async fn execute_inner<O: GraphqlOperation>(&self, operation: &O) -> Result<O::Root, ClientError> {
        let request = GraphqlRequest::for_operation(operation)?;
        let body = serde_json::to_vec(&request)?;
        let bytes = self
            .send_with_retry(O::OPERATION_NAME, &body, O::is_idempotent())
            .await?;
        parse_response(&bytes)
    }

    async fn send_with_retry(
        &self,
        operation: &'static str,
        body: &[u8],
        idempotent: bool,
    ) -> Result<Vec<u8>, ClientError> {
        let mut attempt = 1;
        loop {
            debug!(operation, attempt, "sending GraphQL request");
            match self.send_once(body).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) => match self.config.retry.decide(&err, attempt, idempotent) {
                    RetryDecision::RetryAfter(delay) => {
                        self.metrics
                            .requests_retried
                            .fetch_add(1, Ordering::Relaxed);
                        warn!(operation, attempt, error = %err, "retrying GraphQL request after {:?}", delay);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::DoNotRetry => return Err(err),
                },
            }
        }
    }

    async fn send_once(&self, body: &[u8]) -> Result<Vec<u8>, ClientError> {
        let response = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.config.token, Some(""))
            .body(body.to_vec())
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        // Every GraphQL response, domain errors included, arrives as a 200.
        if status != StatusCode::OK {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            return Err(ClientError::from_status(status, body));
        }

        Ok(bytes.to_vec())
    }

    /// Exchange an OAuth authorization code for an account key.
    #[instrument(skip(self, authorization_code, redirect_uri))]
    pub async fn authorize_account(
        &self,
        provider: ProviderType,
        authorization_code: &str,
        redirect_uri: &str,
    ) -> Result<AuthorizeAccountPayload, ClientError> {
        let operation = AuthorizeAccount {
            input: AuthorizeAccountInput {
                provider,
                authorization_code: authorization_code.to_string(),
                redirect_uri: redirect_uri.to_string(),
            },
        };
        self.perform(&operation).await
    }

    /// Fetch the account with a valid access token, optionally for `scopes`.
    #[instrument(skip(self, account_key))]
    pub async fn query_account(
        &self,
        provider: ProviderType,
        username: &str,
        account_key: &str,
        scopes: Option<&[String]>,
    ) -> Result<Account, ClientError> {
        let operation = GetAccount {
            access: access_input(provider, username, account_key),
            scopes: scopes.map(<[String]>::to_vec),
        };
        self.perform(&operation).await
    }

    /// Check that the access token works, refreshing it if needed.
    #[instrument(skip(self, account_key))]
    pub async fn verify_account(
        &self,
        provider: ProviderType,
        username: &str,
        account_key: &str,
    ) -> Result<VerifyAccountPayload, ClientError> {
        let operation = VerifyAccount {
            input: access_input(provider, username, account_key),
        };
        self.perform(&operation).await
    }

    /// Revoke this account key, leaving other keys in place.
    #[instrument(skip(self, account_key))]
    pub async fn delete_account_key(
        &self,
        provider: ProviderType,
        username: &str,
        account_key: &str,
    ) -> Result<DeleteAccountKeyPayload, ClientError> {
        let operation = DeleteAccountKey {
            input: access_input(provider, username, account_key),
        };
        self.perform(&operation).await
    }

    /// Revoke every other key with access to this account.
    #[instrument(skip(self, account_key))]
    pub async fn delete_other_account_keys(
        &self,
        provider: ProviderType,
        username: &str,
        account_key: &str,
    ) -> Result<DeleteOtherAccountKeysPayload, ClientError> {
        let operation = DeleteOtherAccountKeys {
            input: access_input(provider, username, account_key),
        };
        self.perform(&operation).await
    }

    /// Delete the account and all of its keys.
    #[instrument(skip(self))]
    pub async fn delete_account(
        &self,
        provider: ProviderType,
        username: &str,
    ) -> Result<DeleteAccountPayload, ClientError> {
        let operation = DeleteAccount {
            input: DeleteAccountInput {
                provider,
                username: username.to_string(),
            },
        };
        self.perform(&operation).await
    }
}

fn access_input(provider: ProviderType, username: &str, account_key: &str) -> AccountAccessInput {
    AccountAccessInput {
        provider,
        username: username.to_string(),
        account_key: account_key.to_string(),
    }
}
