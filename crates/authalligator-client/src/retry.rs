//! Retry policy helpers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::duration_millis;
use crate::error::ClientError;

/// Retry decision result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after a delay.
    RetryAfter(Duration),
    /// Do not retry.
    DoNotRetry,
}

/// Retry strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategy {
    /// Never retry.
    Never,
    /// Retry only for idempotent operations.
    IdempotentOnly,
    /// Retry regardless of idempotency.
    #[default]
    Always,
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Fixed delay between attempts.
    #[serde(default = "default_delay", rename = "delay_ms", with = "duration_millis")]
    pub delay: Duration,
    /// Retry strategy.
    #[serde(default)]
    pub strategy: RetryStrategy,
}

const fn default_max_attempts() -> usize {
    3
}

const fn default_delay() -> Duration {
    Duration::from_secs(1)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay: default_delay(),
            strategy: RetryStrategy::default(),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes a single attempt.
    #[must_use]
    pub const fn never() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
            strategy: RetryStrategy::Never,
        }
    }

    /// Decide whether to retry based on the error and attempt count.
    #[must_use]
    pub const fn decide(
        &self,
        error: &ClientError,
        attempt: usize,
        idempotent: bool,
    ) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::DoNotRetry;
        }
        if !error.is_retryable() {
            return RetryDecision::DoNotRetry;
        }

        match self.strategy {
            RetryStrategy::Never => RetryDecision::DoNotRetry,
            RetryStrategy::IdempotentOnly if !idempotent => RetryDecision::DoNotRetry,
            RetryStrategy::IdempotentOnly | RetryStrategy::Always => {
                RetryDecision::RetryAfter(self.delay)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;
    use crate::error::HttpErrorInfo;

    fn transport_error() -> ClientError {
        ClientError::Http(HttpErrorInfo {
            message: "connection refused".into(),
            status_code: None,
            is_timeout: false,
            is_connect: true,
        })
    }

    #[test]
    fn defaults_match_three_tries_one_second_apart() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
        assert_eq!(policy.strategy, RetryStrategy::Always);
    }

    #[test]
    fn retries_transport_errors_until_attempts_run_out() {
        let policy = RetryPolicy::default();
        let err = transport_error();
        assert_eq!(
            policy.decide(&err, 1, false),
            RetryDecision::RetryAfter(Duration::from_secs(1))
        );
        assert_eq!(
            policy.decide(&err, 2, false),
            RetryDecision::RetryAfter(Duration::from_secs(1))
        );
        assert_eq!(policy.decide(&err, 3, false), RetryDecision::DoNotRetry);
    }

    #[test]
    fn never_retries_non_transport_errors() {
        let policy = RetryPolicy::default();
        let errors = [
            ClientError::from_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            ClientError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            ClientError::Query { errors: vec![] },
            ClientError::Protocol {
                message: "missing".into(),
            },
            ClientError::Json("eof".into()),
        ];
        for err in &errors {
            assert_eq!(policy.decide(err, 1, true), RetryDecision::DoNotRetry);
        }
    }

    #[test]
    fn strategy_gates_retries() {
        let err = transport_error();
        let idempotent_only = RetryPolicy {
            strategy: RetryStrategy::IdempotentOnly,
            ..RetryPolicy::default()
        };
        assert_eq!(idempotent_only.decide(&err, 1, false), RetryDecision::DoNotRetry);
        assert!(matches!(
            idempotent_only.decide(&err, 1, true),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(RetryPolicy::never().decide(&err, 1, true), RetryDecision::DoNotRetry);
    }

    #[test]
    fn loads_from_json_with_defaults() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"delay_ms": 250, "strategy": "idempotent_only"}"#)
                .expect("parses");
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_millis(250));
        assert_eq!(policy.strategy, RetryStrategy::IdempotentOnly);
    }
}
