//! AuthAlligator client - typed access to the AuthAlligator account service.
//!
//! This crate provides:
//! - Declarative response entities with camelCase/snake_case key mapping.
//! - Union resolution by `__typename`, with omitted fields kept distinct from `null`.
//! - Typed operations for authorizing, querying, verifying and deleting accounts.
//! - Retry and error mapping for the HTTP transport.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]

mod casing;
mod client;
mod config;
pub mod convert;
mod converter;
pub mod entities;
mod entity;
mod enums;
mod error;
pub mod input;
mod maybe;
pub mod operation;
mod retry;

pub use casing::{KeyCase, camel_case_keys, to_camel_case, to_snake_case};
pub use client::{AuthAlligatorClient, ClientBuilder, ClientMetrics, ClientMetricsSnapshot};
pub use config::ClientConfig;
pub use convert::WireEnum;
pub use converter::{Candidate, EntityConverter, Incoming, Resolve, TYPENAME_KEY};
pub use entities::{
    Account, AccountError, AuthorizeAccountPayload, DeleteAccountKeyPayload,
    DeleteAccountPayload, DeleteOtherAccountKeysPayload, Mutation, Outcome, Query,
    VerifyAccountPayload,
};
pub use entity::{Entity, FieldWriter, Fields, ToJson};
pub use enums::{AccountErrorCode, ProviderType};
pub use error::{ClientError, ConversionError, HttpErrorInfo};
pub use maybe::Maybe;
pub use operation::{GraphqlOperation, GraphqlRequest, GraphqlResponse};
pub use retry::{RetryDecision, RetryPolicy, RetryStrategy};

#[doc(hidden)]
pub use serde_json as __serde_json;
