//! `resilient-fetch` is an async REST client for a single backend API.
//!
//! The crate wraps `reqwest` with:
//! - base URL selection for server and browser contexts ([`resolve_base_url`])
//! - default JSON headers ([`default_headers`])
//! - a middleware pipeline with linear retry on timeouts, network failures
//!   and `503` responses ([`RetryMiddleware`])
//! - typed requests ([`ApiClient::request`]) and result envelope
//!   unwrapping ([`ApiEnvelope::unwrap`])

mod client;
mod config;
mod envelope;
mod error;
mod headers;
mod middleware;
mod options;
mod request;

pub mod nations;
pub mod users;

pub use client::ApiClient;
pub use config::{resolve_base_url, ApiConfig, Environment, ExecutionContext, DEFAULT_TIMEOUT_MS};
pub use envelope::{ApiEnvelope, DEFAULT_DOMAIN_ERROR, SUCCESS_CODE};
pub use error::FetchError;
pub use headers::{apply_default_headers, default_headers};
pub use middleware::{
    backoff_delay, is_retryable_status, is_retryable_transport, LoggingMiddleware,
    RetryAttempt, RetryMiddleware,
};
pub use options::ClientOptions;
pub use request::RequestOptions;

pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, FetchError>;
