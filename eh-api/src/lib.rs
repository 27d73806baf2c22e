//! everHome API - HTTP client for the everHome cloud REST API.
//!
//! This crate provides a small typed client: bearer-token authentication,
//! URL resolution against the cloud origin, JSON or raw request bodies, a
//! fixed retry policy with exponential backoff, and translation of error
//! responses into `eh_core::ApiError`.

pub mod client;
pub mod endpoints;
pub mod request;
pub mod response;
pub mod retry;

// Re-export key types
pub use client::ApiClient;
pub use request::{BodyEncoding, Payload, RequestOptions};
pub use retry::RetryPolicy;
