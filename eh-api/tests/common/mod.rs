//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::net::TcpListener;

use eh_api::{ApiClient, RetryPolicy};
use eh_core::config::{ApiConfig, RetryConfig};
use wiremock::MockServer;

/// Create a client pointed at the mock server with the default retry
/// policy minus the backoff sleeps.
pub fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
    client_with_base(&server.uri(), token)
        .with_retry_policy(RetryPolicy::default().with_backoff_factor(0.0))
}

/// Create a client pointed at the mock server that never retries.
pub fn client_without_retries(server: &MockServer, token: Option<&str>) -> ApiClient {
    client_with_base(&server.uri(), token).with_retry_policy(RetryPolicy::none())
}

/// Create a client for an arbitrary base URL.
pub fn client_with_base(base_url: &str, token: Option<&str>) -> ApiClient {
    let api = ApiConfig {
        base_url: base_url.to_string(),
        auth_token: token.map(String::from),
        timeout_secs: 5.0,
    };
    ApiClient::from_config(&api, &RetryConfig::default()).expect("failed to build test client")
}

/// A local URL nothing listens on, so connecting fails with ECONNREFUSED.
pub fn unused_local_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    let addr = listener.local_addr().expect("no local addr");
    drop(listener);
    format!("http://{addr}")
}

/// Value of a header on a recorded request.
pub fn header_value(request: &wiremock::Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
