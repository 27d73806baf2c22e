//! Error types for the everHome client.
//!
//! Every failure is unified into `EhError`. Failures reported by the API
//! itself (error statuses and retry exhaustion) are carried by `ApiError`,
//! the single error kind callers inspect to tell e.g. auth failures from
//! rate limiting.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::constants;

/// Convenience type alias for Results using EhError.
pub type EhResult<T> = Result<T, EhError>;

/// Error returned by the everHome API or by the retry layer in front of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status of the failed response, or 429 after retry exhaustion.
    pub http_status: u16,
    /// API-specific error code. The service never sends one, so this is -1.
    pub error_code: i32,
    /// Request URL (or path) combined with the error detail.
    pub message: String,
    /// The part of `message` taken from the response body, if any.
    pub detail: Option<String>,
    /// Machine-oriented reason from the API or the transport layer.
    pub reason: Option<String>,
    /// Response headers; only present for direct HTTP error responses.
    pub headers: Option<BTreeMap<String, String>>,
}

impl ApiError {
    /// Build an error for a response with the given status.
    ///
    /// `context` is the request URL or path; `detail` is appended after it.
    pub fn new(http_status: u16, context: &str, detail: Option<String>) -> Self {
        let message = match detail.as_deref() {
            Some(d) => format!("{context}: {d}"),
            None => format!("{context}: no error message"),
        };
        Self {
            http_status,
            error_code: constants::UNSET_ERROR_CODE,
            message,
            detail,
            reason: None,
            headers: None,
        }
    }

    /// Build the error raised when the retry budget is used up.
    pub fn max_retries(path: &str, reason: Option<String>) -> Self {
        Self::new(
            constants::MAX_RETRIES_STATUS,
            path,
            Some(constants::MAX_RETRIES_MESSAGE.to_string()),
        )
        .with_reason(reason)
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Look up a response header by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }

    /// Whether the status signals rejected credentials.
    pub fn is_auth_failure(&self) -> bool {
        self.http_status == 401 || self.http_status == 403
    }

    /// Whether the status signals rate limiting or retry exhaustion.
    pub fn is_rate_limited(&self) -> bool {
        self.http_status == 429
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "http status: {}, code: {} - {}, reason: {}",
            self.http_status,
            self.error_code,
            self.message,
            self.reason.as_deref().unwrap_or("None")
        )
    }
}

impl std::error::Error for ApiError {}

/// Unified error type for the everHome crates.
#[derive(Error, Debug)]
pub enum EhError {
    // -- Configuration errors --
    /// Failed to load, parse or validate configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Network errors --
    /// HTTP transport failure that is not retried.
    #[error("http error: {0}")]
    Http(String),

    /// Request timed out while reading the response.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// The request could not be built (bad URL, header or method).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The API answered with an error, or retries were exhausted.
    #[error(transparent)]
    Api(#[from] ApiError),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl EhError {
    /// The API error, if this failure came from the API.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            EhError::Api(e) => Some(e),
            _ => None,
        }
    }

    /// HTTP status of the API error, if any.
    pub fn http_status(&self) -> Option<u16> {
        self.as_api().map(|e| e.http_status)
    }
}

impl From<serde_json::Error> for EhError {
    fn from(e: serde_json::Error) -> Self {
        EhError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for EhError {
    fn from(e: toml::de::Error) -> Self {
        EhError::Config(e.to_string())
    }
}
