//! Application-wide constants.

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory name used under the platform config/data dirs.
pub const APP_DIR_NAME: &str = "everhome";

/// Origin of the everHome cloud API.
pub const DEFAULT_BASE_URL: &str = "https://everhome.cloud/";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;

/// Error code carried by every API error; the service never supplies one.
pub const UNSET_ERROR_CODE: i32 = -1;

/// Status reported when the retry budget is used up.
pub const MAX_RETRIES_STATUS: u16 = 429;

/// Message suffix for retry exhaustion errors.
pub const MAX_RETRIES_MESSAGE: &str = "Max Retries";

/// Query argument name that selects a raw body with the given content type.
pub const CONTENT_TYPE_ARG: &str = "content_type";

/// Environment variable holding the bearer token.
pub const ENV_TOKEN: &str = "EVERHOME_TOKEN";

/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "EVERHOME_BASE_URL";

/// Default retry settings.
pub mod retry {
    /// Maximum number of retries after the first attempt.
    pub const TOTAL: u32 = 3;
    /// Exponential backoff factor in seconds.
    pub const BACKOFF_FACTOR: f64 = 0.3;
    /// Upper bound for a single backoff sleep in seconds.
    pub const BACKOFF_MAX_SECS: f64 = 120.0;
    /// Response statuses that trigger a retry.
    pub const STATUS_FORCELIST: &[u16] = &[429, 500, 502, 503, 504];
    /// Methods eligible for status retries.
    pub const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE"];
    /// Statuses whose `Retry-After` header is honored.
    pub const RETRY_AFTER_STATUSES: &[u16] = &[413, 429, 503];
}

/// API paths relative to the base URL.
pub mod paths {
    /// Currently authenticated user.
    pub const CURRENT_USER: &str = "user/current";
    /// Device list, also used by the self-test.
    pub const DEVICES: &str = "devices";
}
