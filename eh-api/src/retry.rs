//! Retry policy shared by every request of a client.
//!
//! The schedule follows urllib3: no sleep before the first retry, then
//! `backoff_factor * 2^(n-1)` seconds after the n-th consecutive failure,
//! capped at `backoff_max`. A numeric `Retry-After` header on 413/429/503
//! replaces the backoff when enabled.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Method, Response, StatusCode};

use eh_core::config::RetryConfig;
use eh_core::constants;
use eh_core::error::{EhError, EhResult};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub total: u32,
    pub backoff_factor: f64,
    pub backoff_max: Duration,
    pub status_forcelist: Vec<u16>,
    pub allowed_methods: Vec<Method>,
    pub retry_connect: bool,
    pub retry_read: bool,
    pub respect_retry_after: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            total: constants::retry::TOTAL,
            backoff_factor: constants::retry::BACKOFF_FACTOR,
            backoff_max: Duration::from_secs_f64(constants::retry::BACKOFF_MAX_SECS),
            status_forcelist: constants::retry::STATUS_FORCELIST.to_vec(),
            allowed_methods: vec![Method::GET, Method::POST, Method::PUT, Method::DELETE],
            retry_connect: true,
            retry_read: false,
            respect_retry_after: true,
        }
    }
}

impl RetryPolicy {
    /// Build a policy from the `[retry]` configuration section.
    pub fn from_config(config: &RetryConfig) -> EhResult<Self> {
        let allowed_methods = config
            .allowed_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                    .map_err(|_| EhError::Config(format!("invalid retry method: {m}")))
            })
            .collect::<EhResult<Vec<_>>>()?;

        let secs = |v: f64, field: &str| {
            Duration::try_from_secs_f64(v)
                .map_err(|_| EhError::Config(format!("invalid retry.{field}: {v}")))
        };
        // backoff() multiplies the raw factor, so it must be a valid duration.
        secs(config.backoff_factor, "backoff_factor")?;

        Ok(Self {
            total: config.total,
            backoff_factor: config.backoff_factor,
            backoff_max: secs(config.backoff_max_secs, "backoff_max_secs")?,
            status_forcelist: config.status_forcelist.clone(),
            allowed_methods,
            retry_connect: config.retry_connect,
            retry_read: config.retry_read,
            respect_retry_after: config.respect_retry_after,
        })
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            total: 0,
            status_forcelist: Vec::new(),
            retry_connect: false,
            retry_read: false,
            ..Self::default()
        }
    }

    /// Replace the backoff factor (tests use 0 to avoid sleeping).
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn is_method_retryable(&self, method: &Method) -> bool {
        self.allowed_methods.contains(method)
    }

    /// Whether a response with this status should be retried.
    pub fn is_status_retryable(&self, method: &Method, status: StatusCode) -> bool {
        self.is_method_retryable(method) && self.status_forcelist.contains(&status.as_u16())
    }

    /// Whether a transport error should be retried.
    ///
    /// Connection failures are retried for any method; read failures only
    /// when enabled and for allowed methods.
    pub fn is_error_retryable(&self, method: &Method, error: &reqwest::Error) -> bool {
        if error.is_connect() {
            self.retry_connect
        } else if error.is_timeout() {
            self.retry_read && self.is_method_retryable(method)
        } else {
            false
        }
    }

    /// Sleep before the next attempt after `consecutive_errors` failures.
    pub fn backoff(&self, consecutive_errors: u32) -> Duration {
        if consecutive_errors <= 1 {
            return Duration::ZERO;
        }
        let exponent = (consecutive_errors - 1).min(63) as i32;
        let secs = self.backoff_factor * 2f64.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .map(|d| d.min(self.backoff_max))
            .unwrap_or(self.backoff_max)
    }

    /// The server-requested delay, when it should be honored.
    pub fn retry_after(&self, response: &Response) -> Option<Duration> {
        if !self.respect_retry_after
            || !constants::retry::RETRY_AFTER_STATUSES.contains(&response.status().as_u16())
        {
            return None;
        }
        response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after)
    }
}

/// Parse a `Retry-After` value given in seconds.
///
/// HTTP-date values are not supported and yield `None`, which falls back
/// to the regular backoff.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<u64>().ok().map(Duration::from_secs)
}
