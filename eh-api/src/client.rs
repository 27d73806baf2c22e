//! HTTP client for the everHome cloud REST API.
//!
//! Handles bearer authentication, URL resolution, body encoding, timeout
//! management, the retry policy, and translation of failures into
//! `ApiError`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use eh_core::config::{ApiConfig, AppConfig, RetryConfig};
use eh_core::error::{ApiError, EhError, EhResult};

use crate::request::{resolve_url, Payload, RequestOptions};
use crate::response::{header_map, parse_error_body, parse_success_body};
use crate::retry::RetryPolicy;

/// HTTP client for the everHome API.
///
/// Cloning is cheap: clones share the connection pool, the retry policy
/// and the token slot, so `set_auth` on one clone affects all of them.
#[derive(Clone)]
pub struct ApiClient {
    inner: Client,
    /// Origin relative paths are joined to (e.g. "https://everhome.cloud/").
    base_url: String,
    /// Bearer token, read once at the start of every call.
    auth_token: Arc<RwLock<Option<String>>>,
    /// Per-request timeout.
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl ApiClient {
    /// Create a client for the default origin with the default retry policy
    /// and a 5 second timeout.
    pub fn new(auth_token: Option<String>) -> EhResult<Self> {
        Self::from_config(&ApiConfig::with_token(auth_token), &RetryConfig::default())
    }

    /// Create a client from the `[api]` and `[retry]` configuration sections.
    pub fn from_config(api: &ApiConfig, retry: &RetryConfig) -> EhResult<Self> {
        let timeout = Duration::try_from_secs_f64(api.timeout_secs)
            .ok()
            .filter(|t| !t.is_zero())
            .ok_or_else(|| {
                EhError::Config(format!("invalid request timeout: {}", api.timeout_secs))
            })?;

        let base_url = AppConfig::sanitize_base_url(&api.base_url);
        if base_url.is_empty() {
            return Err(EhError::MissingConfig("api.base_url".into()));
        }
        Url::parse(&base_url)
            .map_err(|e| EhError::Config(format!("invalid base url {base_url}: {e}")))?;

        let inner = Client::builder()
            .connect_timeout(timeout)
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| EhError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner,
            base_url,
            auth_token: Arc::new(RwLock::new(api.auth_token.clone())),
            timeout,
            retry_policy: RetryPolicy::from_config(retry)?,
        })
    }

    /// Set a custom retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Replace the bearer token used by subsequent calls.
    ///
    /// Calls already in flight keep the token they started with.
    pub async fn set_auth(&self, token: Option<String>) {
        let mut guard = self.auth_token.write().await;
        *guard = token;
        debug!(
            "auth token {}",
            if guard.is_some() { "replaced" } else { "cleared" }
        );
    }

    /// The token the next call will use.
    pub async fn auth_token(&self) -> Option<String> {
        self.auth_token.read().await.clone()
    }

    /// Resolve `url` against the base URL and append the query arguments.
    fn request_url(&self, url: &str, options: &RequestOptions) -> EhResult<Url> {
        let resolved = resolve_url(&self.base_url, url);
        let mut parsed = Url::parse(&resolved)
            .map_err(|e| EhError::InvalidRequest(format!("invalid url {resolved}: {e}")))?;
        if !options.query.is_empty() {
            parsed.query_pairs_mut().extend_pairs(&options.query);
        }
        Ok(parsed)
    }

    /// Issue a request and return the parsed JSON body.
    ///
    /// Successful responses whose body is not JSON yield `Ok(None)`.
    /// Error statuses and retry exhaustion yield `EhError::Api`.
    pub async fn call(
        &self,
        method: Method,
        url: &str,
        payload: Option<&Payload>,
        options: &RequestOptions,
    ) -> EhResult<Option<serde_json::Value>> {
        let url = self.request_url(url, options)?;
        let token = self.auth_token().await;

        let content_type = HeaderValue::from_str(options.encoding.content_type())
            .map_err(|e| EhError::InvalidRequest(format!("invalid content type: {e}")))?;
        let authorization = token
            .as_deref()
            .map(|t| {
                HeaderValue::from_str(&format!("Bearer {t}"))
                    .map_err(|e| EhError::InvalidRequest(format!("invalid auth token: {e}")))
            })
            .transpose()?;
        let body = match payload.filter(|p| !p.is_empty()) {
            Some(p) => Some(p.encode(&options.encoding)?),
            None => None,
        };

        debug!(
            "sending {} to {} with content type {:?}, {} body bytes",
            method,
            url,
            options.encoding.content_type(),
            body.as_ref().map_or(0, Vec::len)
        );

        let prepared = PreparedRequest {
            method,
            url,
            content_type,
            authorization,
            body,
        };
        let response = self.send_with_retry(&prepared).await?;

        if response.status().is_client_error() || response.status().is_server_error() {
            let err = Self::error_from_response(response).await;
            error!(
                "HTTP error for {} to {} returned {} due to {}",
                prepared.method,
                prepared.url,
                err.http_status,
                err.detail.as_deref().unwrap_or("no message")
            );
            return Err(err.into());
        }

        let text = response.text().await.map_err(Self::classify_error)?;
        let result = parse_success_body(&text);
        if result.is_none() {
            debug!(
                "{} {} returned a body that is not JSON ({} bytes), treating as empty",
                prepared.method,
                prepared.url,
                text.len()
            );
        }
        Ok(result)
    }

    fn build_request(&self, prepared: &PreparedRequest) -> RequestBuilder {
        let mut builder = self
            .inner
            .request(prepared.method.clone(), prepared.url.clone())
            .timeout(self.timeout)
            .header(CONTENT_TYPE, prepared.content_type.clone());
        if let Some(auth) = &prepared.authorization {
            builder = builder.header(AUTHORIZATION, auth.clone());
        }
        if let Some(body) = &prepared.body {
            builder = builder.body(body.clone());
        }
        builder
    }

    /// Execute a request under the retry policy.
    ///
    /// Returns the first response that is not retried. Running out of
    /// retries on a retryable status or connection failure is reported as
    /// a 429 "Max Retries" error.
    async fn send_with_retry(&self, prepared: &PreparedRequest) -> EhResult<Response> {
        let policy = &self.retry_policy;
        let mut errors: u32 = 0;

        loop {
            match self.build_request(prepared).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !policy.is_status_retryable(&prepared.method, status) {
                        return Ok(response);
                    }

                    if errors >= policy.total {
                        let reason = format!("too many {} error responses", status.as_u16());
                        return Err(Self::max_retries(prepared, reason));
                    }

                    errors += 1;
                    let delay = policy
                        .retry_after(&response)
                        .unwrap_or_else(|| policy.backoff(errors));
                    warn!(
                        "retryable status {} from {} {} (retry {}/{}) after {:.1}s",
                        status.as_u16(),
                        prepared.method,
                        prepared.url.path(),
                        errors,
                        policy.total,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if !policy.is_error_retryable(&prepared.method, &e) {
                        return Err(Self::classify_error(e));
                    }

                    if errors >= policy.total {
                        return Err(Self::max_retries(prepared, e.to_string()));
                    }

                    errors += 1;
                    let delay = policy.backoff(errors);
                    warn!(
                        "retryable error on {} {} (retry {}/{}) after {:.1}s: {}",
                        prepared.method,
                        prepared.url.path(),
                        errors,
                        policy.total,
                        delay.as_secs_f64(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn max_retries(prepared: &PreparedRequest, reason: String) -> EhError {
        error!(
            "max retries reached for {} {}: {}",
            prepared.method, prepared.url, reason
        );
        ApiError::max_retries(&path_url(&prepared.url), Some(reason)).into()
    }

    /// Translate an error response into an `ApiError`.
    async fn error_from_response(response: Response) -> ApiError {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = header_map(response.headers());
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                debug!("failed to read error body from {}: {}", url, e);
                String::new()
            }
        };
        let (detail, reason) = parse_error_body(&text);

        ApiError::new(status, &url, detail)
            .with_reason(reason)
            .with_headers(headers)
    }

    /// Classify a reqwest error that is not retried.
    fn classify_error(e: reqwest::Error) -> EhError {
        if e.is_timeout() {
            EhError::Timeout(e.to_string())
        } else if e.is_connect() {
            EhError::Http(format!("connection failed: {e}"))
        } else if e.is_builder() {
            EhError::InvalidRequest(e.to_string())
        } else {
            EhError::Http(e.to_string())
        }
    }

    // --- Verb wrappers ---

    /// GET `url` and return the parsed JSON body.
    pub async fn get(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> EhResult<Option<serde_json::Value>> {
        self.call(Method::GET, url, None, &options).await
    }

    /// POST `payload` to `url`.
    pub async fn post(
        &self,
        url: &str,
        payload: Option<Payload>,
        options: RequestOptions,
    ) -> EhResult<Option<serde_json::Value>> {
        self.call(Method::POST, url, payload.as_ref(), &options).await
    }

    /// PUT `payload` to `url`.
    pub async fn put(
        &self,
        url: &str,
        payload: Option<Payload>,
        options: RequestOptions,
    ) -> EhResult<Option<serde_json::Value>> {
        self.call(Method::PUT, url, payload.as_ref(), &options).await
    }

    /// DELETE `url`, optionally with a body.
    pub async fn delete(
        &self,
        url: &str,
        payload: Option<Payload>,
        options: RequestOptions,
    ) -> EhResult<Option<serde_json::Value>> {
        self.call(Method::DELETE, url, payload.as_ref(), &options).await
    }

    /// Convenience: GET + deserialize into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> EhResult<Option<T>> {
        match self.get(url, options).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

/// A request resolved once and replayed on every attempt.
struct PreparedRequest {
    method: Method,
    url: Url,
    content_type: HeaderValue,
    authorization: Option<HeaderValue>,
    body: Option<Vec<u8>>,
}

/// Path plus query of a URL, e.g. "/devices?limit=10".
fn path_url(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
