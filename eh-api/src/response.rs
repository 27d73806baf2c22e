//! Response body helpers.
//!
//! Error responses from the everHome API use the envelope
//! ```json
//! { "error": { "message": "not found", "reason": "no_such_user" } }
//! ```
//! Anything else falls back to the raw body text.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use serde::Deserialize;

/// Error envelope returned by the API on failed requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<ErrorField>,
}

/// The `error` member: either a structured object or a bare string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ErrorField {
    Detail(ErrorDetail),
    Text(String),
}

/// Structured error detail.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable message.
    pub message: Option<String>,
    /// Machine-oriented reason.
    pub reason: Option<String>,
}

/// Extract `(message, reason)` from an error response body.
///
/// A body that is not an error envelope yields its raw text as the
/// message (or no message when empty) and no reason.
pub fn parse_error_body(body: &str) -> (Option<String>, Option<String>) {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error {
            Some(ErrorField::Detail(detail)) => (detail.message, detail.reason),
            Some(ErrorField::Text(text)) => (Some(text), None),
            None => (None, None),
        },
        Err(_) => {
            let text = (!body.is_empty()).then(|| body.to_string());
            (text, None)
        }
    }
}

/// Parse a success body as JSON; unparseable or empty bodies yield `None`.
pub fn parse_success_body(body: &str) -> Option<serde_json::Value> {
    serde_json::from_str(body).ok()
}

/// Flatten response headers; repeated headers are joined with ", ".
pub fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        map.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    map
}
