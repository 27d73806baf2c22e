//! Request descriptors: body encoding, payloads and query arguments.

use serde_json::{Map, Value};
use url::form_urlencoded;

use eh_core::constants::CONTENT_TYPE_ARG;
use eh_core::error::{EhError, EhResult};

/// MIME type used for JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// How the payload is put on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BodyEncoding {
    /// `Content-Type: application/json`, payload serialized as JSON.
    #[default]
    Json,
    /// The given content type, payload sent unmodified.
    Raw(String),
}

impl BodyEncoding {
    /// Value of the `Content-Type` header.
    pub fn content_type(&self) -> &str {
        match self {
            BodyEncoding::Json => JSON_CONTENT_TYPE,
            BodyEncoding::Raw(ct) => ct,
        }
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A JSON document. Serialized for JSON bodies; form-encoded (objects)
    /// or sent as text (strings) for raw bodies.
    Json(Value),
    /// Bytes sent as-is.
    Raw(Vec<u8>),
}

impl Payload {
    /// Falsy payloads send no body: null, `false`, zero, `""`, `[]`, `{}`
    /// and no bytes.
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Json(Value::Null) => true,
            Payload::Json(Value::Bool(b)) => !b,
            Payload::Json(Value::Number(n)) => n.as_f64() == Some(0.0),
            Payload::Json(Value::String(s)) => s.is_empty(),
            Payload::Json(Value::Array(items)) => items.is_empty(),
            Payload::Json(Value::Object(map)) => map.is_empty(),
            Payload::Raw(bytes) => bytes.is_empty(),
        }
    }

    /// Encode the payload for the given body encoding.
    ///
    /// With a raw encoding a JSON string is sent as its text and a JSON
    /// object as `application/x-www-form-urlencoded` pairs. Other JSON
    /// values are sent in their serialized form.
    pub fn encode(&self, encoding: &BodyEncoding) -> EhResult<Vec<u8>> {
        match (self, encoding) {
            (Payload::Raw(bytes), _) => Ok(bytes.clone()),
            (Payload::Json(Value::String(s)), BodyEncoding::Raw(_)) => Ok(s.as_bytes().to_vec()),
            (Payload::Json(Value::Object(map)), BodyEncoding::Raw(_)) => form_encode(map),
            (Payload::Json(value), _) => Ok(serde_json::to_vec(value)?),
        }
    }
}

/// Form-encode the members of a JSON object.
///
/// Arrays repeat their key, nulls are skipped. Nested arrays or objects
/// have no form representation and are rejected.
fn form_encode(map: &Map<String, Value>) -> EhResult<Vec<u8>> {
    let mut form = form_urlencoded::Serializer::new(String::new());
    for (key, value) in map {
        let values = match value {
            Value::Array(items) => items.as_slice(),
            other => std::slice::from_ref(other),
        };
        for item in values {
            match item {
                Value::Null => {}
                Value::String(s) => {
                    form.append_pair(key, s);
                }
                Value::Bool(_) | Value::Number(_) => {
                    form.append_pair(key, &item.to_string());
                }
                Value::Array(_) | Value::Object(_) => {
                    return Err(EhError::InvalidRequest(format!(
                        "cannot form-encode nested value of `{key}`"
                    )));
                }
            }
        }
    }
    Ok(form.finish().into_bytes())
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Raw(bytes)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Raw(text.as_bytes().to_vec())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Raw(text.into_bytes())
    }
}

/// Per-request options: body encoding and query arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub encoding: BodyEncoding,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send the payload unmodified with the given content type.
    pub fn raw(mut self, content_type: impl Into<String>) -> Self {
        self.encoding = BodyEncoding::Raw(content_type.into());
        self
    }

    /// Set a query argument, replacing an earlier value for the same key.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_query(key.into(), value.into());
        self
    }

    /// Merge an argument mapping into these options.
    ///
    /// Later keys replace earlier ones. A `content_type` argument selects
    /// a raw body with that content type and is never sent as a query
    /// argument.
    pub fn with_args<I, K, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in args {
            let (key, value) = (key.into(), value.into());
            if key == CONTENT_TYPE_ARG {
                self.encoding = BodyEncoding::Raw(value);
            } else {
                self.set_query(key, value);
            }
        }
        self
    }

    fn set_query(&mut self, key: String, value: String) {
        match self.query.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.query.push((key, value)),
        }
    }
}

/// Whether `url` starts with a URL scheme (`scheme://`).
pub fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Join a relative path onto `base_url`; absolute URLs are returned unchanged.
pub fn resolve_url(base_url: &str, url: &str) -> String {
    if has_scheme(url) {
        url.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_relative_url() {
        assert_eq!(
            resolve_url("https://everhome.cloud/", "user/current"),
            "https://everhome.cloud/user/current"
        );
        assert_eq!(
            resolve_url("http://127.0.0.1:8080", "/devices"),
            "http://127.0.0.1:8080/devices"
        );
    }

    #[test]
    fn test_resolve_absolute_url_untouched() {
        let url = "http://other.example/api/v1?x=1";
        assert_eq!(resolve_url("https://everhome.cloud/", url), url);
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://everhome.cloud"));
        assert!(has_scheme("svn+ssh://host/repo"));
        assert!(!has_scheme("user/current"));
        assert!(!has_scheme("localhost:8080/devices"));
        assert!(!has_scheme("devices?next=http://x"));
    }

    #[test]
    fn test_with_args_lifts_content_type() {
        let options = RequestOptions::new().with_args([
            ("limit", "10"),
            ("content_type", "text/plain"),
            ("limit", "20"),
        ]);
        assert_eq!(options.encoding, BodyEncoding::Raw("text/plain".into()));
        assert_eq!(options.query, vec![("limit".to_string(), "20".to_string())]);
    }

    #[test]
    fn test_json_encoding() {
        let payload = Payload::from(json!({"name": "lamp"}));
        let body = payload.encode(&BodyEncoding::Json).unwrap();
        assert_eq!(body, br#"{"name":"lamp"}"#.to_vec());
        assert_eq!(BodyEncoding::Json.content_type(), "application/json");
    }

    #[test]
    fn test_raw_encoding_keeps_text() {
        let encoding = BodyEncoding::Raw("text/plain".into());
        let body = Payload::from(json!("on")).encode(&encoding).unwrap();
        assert_eq!(body, b"on".to_vec());
        let body = Payload::from("a=b&c=d").encode(&encoding).unwrap();
        assert_eq!(body, b"a=b&c=d".to_vec());
        assert_eq!(encoding.content_type(), "text/plain");
    }

    #[test]
    fn test_raw_encoding_form_encodes_objects() {
        let encoding = BodyEncoding::Raw("application/x-www-form-urlencoded".into());
        let payload = Payload::from(json!({
            "state": "on",
            "level": 3,
            "rooms": ["a b", "c"],
            "skip": null,
            "dim": true,
        }));
        let body = payload.encode(&encoding).unwrap();
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "dim=true&level=3&rooms=a+b&rooms=c&state=on"
        );
    }

    #[test]
    fn test_raw_encoding_rejects_nested_objects() {
        let encoding = BodyEncoding::Raw("application/x-www-form-urlencoded".into());
        let payload = Payload::from(json!({"state": {"on": true}}));
        assert!(matches!(
            payload.encode(&encoding),
            Err(EhError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_empty_payloads() {
        assert!(Payload::Json(json!({})).is_empty());
        assert!(Payload::Json(json!(null)).is_empty());
        assert!(Payload::Json(json!(false)).is_empty());
        assert!(Payload::Json(json!(0)).is_empty());
        assert!(Payload::Json(json!(0.0)).is_empty());
        assert!(Payload::Raw(Vec::new()).is_empty());
        assert!(!Payload::Json(json!(true)).is_empty());
        assert!(!Payload::Json(json!(-1)).is_empty());
        assert!(!Payload::Json(json!({"a": 1})).is_empty());
    }
}
