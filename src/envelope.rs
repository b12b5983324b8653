//! The uniform response envelope and request body encoding.
//!
//! Every Donately response is wrapped as
//! `{"data": ..., "type": ..., "message": ..., "code": ..., "request_id": ...}`.
//! Requests carry either a JSON body or a form-urlencoded one.

use crate::{Error, Result};
use http::HeaderValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use url::form_urlencoded;

/// The response wrapper returned by every API call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The payload of a successful call. `Null` when absent.
    #[serde(default)]
    pub data: Value,

    /// Error category, set together with `message` and `code` on API errors.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    /// Human readable error message.
    #[serde(default)]
    pub message: Option<String>,

    /// Machine readable error code.
    #[serde(default)]
    pub code: Option<String>,

    /// Opaque tracing token assigned by the server.
    #[serde(default)]
    pub request_id: Option<String>,
}

impl Envelope {
    /// Parses a raw response body into an envelope.
    ///
    /// A JSON `null` body decodes to an empty envelope.
    pub fn decode(raw: &[u8]) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_slice::<Option<Self>>(raw).map(Option::unwrap_or_default)
    }

    /// Returns `(code, type, message)` when all three are present and non-empty.
    pub fn api_error(&self) -> Option<(&str, &str, &str)> {
        fn non_empty(field: &Option<String>) -> Option<&str> {
            field.as_deref().filter(|s| !s.is_empty())
        }

        Some((
            non_empty(&self.code)?,
            non_empty(&self.kind)?,
            non_empty(&self.message)?,
        ))
    }
}

/// The content type of a request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentType {
    /// `application/json`
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
}

impl ContentType {
    /// The MIME type sent in the `Content-Type` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Form => "application/x-www-form-urlencoded",
        }
    }

    pub(crate) fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

/// A flat, ordered set of string key/value pairs.
///
/// Used both for query strings and for form bodies. Setting a key twice
/// replaces the earlier value; encoding emits keys in sorted order.
///
/// ```
/// use donately::Params;
///
/// let mut params = Params::new();
/// params.set("limit", "20");
/// params.set("account_id", "acc 1");
/// assert_eq!(params.encode(), "account_id=acc+1&limit=20");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Sets `key` only when `value` is non-empty.
    pub fn set_non_empty(&mut self, key: &str, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.set(key, value);
        }
        self
    }

    /// Sets `key` to the decimal form of `value` only when it is positive.
    pub fn set_positive(&mut self, key: &str, value: i64) -> &mut Self {
        if value > 0 {
            self.set(key, value.to_string());
        }
        self
    }

    /// Returns the value stored for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encodes the pairs as `application/x-www-form-urlencoded`.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

/// Encodes a request body for the given content type.
///
/// JSON bodies accept anything serializable. Form bodies must serialize to a
/// flat map whose values are strings (or lists of strings, sent as repeated
/// keys); any other shape fails with [`Error::Encoding`].
pub fn encode_body<B>(body: &B, content_type: ContentType) -> Result<Vec<u8>>
where
    B: Serialize + ?Sized,
{
    match content_type {
        ContentType::Json => serde_json::to_vec(body).map_err(|e| Error::Encoding(e.to_string())),
        ContentType::Form => {
            let value = serde_json::to_value(body).map_err(|e| Error::Encoding(e.to_string()))?;
            let Value::Object(fields) = value else {
                return Err(Error::Encoding(
                    "form-encoded bodies must be a flat map of string values".to_string(),
                ));
            };

            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (key, value) in &fields {
                match value {
                    Value::String(s) => {
                        serializer.append_pair(key, s);
                    }
                    Value::Array(items) => {
                        for item in items {
                            let Value::String(s) = item else {
                                return Err(Error::Encoding(format!(
                                    "form field `{key}` must contain only strings"
                                )));
                            };
                            serializer.append_pair(key, s);
                        }
                    }
                    _ => {
                        return Err(Error::Encoding(format!(
                            "form field `{key}` must be a string"
                        )))
                    }
                }
            }

            Ok(serializer.finish().into_bytes())
        }
    }
}
