//! Response wrapper that preserves both parsed data and raw response details.

use crate::{envelope::Envelope, Error, Result};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// A wrapper around a successful HTTP response.
///
/// Carries the decoded data along with the raw body, status, headers, the
/// total latency across all attempts, and the number of attempts made.
///
/// ```no_run
/// use donately::{Client, RequestMetadata};
/// use http::Method;
///
/// # async fn example() -> Result<(), donately::Error> {
/// let client = Client::builder().api_key("sk_live_123").build()?;
///
/// let response = client
///     .call::<()>(RequestMetadata::new(Method::GET, ["me"]), None)
///     .await?;
///
/// println!("Request {:?} took {:?}", response.data.request_id, response.latency);
/// let me: serde_json::Value = response.into_data()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response data.
    pub data: T,

    /// The raw response body as a string.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The total latency of the request, including all retry attempts.
    pub latency: Duration,

    /// The number of attempts made to complete this request.
    ///
    /// `1` for requests that succeeded on the first try.
    pub attempts: usize,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
            attempts,
        }
    }

    /// Maps the response data to a different type, keeping the metadata.
    ///
    /// ```
    /// # use donately::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     42,
    ///     "42".to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    ///     1,
    /// );
    ///
    /// let string_response = response.map(|n| n.to_string());
    /// assert_eq!(string_response.data, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Returns `true` if the request required retries.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl Response<Envelope> {
    /// Decodes the envelope's `data` into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] if the payload does not match
    /// the shape of `T`.
    pub fn into_data<T>(self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = self.status;
        let data = self.data.data;

        T::deserialize(&data).map_err(|e| {
            tracing::error!(error = %e, "Failed to decode response data");
            Error::DeserializationFailed {
                raw_response: data.to_string(),
                serde_error: e.to_string(),
                status,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    fn envelope_response(data: serde_json::Value) -> Response<Envelope> {
        Response::new(
            Envelope {
                data,
                ..Envelope::default()
            },
            String::new(),
            StatusCode::OK,
            HeaderMap::new(),
            Duration::from_millis(5),
            1,
        )
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut response = envelope_response(json!(null));
        response
            .headers
            .insert("x-request-id", "req_42".parse().unwrap());

        assert_eq!(response.header("X-Request-Id"), Some("req_42"));
        assert_eq!(response.header("retry-after"), None);
        assert!(!response.was_retried());
    }

    #[test]
    fn into_data_decodes_payload() {
        let items: Vec<Item> = envelope_response(json!([{"id": "a"}, {"id": "b"}]))
            .into_data()
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id, "b");
    }

    #[test]
    fn into_data_reports_shape_mismatch() {
        let err = envelope_response(json!({"id": 7}))
            .into_data::<Item>()
            .unwrap_err();

        match err {
            Error::DeserializationFailed {
                raw_response,
                status,
                ..
            } => {
                assert_eq!(raw_response, r#"{"id":7}"#);
                assert_eq!(status, StatusCode::OK);
            }
            other => panic!("expected DeserializationFailed, got {other:?}"),
        }
    }
}
