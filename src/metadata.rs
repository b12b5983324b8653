//! Request metadata: what to call and how to encode it.

use crate::envelope::{ContentType, Params};
use http::Method;

/// Metadata for an individual API request.
///
/// Path segments are kept unescaped and appended to the client's base URL by
/// the executor, which percent-escapes each one.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// Path segments relative to the base URL, e.g. `["people", "p_1"]`.
    pub segments: Vec<String>,

    /// Query parameters for this request.
    pub query: Params,

    /// Content type of the request body.
    pub content_type: ContentType,

    /// Whether the retry policy may repeat this request.
    pub retryable: bool,
}

impl RequestMetadata {
    /// Creates a new `RequestMetadata` with the given method and path segments.
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Params::new(),
            content_type: ContentType::Json,
            retryable: false,
        }
    }

    /// Replaces the query parameters.
    pub fn with_query(mut self, query: Params) -> Self {
        self.query = query;
        self
    }

    /// Adds a single query parameter.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.set(key, value);
        self
    }

    /// Sets the body content type.
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Opts this request into the client's retry policy.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    /// The unescaped path, for logs.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}
