//! Error types for Donately API calls.
//!
//! Every failure the client can produce is a variant of [`Error`]. The variant
//! tells the caller *where* things went wrong (configuration, local validation,
//! transport, response decoding, API or HTTP level) and carries the structured
//! details (API code, HTTP status, raw body) needed to act on it.

use crate::envelope::Envelope;
use http::StatusCode;
use std::time::Duration;

/// The main error type for Donately API calls.
///
/// # Examples
///
/// ```no_run
/// use donately::{Client, DonatelyApi, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder().api_key("sk_live_123").build()?;
///
/// match client.find_account("acc_123").await {
///     Ok(account) => println!("Account: {}", account.title),
///     Err(Error::Api { code, message, .. }) => {
///         eprintln!("Donately rejected the call ({code}): {message}");
///     }
///     Err(Error::HttpError { status, raw_response, .. }) => {
///         eprintln!("HTTP error {status}: {raw_response}");
///     }
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The client was configured incorrectly (missing API key, empty base URL,
    /// invalid header value...). Raised before any network activity.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The base URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A record is missing a relationship the API requires (for example a
    /// person without an account). Raised before any network activity.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request body could not be encoded for the requested content type.
    #[error("Failed to encode request body: {0}")]
    Encoding(String),

    /// A network-level error occurred (connection failed, DNS lookup failed, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The transport gave up waiting for the server.
    #[error("Request timed out")]
    Timeout,

    /// The response body was not a valid envelope, or the envelope's `data`
    /// did not match the expected payload shape.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw body (or `data` payload) that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The server answered with a structured `type`/`message`/`code` triple.
    #[error("API error: {code} - ({kind}) {message}")]
    Api {
        /// Machine readable error code, e.g. `invalid_api_key`
        code: String,
        /// The envelope's `type` field
        kind: String,
        /// Human readable message
        message: String,
        /// Tracing token assigned by the server, if any
        request_id: Option<String>,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The server returned a status >= 400 without an API error triple.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
        /// The decoded envelope, kept for diagnostics
        envelope: Envelope,
    },

    /// The server asked the client to come back later.
    ///
    /// Wraps the underlying decode failure. Only this variant drives the
    /// retry policy, and only when `can_retry` is set.
    #[error("Retryable error: {source}")]
    Retryable {
        /// The underlying failure
        #[source]
        source: Box<Error>,
        /// Whether the retry policy may repeat the request
        can_retry: bool,
    },

    /// The backoff schedule ran out of attempts.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// The number of attempts made
        attempts: usize,
        /// The last error encountered
        last_error: Box<Error>,
    },

    /// The next retry would have started after the configured deadline.
    #[error("Retry deadline exceeded after {attempts} attempts ({elapsed:?}): {last_error}")]
    RetryDeadlineExceeded {
        /// The number of attempts made
        attempts: usize,
        /// Time spent since the first attempt
        elapsed: Duration,
        /// The last error encountered
        last_error: Box<Error>,
    },
}

impl Error {
    /// Returns `true` if the retry policy is allowed to repeat the request.
    ///
    /// Only a [`Error::Retryable`] marked `can_retry` qualifies. API errors,
    /// HTTP errors and transport errors are never retried by this client.
    ///
    /// ```
    /// use donately::Error;
    ///
    /// let err = Error::Retryable {
    ///     source: Box::new(Error::Timeout),
    ///     can_retry: true,
    /// };
    /// assert!(err.is_retryable());
    /// assert!(!Error::Timeout.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Retryable { can_retry: true, .. })
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. }
            | Error::Api { status, .. }
            | Error::DeserializationFailed { status, .. } => Some(*status),
            Error::Retryable { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            Error::Retryable { source, .. } => source.raw_response(),
            _ => None,
        }
    }

    /// Returns the API error code (e.g. `invalid_api_key`) for [`Error::Api`].
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Error::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// A specialized `Result` type for Donately API calls.
pub type Result<T> = std::result::Result<T, Error>;
