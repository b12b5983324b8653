//! Client configuration.

use crate::{retry::Backoff, Error, Result};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default Donately API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.donately.com/v2";

/// Value of the `Donately-Version` header sent with every request.
pub const API_VERSION: &str = "2018-04-01";

/// Configuration for a [`Client`](crate::Client).
///
/// Validated once by [`Client::new`](crate::Client::new); the client never
/// mutates it afterwards.
///
/// ```
/// use donately::ClientConfig;
///
/// let config = ClientConfig {
///     api_key: "sk_live_123".to_string(),
///     retry_enabled: true,
///     ..ClientConfig::default()
/// };
/// assert_eq!(config.base_url, "https://api.donately.com/v2");
/// ```
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    /// Secret key sent as a bearer token. Required.
    pub api_key: String,

    /// API root that request paths are appended to.
    /// Defaults to [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Whether retryable requests may be retried. Defaults to `false`.
    pub retry_enabled: bool,

    /// Log each composed request line before sending. Defaults to `false`.
    pub debug: bool,

    /// Per-attempt transport timeout. Defaults to none.
    pub timeout: Option<Duration>,

    /// Backoff schedule used when retrying.
    pub backoff: Backoff,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_enabled: false,
            debug: false,
            timeout: None,
            backoff: Backoff::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("retry_enabled", &self.retry_enabled)
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl ClientConfig {
    /// Checks the configuration and returns the parsed base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for a missing API key or base URL, an
    /// unusable backoff schedule, or a base URL that cannot carry a path, and
    /// [`Error::InvalidUrl`] if the base URL does not parse.
    pub fn validate(&self) -> Result<Url> {
        if self.api_key.is_empty() {
            return Err(Error::Configuration("missing API key!".to_string()));
        }

        if self.base_url.is_empty() {
            return Err(Error::Configuration("missing base URL!".to_string()));
        }

        let base_url = Url::parse(&self.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Configuration(format!(
                "base URL cannot carry a path: {}",
                self.base_url
            )));
        }

        self.backoff.validate()?;

        Ok(base_url)
    }
}
