//! HTTP client with envelope decoding, error classification and retries.
//!
//! The [`Client`] type is the main entry point. Use [`ClientBuilder`] or
//! [`Client::new`] with a [`ClientConfig`] to create one. The resource
//! operations live on the [`DonatelyApi`](crate::DonatelyApi) trait.

use crate::{
    classify::classify,
    config::{ClientConfig, API_VERSION},
    envelope::{encode_body, Envelope},
    metadata::RequestMetadata,
    retry::{Backoff, RetryOnRetryable, RetryPredicate},
    transport::{HttpRequest, ReqwestTransport, Transport},
    Error, Response, Result,
};
use http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderMap, HeaderName, HeaderValue, Method, Version,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::{Position, Url};

const DONATELY_VERSION: HeaderName = HeaderName::from_static("donately-version");

/// A Donately API client.
///
/// The client is cheap to clone and safe to share between tasks: it holds
/// only immutable configuration and a shared transport handle, and keeps no
/// per-call state.
///
/// # Examples
///
/// ```no_run
/// use donately::{Client, DonatelyApi};
///
/// # async fn example() -> Result<(), donately::Error> {
/// let client = Client::builder()
///     .api_key("sk_live_123")
///     .retry(true)
///     .build()?;
///
/// let account = client.find_account("acc_123").await?;
/// let people = client.list_people(&account, 0, 50).await?;
/// println!("{} has {} people", account.title, people.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    base_url: Url,
    default_headers: HeaderMap,
    transport: Arc<dyn Transport>,
    retry_predicate: Box<dyn RetryPredicate>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client from a configuration record using the default transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid (see
    /// [`ClientConfig::validate`]).
    pub fn new(config: ClientConfig) -> Result<Self> {
        ClientBuilder::new().config(config).build()
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Makes an API request and returns the decoded envelope.
    ///
    /// The body is encoded once according to `metadata.content_type`. If the
    /// client has retry enabled and the request is marked
    /// [`retryable`](RequestMetadata::retryable), failures the retry predicate
    /// accepts are retried with exponential backoff; every other failure is
    /// returned as soon as it occurs.
    ///
    /// Dropping the returned future cancels the in-flight request and any
    /// pending backoff delay.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use donately::{Client, RequestMetadata};
    /// use http::Method;
    ///
    /// # async fn example() -> Result<(), donately::Error> {
    /// let client = Client::builder().api_key("sk_live_123").build()?;
    ///
    /// let metadata = RequestMetadata::new(Method::GET, ["campaigns"])
    ///     .with_query_param("account_id", "acc_123");
    /// let response = client.call::<()>(metadata, None).await?;
    /// println!("Got {} after {} attempt(s)", response.status, response.attempts);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call<B>(
        &self,
        metadata: RequestMetadata,
        body: Option<&B>,
    ) -> Result<Response<Envelope>>
    where
        B: Serialize + ?Sized,
    {
        let url = self.request_url(&metadata)?;
        let payload = body
            .map(|body| encode_body(body, metadata.content_type))
            .transpose()?;

        let start_time = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self
                .execute_request(&metadata, url.clone(), payload.clone(), attempt)
                .await {
                Ok(mut response) => {
                    response.latency = start_time.elapsed();
                    return Ok(response);
                }
                Err(e) => e,
            };

            tracing::warn!(
                error = %error,
                attempt = attempt,
                method = %metadata.method,
                path = %metadata.path(),
                "Request failed"
            );

            if !self.should_retry(&metadata, &error, attempt) {
                return Err(error);
            }

            let backoff = &self.inner.config.backoff;
            let Some(delay) = backoff.delay_for_attempt(attempt) else {
                return Err(Error::MaxRetriesExceeded {
                    attempts: attempt,
                    last_error: Box::new(error),
                });
            };

            let elapsed = start_time.elapsed();
            if past_deadline(backoff, elapsed, delay) {
                return Err(Error::RetryDeadlineExceeded {
                    attempts: attempt,
                    elapsed,
                    last_error: Box::new(error),
                });
            }

            tracing::info!(
                delay_ms = delay.as_millis(),
                attempt = attempt,
                "Retrying request after delay"
            );

            tokio::time::sleep(delay).await;
        }
    }

    fn should_retry(&self, metadata: &RequestMetadata, error: &Error, attempt: usize) -> bool {
        self.inner.config.retry_enabled
            && metadata.retryable
            && self.inner.retry_predicate.should_retry(error, attempt)
    }

    /// Executes a single request attempt and classifies the outcome.
    async fn execute_request(
        &self,
        metadata: &RequestMetadata,
        url: Url,
        body: Option<Vec<u8>>,
        attempt: usize,
    ) -> Result<Response<Envelope>> {
        let mut headers = self.inner.default_headers.clone();
        headers.insert(CONTENT_TYPE, metadata.content_type.header_value());

        if self.inner.config.debug {
            tracing::info!(
                request_line = %request_line(&metadata.method, &url),
                "Issuing request"
            );
        }

        tracing::debug!(
            method = %metadata.method,
            url = %url,
            attempt = attempt,
            "Executing HTTP request"
        );

        let started = Instant::now();
        let response = self
            .inner
            .transport
            .send(HttpRequest {
                method: metadata.method.clone(),
                url,
                headers,
                body,
            })
            .await?;

        let latency = started.elapsed();
        let raw_body = response.text();

        tracing::info!(
            status = response.status.as_u16(),
            latency_ms = latency.as_millis(),
            attempt = attempt,
            "Received HTTP response"
        );

        let envelope = classify(response.status, &raw_body)?;

        Ok(Response::new(
            envelope,
            raw_body,
            response.status,
            response.headers,
            latency,
            attempt,
        ))
    }

    /// Appends the escaped path segments and the query string to the base URL.
    ///
    /// `.` and `..` cannot be carried as literal segments (URL parsing folds
    /// them, percent-encoded or not), so they are rejected instead of being
    /// routed to the parent path.
    fn request_url(&self, metadata: &RequestMetadata) -> Result<Url> {
        if let Some(segment) = metadata
            .segments
            .iter()
            .find(|segment| matches!(segment.as_str(), "." | ".."))
        {
            return Err(Error::Validation(format!(
                "`{segment}` cannot be used as a path segment"
            )));
        }

        let mut url = self.inner.base_url.clone();

        url.path_segments_mut()
            .map_err(|_| Error::Configuration("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(&metadata.segments);

        if metadata.query.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&metadata.query.encode()));
        }

        Ok(url)
    }
}

/// Formats `METHOD /path?query HTTP/1.1`.
fn request_line(method: &Method, url: &Url) -> String {
    format!(
        "{} {} {:?}",
        method,
        &url[Position::BeforePath..Position::AfterQuery],
        Version::HTTP_11
    )
}

fn past_deadline(backoff: &Backoff, elapsed: Duration, delay: Duration) -> bool {
    backoff
        .max_elapsed
        .is_some_and(|max_elapsed| elapsed.saturating_add(delay) > max_elapsed)
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use donately::{Backoff, Client};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), donately::Error> {
/// let client = Client::builder()
///     .api_key("sk_live_123")
///     .base_url("https://api.donately.com/v2")
///     .timeout(Duration::from_secs(30))
///     .retry(true)
///     .backoff(Backoff {
///         initial_delay: Duration::from_millis(200),
///         max_retries: Some(5),
///         ..Backoff::default()
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    retry_predicate: Option<Box<dyn RetryPredicate>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            transport: None,
            retry_predicate: None,
        }
    }

    /// Replaces the whole configuration record.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the API key used for bearer authentication.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Sets the base URL that request paths are appended to.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Enables or disables retries for requests that opt in.
    pub fn retry(mut self, enabled: bool) -> Self {
        self.config.retry_enabled = enabled;
        self
    }

    /// Logs every composed request line before it is sent.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// Sets the per-attempt request timeout of the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Sets the backoff schedule used between retries.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.config.backoff = backoff;
        self
    }

    /// Sends requests through a custom transport instead of `reqwest`.
    ///
    /// The configured timeout is not applied to custom transports.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets a custom retry predicate.
    ///
    /// By default, requests are retried based on `Error::is_retryable()`.
    pub fn retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.retry_predicate = Some(predicate);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<Client> {
        let base_url = self.config.validate()?;
        let default_headers = default_headers(&self.config.api_key)?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.config.timeout)?),
        };

        let retry_predicate = self
            .retry_predicate
            .unwrap_or_else(|| Box::new(RetryOnRetryable));

        Ok(Client {
            inner: Arc::new(ClientInner {
                config: self.config,
                base_url,
                default_headers,
                transport,
                retry_predicate,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_headers(api_key: &str) -> Result<HeaderMap> {
    let mut authorization = HeaderValue::try_from(format!("Bearer {}", api_key))
        .map_err(|e| Error::Configuration(format!("Invalid API key: {}", e)))?;
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(DONATELY_VERSION, HeaderValue::from_static(API_VERSION));
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}
