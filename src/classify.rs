//! Classification of completed HTTP exchanges.
//!
//! Once the transport hands back a response, [`classify`] decides whether the
//! call succeeded or which kind of [`Error`] it produced. Checks run in a
//! fixed order and the first match wins:
//!
//! 1. body is not an envelope and equals the retry sentinel: [`Error::Retryable`]
//! 2. body is not an envelope: [`Error::DeserializationFailed`]
//! 3. envelope carries a full `type`/`message`/`code` triple: [`Error::Api`]
//! 4. status >= 400: [`Error::HttpError`]
//! 5. otherwise the envelope is returned
//!
//! Transport failures never reach this module; they are raised by the
//! [`Transport`](crate::transport::Transport) itself.

use crate::{envelope::Envelope, Error, Result};
use http::StatusCode;

/// Body text the API sends, instead of an envelope, when it wants the client
/// to try again later.
pub const RETRY_SENTINEL: &str = "retry later";

/// Returns `true` if `raw_body`, trimmed and case-folded, is the retry sentinel.
///
/// ```
/// use donately::classify::is_retry_sentinel;
///
/// assert!(is_retry_sentinel("  Retry Later\n"));
/// assert!(!is_retry_sentinel("retry later please"));
/// ```
pub fn is_retry_sentinel(raw_body: &str) -> bool {
    raw_body.trim().to_lowercase() == RETRY_SENTINEL
}

/// Classifies a response by status and raw body.
pub fn classify(status: StatusCode, raw_body: &str) -> Result<Envelope> {
    let envelope = match Envelope::decode(raw_body.as_bytes()) {
        Ok(envelope) => envelope,
        Err(e) => {
            let decode_error = Error::DeserializationFailed {
                raw_response: raw_body.to_string(),
                serde_error: e.to_string(),
                status,
            };

            if is_retry_sentinel(raw_body) {
                tracing::warn!(status = status.as_u16(), "Server asked to retry later");
                return Err(Error::Retryable {
                    source: Box::new(decode_error),
                    can_retry: true,
                });
            }

            tracing::error!(
                error = %e,
                raw_response = %raw_body,
                "Failed to decode response envelope"
            );
            return Err(decode_error);
        }
    };

    if let Some((code, kind, message)) = envelope.api_error() {
        tracing::error!(
            status = status.as_u16(),
            code = code,
            request_id = envelope.request_id.as_deref().unwrap_or_default(),
            "API error"
        );
        return Err(Error::Api {
            code: code.to_string(),
            kind: kind.to_string(),
            message: message.to_string(),
            request_id: envelope.request_id.clone(),
            status,
        });
    }

    if status.as_u16() >= 400 {
        if status.is_client_error() {
            tracing::error!(status = status.as_u16(), response = %raw_body, "Client error (4xx)");
        } else {
            tracing::warn!(status = status.as_u16(), response = %raw_body, "Server error (5xx)");
        }
        return Err(Error::HttpError {
            status,
            raw_response: raw_body.to_string(),
            envelope,
        });
    }

    Ok(envelope)
}
