//! Cancellation-aware JSON fetch execution
//!
//! [`FetchClient::execute`] issues exactly one GET per invocation and races
//! it against a timeout timer and a cancellation handle. Whatever happens,
//! the call settles with either a parsed payload or exactly one classified
//! [`FetchError`]. Nothing unclassified escapes this module.

use crate::error::{Error, FetchError};
use crate::schema::Validator;
use reqwest::header;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;


/// Immutable description of one outbound request
#[derive(Clone)]
pub struct RequestDescriptor {
    /// Target resource
    pub url: Url,
    /// Timeout covering the whole request, connect through body
    pub timeout: Duration,
    /// External cancellation handle, linked one-way into the request
    pub cancel: Option<CancellationToken>,
    /// Payload validator applied after parsing
    pub validator: Option<Validator>,
}

impl RequestDescriptor {
    /// Describe a request with no cancellation handle and no validator
    pub fn new(url: Url, timeout: Duration) -> Self {
        Self {
            url,
            timeout,
            cancel: None,
            validator: None,
        }
    }

    /// Attach an external cancellation handle
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Attach a payload validator
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }
}

impl std::fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("url", &self.url.as_str())
            .field("timeout", &self.timeout)
            .field("cancel", &self.cancel.is_some())
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// HTTP client executing section fetches
#[derive(Clone)]
pub struct FetchClient {
    http: reqwest::Client,
}

impl FetchClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the underlying HTTP client cannot be
    /// built (TLS backend initialization).
    pub fn new(user_agent: &str) -> crate::error::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {}", e),
                key: None,
            })?;
        Ok(Self { http })
    }

    /// Execute one request and classify its outcome
    ///
    /// Issues a single GET with `Accept: application/json` and
    /// `Cache-Control: no-store` headers. The transport races against the
    /// timeout timer and the cancellation handle; settling any branch drops
    /// the others, which releases the timer and aborts the in-flight
    /// request. A handle already triggered on entry settles as canceled
    /// without any network I/O.
    ///
    /// Classification precedence: timeout, canceled, network failure,
    /// non-2xx status (body captured best-effort), JSON parse failure,
    /// validator rejection, success.
    pub async fn execute(
        &self,
        descriptor: RequestDescriptor,
    ) -> std::result::Result<Value, FetchError> {
        let url = descriptor.url.to_string();

        // One-way linkage: the external handle aborts this request, never
        // the other way around.
        let cancel = match descriptor.cancel {
            Some(ref external) => {
                if external.is_cancelled() {
                    tracing::debug!(url = %url, "handle already triggered, skipping request");
                    return Err(FetchError::Canceled { url });
                }
                external.child_token()
            }
            None => CancellationToken::new(),
        };

        tokio::select! {
            // Polled in order: a timer that fired alongside a cancellation
            // classifies as Timeout.
            biased;
            () = tokio::time::sleep(descriptor.timeout) => {
                tracing::debug!(url = %url, timeout = ?descriptor.timeout, "request timed out");
                Err(FetchError::Timeout {
                    url,
                    timeout: descriptor.timeout,
                })
            }
            () = cancel.cancelled() => {
                tracing::debug!(url = %url, "request canceled");
                Err(FetchError::Canceled { url })
            }
            outcome = self.request(&descriptor) => outcome,
        }
    }

    /// Issue the GET and classify everything past the abort races
    async fn request(
        &self,
        descriptor: &RequestDescriptor,
    ) -> std::result::Result<Value, FetchError> {
        let url = descriptor.url.to_string();

        let response = self
            .http
            .get(descriptor.url.clone())
            .header(header::ACCEPT, "application/json")
            .header(header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            // Best effort: an unreadable body must not mask the status.
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::HttpStatus {
                url,
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                body,
            });
        }

        let text = response.text().await.map_err(|e| FetchError::Network {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let payload: Value = serde_json::from_str(&text).map_err(|e| FetchError::Parse {
            url: url.clone(),
            message: e.to_string(),
        })?;

        if let Some(validate) = descriptor.validator.as_deref()
            && !validate(&payload)
        {
            return Err(FetchError::Shape { url, payload });
        }

        Ok(payload)
    }
}
