//! Error types for dashfetch
//!
//! This module provides:
//! - The closed [`FetchError`] taxonomy classifying every failed fetch
//! - The crate-level [`Error`] type for configuration and lookup failures
//! - [`user_message`], the pure mapping from an error to user-facing text

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for dashfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dashfetch
///
/// Covers the ambient layers (configuration, section lookup). Classified
/// fetch outcomes are wrapped from [`FetchError`].
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// Section name not present in the configuration
    #[error("unknown section: {0}")]
    UnknownSection(String),

    /// A fetch settled with a classified failure
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Classified outcome of a failed fetch
///
/// Exactly one variant is produced per failed invocation. Every variant
/// carries the originating URL for diagnostics.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The timeout timer expired before the transport settled
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout {
        /// The URL the request was issued against
        url: String,
        /// The configured timeout that expired
        timeout: Duration,
    },

    /// The transport failed without the request being aborted
    #[error("network error for {url}: {message}")]
    Network {
        /// The URL the request was issued against
        url: String,
        /// Transport-level failure description
        message: String,
    },

    /// The server responded with a non-2xx status
    #[error("{url} returned HTTP {status} {status_text}")]
    HttpStatus {
        /// The URL the request was issued against
        url: String,
        /// Numeric HTTP status code
        status: u16,
        /// Canonical reason phrase for the status, if known
        status_text: String,
        /// Response body text, captured best-effort for diagnostics
        body: String,
    },

    /// The response body was not valid JSON
    #[error("invalid JSON from {url}: {message}")]
    Parse {
        /// The URL the request was issued against
        url: String,
        /// Parser failure description
        message: String,
    },

    /// The payload parsed but was rejected by the section's validator
    #[error("unexpected payload shape from {url}")]
    Shape {
        /// The URL the request was issued against
        url: String,
        /// The rejected payload, retained for diagnostics
        payload: Value,
    },

    /// The request was aborted through its cancellation handle
    #[error("request to {url} was canceled")]
    Canceled {
        /// The URL the request was issued against
        url: String,
    },
}

impl FetchError {
    /// URL the failed request was issued against
    pub fn url(&self) -> &str {
        match self {
            FetchError::Timeout { url, .. }
            | FetchError::Network { url, .. }
            | FetchError::HttpStatus { url, .. }
            | FetchError::Parse { url, .. }
            | FetchError::Shape { url, .. }
            | FetchError::Canceled { url } => url,
        }
    }
}

/// Map an error to a user-facing message
///
/// Pure and total: each [`FetchError`] variant maps to a tag-specific
/// message, and any other error type falls back to a generic one. This is
/// the only place error text for end users is produced; views receive the
/// result verbatim.
pub fn user_message(err: &(dyn std::error::Error + 'static)) -> String {
    match err.downcast_ref::<FetchError>() {
        Some(FetchError::Timeout { .. }) => "Request timed out. Please try again.".to_string(),
        Some(FetchError::Network { .. }) => {
            "Network error. Check your internet connection.".to_string()
        }
        Some(FetchError::HttpStatus {
            status,
            status_text,
            ..
        }) => format!("Server error {}: {}", status, status_text),
        Some(FetchError::Parse { .. }) => "Invalid JSON received from server.".to_string(),
        Some(FetchError::Shape { .. }) => {
            "The server returned data in an unexpected format.".to_string()
        }
        Some(FetchError::Canceled { .. }) => "Request canceled by user.".to_string(),
        None => "Something went wrong. Please try again.".to_string(),
    }
}
