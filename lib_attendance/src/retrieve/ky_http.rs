//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous JSON-over-HTTP transport built on
//! `reqwest`. Callers talk to the [`HttpTransport`] trait so tests can swap in
//! a scripted transport; production code uses [`ApiClient`].
//!
//! No retries happen at this layer. A connection error, a timeout, a non-2xx
//! status or an undecodable body is reported once, as a [`FetchError`].

use chrono::NaiveDate;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors surfaced by the retrieval layer and the clients built on it.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (connect, TLS, timeout, body read).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status code.
    #[error("HTTP request failed for {url}: Status {status}")]
    Status {
        /// Numeric HTTP status.
        status: u16,
        /// The requested URL.
        url: String,
        /// Raw response body, kept for diagnostics.
        body: String,
    },

    /// The body was not JSON, or not the JSON shape the caller expects.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The base URL cannot carry path segments (e.g. `mailto:`).
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// A header value contained characters HTTP does not allow.
    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    /// A lookup was requested without a subject identifier.
    #[error("Subject identifier must not be empty")]
    EmptySubject,

    /// Date arithmetic left the representable calendar.
    #[error("No calendar day before {0}")]
    DateOutOfRange(NaiveDate),
}

/// An asynchronous GET-and-decode-JSON capability.
///
/// Implementations must not retry; retrying is the caller's policy.
pub trait HttpTransport: Send + Sync {
    /// Issues `GET url` with `headers` and decodes the body as JSON.
    fn get_json(
        &self,
        url: Url,
        headers: HeaderMap,
    ) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// A `reqwest`-backed [`HttpTransport`].
///
/// The inner client pools connections; dropping the `ApiClient` closes them.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: reqwest::Client,
}

impl ApiClient {
    /// Creates a client whose every request is bounded by `timeout`.
    ///
    /// # Errors
    /// Returns [`FetchError::Transport`] if the TLS backend fails to initialize.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lib_attendance/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { inner })
    }

    /// Wraps an already configured `reqwest::Client`.
    pub fn with_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

impl HttpTransport for ApiClient {
    async fn get_json(&self, url: Url, headers: HeaderMap) -> Result<Value, FetchError> {
        let url_text = url.to_string();
        let response = self
            .inner
            .get(url)
            .headers(headers)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Capture the error body as a string for debugging
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url_text,
                body,
            });
        }

        // Read the raw bytes so a bad body is a Decode error, not a Transport one.
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
