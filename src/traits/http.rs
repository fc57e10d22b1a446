//! HTTP client trait abstraction.
//!
//! The studio client only needs three operations: a GET returning a full
//! body, a POST returning a full body, and a POST whose body is consumed as a
//! byte stream. Putting them behind a trait lets tests script chunk
//! boundaries, stalls and transport failures without a network.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use thiserror::Error;

/// Header name to value.
pub type Headers = HashMap<String, String>;

/// A response body delivered incrementally, in arbitrary chunk sizes.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// A fully read, non-streamed response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: Bytes) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// Create a JSON response from a serializable value.
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            status,
            headers,
            body: Bytes::from(value.to_string()),
        }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body text, lossy on invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Best-effort error message for a non-2xx response.
    ///
    /// Prefers an `error` field in a JSON body, then the raw body text.
    pub fn error_message(&self) -> String {
        if let Ok(value) = self.json::<serde_json::Value>() {
            if let Some(msg) = value.get("error").and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
        let text = self.text();
        if text.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            text
        }
    }
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HttpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request timeout: {0}")]
    Timeout(String),
    /// The status line was non-2xx, so no body was streamed
    #[error("HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    /// The body broke off mid-stream
    #[error("Stream read failed: {0}")]
    Io(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Other(String),
}

impl HttpError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::ConnectionFailed(_) | HttpError::Timeout(_) | HttpError::Io(_) => true,
            HttpError::ServerError { status, .. } => *status >= 500,
            HttpError::InvalidUrl(_) | HttpError::Other(_) => false,
        }
    }
}

/// Transport seam for [`StudioClient`](crate::client::StudioClient).
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET and read the whole body.
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError>;

    /// POST and read the whole body.
    ///
    /// Non-2xx statuses are returned as `Ok` so callers can read error bodies.
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError>;

    /// POST and hand the body back as it arrives.
    ///
    /// A non-2xx status is reported as [`HttpError::ServerError`] before any
    /// body bytes are yielded.
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, HttpError>;
}
