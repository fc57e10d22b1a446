//! Streaming error types.
//!
//! Errors that end a streamed chat response. A single malformed record is
//! not one of them: that is a [`DecodeError`](crate::sse::DecodeError), which
//! the reader logs and skips.

use std::time::Duration;

use thiserror::Error;

use super::category::ErrorCategory;
use crate::traits::HttpError;

/// Terminal stream failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    /// The transport failed while reading the body.
    #[error("Stream transport error: {0}")]
    Transport(#[from] HttpError),

    /// No bytes arrived within the configured idle timeout.
    #[error("Stream idle for {}", describe_limit(.limit))]
    IdleTimeout { limit: Duration },

    /// The reader was cancelled, usually because a newer turn superseded it.
    #[error("Stream cancelled")]
    Cancelled,

    /// The backend sent an explicit error record.
    #[error("Backend error: {message}")]
    Protocol { message: String },

    /// The stream ended without answer content and without an explicit error.
    #[error("Stream ended without a response")]
    EmptyResult,
}

/// "60 seconds", "1 second", "250 ms".
fn describe_limit(limit: &Duration) -> String {
    match (limit.as_secs(), limit.subsec_nanos()) {
        (1, 0) => "1 second".to_string(),
        (secs, 0) => format!("{} seconds", secs),
        _ => format!("{} ms", limit.as_millis()),
    }
}

impl StreamError {
    /// High-level category for handling decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            StreamError::Transport(_) | StreamError::IdleTimeout { .. } => ErrorCategory::Network,
            StreamError::Cancelled => ErrorCategory::Cancelled,
            StreamError::Protocol { .. } => ErrorCategory::Server,
            StreamError::EmptyResult => ErrorCategory::Protocol,
        }
    }

    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            StreamError::Transport(e) => e.is_retryable(),
            StreamError::IdleTimeout { .. } => true,
            _ => false,
        }
    }

    /// Whether the failure came from the transport rather than the backend.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            StreamError::Transport(_) | StreamError::IdleTimeout { .. }
        )
    }

    /// Get a user-friendly error message for inline display.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Transport(e) => format!("Connection problem: {}", e),
            StreamError::IdleTimeout { limit } => format!(
                "No response from server for {}. The connection may have been lost.",
                describe_limit(limit)
            ),
            StreamError::Cancelled => "Response cancelled.".to_string(),
            StreamError::Protocol { message } => message.clone(),
            StreamError::EmptyResult => "No valid response was received.".to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::Transport(_) => "E_STREAM_TRANSPORT",
            StreamError::IdleTimeout { .. } => "E_STREAM_TIMEOUT",
            StreamError::Cancelled => "E_STREAM_CANCELLED",
            StreamError::Protocol { .. } => "E_STREAM_PROTOCOL",
            StreamError::EmptyResult => "E_STREAM_EMPTY",
        }
    }
}
