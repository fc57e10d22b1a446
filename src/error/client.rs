//! Errors from the studio client's request/response and job APIs.

use thiserror::Error;

use super::category::ErrorCategory;
use super::stream::StreamError;
use crate::traits::HttpError;

/// Errors returned by [`StudioClient`](crate::client::StudioClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(HttpError),

    /// The backend answered with a non-2xx status.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("Unexpected response from {endpoint}: {source}")]
    Json {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The backend answered 2xx but reported an error in the body.
    #[error("Request rejected: {message}")]
    Rejected { message: String },

    /// A generation job reported `failed`.
    #[error("Task {task_id} failed: {message}")]
    TaskFailed { task_id: String, message: String },

    /// A poll loop hit its attempt limit before the job finished.
    #[error("Task {task_id} still running after {attempts} status checks")]
    PollExhausted { task_id: String, attempts: u32 },

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// A streamed response ended in an error.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// The caller passed input the backend would reject.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ClientError {
    /// High-level category for handling decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::Http(_) => ErrorCategory::Network,
            ClientError::Server { status, .. } if *status < 500 => ErrorCategory::User,
            ClientError::Server { .. }
            | ClientError::Rejected { .. }
            | ClientError::TaskFailed { .. }
            | ClientError::PollExhausted { .. } => ErrorCategory::Server,
            ClientError::Json { .. } => ErrorCategory::Protocol,
            ClientError::Cancelled => ErrorCategory::Cancelled,
            ClientError::Stream(e) => e.category(),
            ClientError::InvalidInput(_) => ErrorCategory::User,
        }
    }

    /// Check if trying again could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_retryable(),
            ClientError::Stream(e) => e.is_retryable(),
            ClientError::Server { status, .. } => *status >= 500,
            ClientError::PollExhausted { .. } => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message for inline display or a notification.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http(e) => format!("Could not reach the server: {}", e),
            ClientError::Server { status, message } => format!("HTTP {}: {}", status, message),
            ClientError::Json { .. } => "The server sent a response we could not read.".to_string(),
            ClientError::Rejected { message } => message.clone(),
            ClientError::TaskFailed { message, .. } => format!("Generation failed: {}", message),
            ClientError::PollExhausted { .. } => {
                "Generation is taking longer than expected. Please check back later.".to_string()
            }
            ClientError::Cancelled => "Cancelled.".to_string(),
            ClientError::Stream(e) => e.user_message(),
            ClientError::InvalidInput(msg) => msg.clone(),
        }
    }
}

impl From<HttpError> for ClientError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::ServerError { status, message } => ClientError::Server { status, message },
            other => ClientError::Http(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_status_is_split_by_category() {
        let client_side = ClientError::Server {
            status: 400,
            message: "empty message".to_string(),
        };
        assert_eq!(client_side.category(), ErrorCategory::User);
        assert!(!client_side.is_retryable());

        let server_side = ClientError::Server {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(server_side.category(), ErrorCategory::Server);
        assert!(server_side.is_retryable());
    }

    #[test]
    fn test_from_http_error_maps_server_status() {
        let err: ClientError = HttpError::ServerError {
            status: 500,
            message: "oops".to_string(),
        }
        .into();
        assert!(matches!(err, ClientError::Server { status: 500, .. }));

        let err: ClientError = HttpError::ConnectionFailed("refused".to_string()).into();
        assert!(matches!(err, ClientError::Http(_)));
    }

    #[test]
    fn test_stream_error_is_transparent() {
        let err: ClientError = StreamError::Protocol {
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Backend error: boom");
        assert_eq!(err.user_message(), "boom");
    }

    #[test]
    fn test_task_failed_display() {
        let err = ClientError::TaskFailed {
            task_id: "t-1".to_string(),
            message: "content policy".to_string(),
        };
        assert_eq!(err.to_string(), "Task t-1 failed: content policy");
        assert_eq!(err.user_message(), "Generation failed: content policy");
    }
}
