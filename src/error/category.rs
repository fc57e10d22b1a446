//! Error category classification.
//!
//! Categories drive user messaging and the CLI exit code. Nothing is retried
//! automatically; `is_retryable` only tells the user whether trying again
//! makes sense.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection failures, read failures, timeouts.
    Network,

    /// Backend-side failures (HTTP 5xx, error records, failed jobs).
    Server,

    /// The backend returned something we could not interpret.
    Protocol,

    /// Invalid input that the user has to correct.
    User,

    /// The operation was cancelled or superseded.
    Cancelled,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Server => "server",
            ErrorCategory::Protocol => "protocol",
            ErrorCategory::User => "user",
            ErrorCategory::Cancelled => "cancelled",
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCategory::Network => 2,
            ErrorCategory::Server => 3,
            ErrorCategory::Protocol => 4,
            ErrorCategory::User => 64,
            ErrorCategory::Cancelled => 130,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
