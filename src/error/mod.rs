//! Error handling for thinkwire.
//!
//! | Error | Origin | Ends the stream? |
//! |-------|--------|------------------|
//! | [`StreamError::Transport`] | network/HTTP read failure | yes |
//! | [`DecodeError`] | one malformed record | no, logged and skipped |
//! | [`StreamError::Protocol`] | explicit error record | yes, message surfaced |
//! | [`StreamError::EmptyResult`] | no content, no error | yes, generic message |
//!
//! [`ClientError`] wraps these for the request/response and job APIs.
//! Nothing is retried automatically.

mod category;
mod client;
mod stream;

pub use crate::sse::DecodeError;
pub use category::ErrorCategory;
pub use client::ClientError;
pub use stream::StreamError;

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
