//! thinkwire - streaming chat, image and video generation client.
//!
//! The core is [`stream::EventStreamReader`], which turns a chunked HTTP
//! body of `data: <json>` lines into records dispatched as soon as each
//! line is complete. [`client::StudioClient`] wraps the backend endpoints
//! around it.
//!
//! This library exposes modules for use in integration tests and the binary.

pub mod adapters;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod poll;
pub mod session;
pub mod sse;
pub mod stream;
pub mod traits;

pub use client::StudioClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, StreamError};
