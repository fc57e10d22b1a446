//! Client configuration.
//!
//! Built with `with_*` methods or read from the environment:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `THINKWIRE_BASE_URL` | `http://localhost:5000` |
//! | `THINKWIRE_MODEL` | `qwen_normal` |
//! | `THINKWIRE_IDLE_TIMEOUT_SECS` | `60` (`0` disables) |
//! | `THINKWIRE_REQUEST_TIMEOUT_SECS` | `30` (`0` disables) |

use std::time::Duration;

use crate::models::{ModelId, TaskKind};
use crate::poll::PollPolicy;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_BASE_URL: &str = "THINKWIRE_BASE_URL";
pub const ENV_MODEL: &str = "THINKWIRE_MODEL";
pub const ENV_IDLE_TIMEOUT: &str = "THINKWIRE_IDLE_TIMEOUT_SECS";
pub const ENV_REQUEST_TIMEOUT: &str = "THINKWIRE_REQUEST_TIMEOUT_SECS";

/// Settings for [`StudioClient`](crate::client::StudioClient).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use thinkwire::config::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_base_url("http://studio.local:5000/")
///     .with_idle_timeout(Some(Duration::from_secs(10)));
/// assert_eq!(config.url("/chat"), "http://studio.local:5000/chat");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend root, without a trailing slash
    pub base_url: String,
    /// Model used when a session does not pick one
    pub model: ModelId,
    /// Longest gap allowed between two chunks of a streamed response
    pub idle_timeout: Option<Duration>,
    /// Timeout for non-streamed requests
    pub request_timeout: Option<Duration>,
    /// Status-check cadence for image jobs
    pub image_poll: PollPolicy,
    /// Status-check cadence for video jobs
    pub video_poll: PollPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: ModelId::default(),
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            image_poll: TaskKind::Image.default_policy(),
            video_poll: TaskKind::Video.default_policy(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend root. A trailing slash is dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: ModelId) -> Self {
        self.model = model;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_image_poll(mut self, policy: PollPolicy) -> Self {
        self.image_poll = policy;
        self
    }

    pub fn with_video_poll(mut self, policy: PollPolicy) -> Self {
        self.video_poll = policy;
        self
    }

    /// Poll policy for a kind of job.
    pub fn poll_policy(&self, kind: TaskKind) -> PollPolicy {
        match kind {
            TaskKind::Image => self.image_poll,
            TaskKind::Video => self.video_poll,
        }
    }

    /// Create config from `THINKWIRE_*` environment variables.
    ///
    /// Unparseable values are logged and replaced by the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                config = config.with_base_url(url.trim());
            }
        }

        if let Ok(name) = std::env::var(ENV_MODEL) {
            match name.trim().parse::<ModelId>() {
                Ok(model) => config.model = model,
                Err(e) => tracing::warn!(var = ENV_MODEL, "{}", e),
            }
        }

        if let Some(timeout) = env_timeout(ENV_IDLE_TIMEOUT) {
            config.idle_timeout = timeout;
        }
        if let Some(timeout) = env_timeout(ENV_REQUEST_TIMEOUT) {
            config.request_timeout = timeout;
        }

        config
    }

    /// Absolute URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Read a seconds value. `Some(None)` means explicitly disabled.
fn env_timeout(var: &str) -> Option<Option<Duration>> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(0) => Some(None),
        Ok(secs) => Some(Some(Duration::from_secs(secs))),
        Err(_) => {
            tracing::warn!(var, value = %raw, "ignoring non-numeric timeout");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.model, ModelId::QwenNormal);
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.poll_policy(TaskKind::Video), PollPolicy::video());
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .with_base_url("http://example.com/")
            .with_model(ModelId::Hunyuan)
            .with_idle_timeout(None);
        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.model, ModelId::Hunyuan);
        assert!(config.idle_timeout.is_none());
    }

    #[test]
    fn test_url_joins_paths() {
        let config = ClientConfig::new().with_base_url("http://h:1");
        assert_eq!(config.url("/models"), "http://h:1/models");
        assert_eq!(config.url("models"), "http://h:1/models");
    }
}
