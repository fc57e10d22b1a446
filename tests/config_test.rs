//! Environment-driven configuration tests.
//!
//! These mutate process environment variables, so they run serially.

use std::time::Duration;

use serial_test::serial;
use thinkwire::config::{
    ClientConfig, ENV_BASE_URL, ENV_IDLE_TIMEOUT, ENV_MODEL, ENV_REQUEST_TIMEOUT,
};
use thinkwire::models::ModelId;

fn clear_env() {
    for var in [ENV_BASE_URL, ENV_MODEL, ENV_IDLE_TIMEOUT, ENV_REQUEST_TIMEOUT] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    assert_eq!(ClientConfig::from_env(), ClientConfig::default());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    std::env::set_var(ENV_BASE_URL, "http://studio.internal:8080/");
    std::env::set_var(ENV_MODEL, "qwen_thinking");
    std::env::set_var(ENV_IDLE_TIMEOUT, "15");
    std::env::set_var(ENV_REQUEST_TIMEOUT, "0");

    let config = ClientConfig::from_env();
    clear_env();

    assert_eq!(config.base_url, "http://studio.internal:8080");
    assert_eq!(config.model, ModelId::QwenThinking);
    assert_eq!(config.idle_timeout, Some(Duration::from_secs(15)));
    assert_eq!(config.request_timeout, None);
}

#[test]
#[serial]
fn test_from_env_ignores_bad_values() {
    clear_env();
    std::env::set_var(ENV_MODEL, "gpt-4");
    std::env::set_var(ENV_IDLE_TIMEOUT, "soon");
    std::env::set_var(ENV_BASE_URL, "   ");

    let config = ClientConfig::from_env();
    clear_env();

    assert_eq!(config.model, ModelId::QwenNormal);
    assert_eq!(config.idle_timeout, Some(Duration::from_secs(60)));
    assert_eq!(config.base_url, "http://localhost:5000");
}

#[test]
#[serial]
fn test_idle_timeout_zero_disables() {
    clear_env();
    std::env::set_var(ENV_IDLE_TIMEOUT, "0");
    let config = ClientConfig::from_env();
    clear_env();
    assert!(config.idle_timeout.is_none());
}
