//! Server configuration from environment variables

use crate::runtime::SessionSettings;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_ERROR_RESET_MS: u64 = 2000;
const DEFAULT_STATUS_MS: u64 = 3000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SESSION_IDLE_SECS: u64 = 1800;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Base URL of the arithmetic endpoint used by sessions
    pub api_url: String,
    pub error_reset_delay: Duration,
    pub status_duration: Duration,
    pub request_timeout: Duration,
    pub session_idle_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parse_var(&lookup, "CALC_PORT")
            .or_else(|| parse_var(&lookup, "PORT"))
            .unwrap_or(DEFAULT_PORT);

        let api_url = lookup("CALC_API_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| format!("http://127.0.0.1:{port}"));

        let millis = |key: &str, default: u64| {
            Duration::from_millis(parse_var(&lookup, key).unwrap_or(default))
        };

        Self {
            port,
            api_url,
            error_reset_delay: millis("CALC_ERROR_RESET_MS", DEFAULT_ERROR_RESET_MS),
            status_duration: millis("CALC_STATUS_MS", DEFAULT_STATUS_MS),
            request_timeout: millis("CALC_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS),
            session_idle_timeout: Duration::from_secs(
                parse_var(&lookup, "CALC_SESSION_IDLE_SECS").unwrap_or(DEFAULT_SESSION_IDLE_SECS),
            ),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            error_reset_delay: self.error_reset_delay,
            status_duration: self.status_duration,
            idle_timeout: self.session_idle_timeout,
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparsable configuration value");
            None
        }
    }
}
