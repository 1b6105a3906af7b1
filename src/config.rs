// src/config.rs

use crate::logging::PROJECT_NAME;
use lazy_static::lazy_static;
use std::time::Duration;
use tracing::warn;

lazy_static! {
    pub static ref ALLOW_LOCALHOST_ENV: String = format!("{}_ALLOW_LOCALHOST", PROJECT_NAME.clone());
    pub static ref TIMEOUT_ENV: String = format!("{}_TIMEOUT_SECS", PROJECT_NAME.clone());
    pub static ref MAX_REDIRECTS_ENV: String = format!("{}_MAX_REDIRECTS", PROJECT_NAME.clone());
}

/// How the retriever is allowed to reach out to a host.
///
/// Passed explicitly into every scan; there is no process-wide switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Permit loopback targets such as `localhost` or `127.0.0.1`.
    pub allow_localhost: bool,
    /// Per-request deadline.
    pub timeout: Duration,
    pub max_redirects: usize,
    /// Bodies are truncated to this many bytes.
    pub max_body_bytes: usize,
    pub user_agent: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            allow_localhost: false,
            timeout: Duration::from_secs(10),
            max_redirects: 10,
            max_body_bytes: 1024 * 1024,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ScannerConfig {
    /// Defaults, overlaid with whatever the environment sets.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup(ALLOW_LOCALHOST_ENV.as_str()) {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.allow_localhost = true,
                "0" | "false" | "no" | "off" | "" => config.allow_localhost = false,
                other => warn!(variable = ALLOW_LOCALHOST_ENV.as_str(), value = other, "Ignoring unrecognised boolean."),
            }
        }
        if let Some(value) = lookup(TIMEOUT_ENV.as_str()) {
            match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!(variable = TIMEOUT_ENV.as_str(), value = %value, "Ignoring invalid timeout."),
            }
        }
        if let Some(value) = lookup(MAX_REDIRECTS_ENV.as_str()) {
            match value.trim().parse::<usize>() {
                Ok(max) => config.max_redirects = max,
                Err(_) => warn!(variable = MAX_REDIRECTS_ENV.as_str(), value = %value, "Ignoring invalid redirect limit."),
            }
        }

        config
    }
}
