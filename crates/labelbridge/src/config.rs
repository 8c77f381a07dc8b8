//! Process configuration, read from the environment.

use crate::poller::PollerConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable names.
const ENV_DATABASE_URL: &str = "DATABASE_URL";
const ENV_CREDENTIALS_FILE: &str = "CREDENTIALS_FILE";
const ENV_POLL_ENABLED: &str = "POLL_ENABLED";
const ENV_POLL_INTERVAL_MS: &str = "POLL_INTERVAL_MS";

/// Configuration errors.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid {
        name: &'static str,
        value: String,
    },
}

/// Full bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub database_url: String,
    pub credentials_file: PathBuf,
    pub poll: PollerConfig,
}

impl BridgeConfig {
    /// Assemble configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = require(ENV_DATABASE_URL)?;
        let credentials_file = std::env::var(ENV_CREDENTIALS_FILE)
            .unwrap_or_else(|_| "credentials.json".to_owned())
            .into();

        let mut poll = PollerConfig::default();
        if let Ok(value) = std::env::var(ENV_POLL_ENABLED) {
            poll.enabled = parse_bool(ENV_POLL_ENABLED, &value)?;
        }
        if let Ok(value) = std::env::var(ENV_POLL_INTERVAL_MS) {
            let ms: u64 = value.parse().map_err(|_| ConfigError::Invalid {
                name: ENV_POLL_INTERVAL_MS,
                value,
            })?;
            poll.interval = Duration::from_millis(ms);
        }

        Ok(BridgeConfig {
            database_url,
            credentials_file,
            poll,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_owned(),
        }),
    }
}
