// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::time::Duration;

use reqwest::header::HeaderValue;
use reqwest::Url;

use crate::constants::{DEFAULT_COMPRESSION_LEVEL, DEFAULT_TIMEOUT_SECS};
use crate::error::ConfigError;

pub const ENDPOINT_ENV: &str = "OBSERVE_HTTP_ENDPOINT";
pub const TOKEN_ENV: &str = "OBSERVE_API_TOKEN";
pub const LOG_LEVEL_ENV: &str = "FORWARDER_LOG_LEVEL";
pub const TIMEOUT_ENV: &str = "FORWARDER_TIMEOUT_SECS";
pub const COMPRESSION_LEVEL_ENV: &str = "FORWARDER_COMPRESSION_LEVEL";
pub const PROXY_ENV: &str = "FORWARDER_PROXY_HTTPS";
pub const FALLBACK_PROXY_ENV: &str = "HTTPS_PROXY";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration for one forwarder invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Collector URL every batch is posted to
    pub endpoint: String,
    /// Bearer token sent in the `Authorization` header
    pub token: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Timeout for a single POST
    pub timeout: Duration,
    /// gzip level, 0 (store) to 9 (best)
    pub compression_level: u32,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: String::new(),
            log_level: "info".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            https_proxy: None,
        }
    }
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create configuration from any variable source. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let endpoint = var(ENDPOINT_ENV)
            .map(|value| value.trim().to_string())
            .ok_or(ConfigError::Missing(ENDPOINT_ENV))?;
        let token = var(TOKEN_ENV)
            .map(|value| value.trim().to_string())
            .ok_or(ConfigError::Missing(TOKEN_ENV))?;
        let log_level = var(LOG_LEVEL_ENV)
            .map(|value| value.trim().to_lowercase())
            .unwrap_or_else(|| "info".to_string());
        let timeout = match var(TIMEOUT_ENV) {
            Some(value) => Duration::from_secs(parse_number(TIMEOUT_ENV, &value)?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        let compression_level = match var(COMPRESSION_LEVEL_ENV) {
            Some(value) => parse_number(COMPRESSION_LEVEL_ENV, &value)?,
            None => DEFAULT_COMPRESSION_LEVEL,
        };
        let https_proxy = var(PROXY_ENV).or_else(|| var(FALLBACK_PROXY_ENV));

        let config = Self {
            endpoint,
            token,
            log_level,
            timeout,
            compression_level,
            https_proxy,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Missing(ENDPOINT_ENV));
        }
        let url = Url::parse(&self.endpoint).map_err(|e| ConfigError::Invalid {
            var: ENDPOINT_ENV,
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                var: ENDPOINT_ENV,
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.token.trim().is_empty() {
            return Err(ConfigError::Missing(TOKEN_ENV));
        }
        if HeaderValue::from_str(&format!("Bearer {}", self.token)).is_err() {
            return Err(ConfigError::Invalid {
                var: TOKEN_ENV,
                reason: "token contains characters not allowed in an HTTP header".to_string(),
            });
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid {
                var: LOG_LEVEL_ENV,
                reason: format!(
                    "'{}' must be one of: trace, debug, info, warn, error",
                    self.log_level
                ),
            });
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: TIMEOUT_ENV,
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.compression_level > 9 {
            return Err(ConfigError::Invalid {
                var: COMPRESSION_LEVEL_ENV,
                reason: format!("{} is not between 0 and 9", self.compression_level),
            });
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("'{value}': {e}"),
    })
}
