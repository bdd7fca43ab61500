//! # VitalDoc Configuration
//!
//! Resolution order, lowest precedence first:
//! 1. built-in defaults,
//! 2. an optional JSON5 file with PascalCase keys,
//! 3. `VITALDOC_*` environment variables.
//!
//! The result is validated before it is handed out.

use crate::retrieve::retry::{DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use std::{env, fmt, fs};
use thiserror::Error;
use url::Url;

/// Production attendance endpoint.
pub const DEFAULT_BASE_URL: &str = "https://h-mj.vitaldoc.com.br/admin/v1/attendance";

pub const ENV_BASE_URL: &str = "VITALDOC_BASE_URL";
pub const ENV_SPONSOR_ID: &str = "VITALDOC_SPONSOR_ID";
pub const ENV_TOKEN: &str = "VITALDOC_TOKEN";
pub const ENV_RETRY_DELAY_SECS: &str = "VITALDOC_RETRY_DELAY_SECS";
pub const ENV_MAX_ATTEMPTS: &str = "VITALDOC_MAX_ATTEMPTS";
pub const ENV_MAX_ELAPSED_SECS: &str = "VITALDOC_MAX_ELAPSED_SECS";
pub const ENV_TIMEOUT_SECS: &str = "VITALDOC_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON5 parse error: {0}")]
    Parse(String),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid base URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RetrySettings {
    pub delay_secs: u64,
    pub max_attempts: u32,
    pub max_elapsed_secs: Option<u64>,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            delay_secs: DEFAULT_DELAY.as_secs(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_elapsed_secs: None,
            timeout_secs: 30,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::new(Duration::from_secs(self.delay_secs), self.max_attempts);
        match self.max_elapsed_secs {
            Some(secs) => policy.with_max_elapsed(Duration::from_secs(secs)),
            None => policy,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VitalDocConfig {
    pub base_url: String,
    /// Default subject for lookups when the caller does not name one.
    pub sponsor_id: String,
    pub token: String,
    pub retry: RetrySettings,
}

impl Default for VitalDocConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            sponsor_id: String::new(),
            token: String::new(),
            retry: RetrySettings::default(),
        }
    }
}

impl fmt::Debug for VitalDocConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VitalDocConfig")
            .field("base_url", &self.base_url)
            .field("sponsor_id", &self.sponsor_id)
            .field("token", &mask(&self.token))
            .field("retry", &self.retry)
            .finish()
    }
}

impl fmt::Display for VitalDocConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VitalDocConfig
    Base URL: {},
    Sponsor id: {},
    Token: {},
    Retry: every {}s, at most {} attempts, ceiling {:?}s, timeout {}s
",
            self.base_url,
            self.sponsor_id,
            mask(&self.token),
            self.retry.delay_secs,
            self.retry.max_attempts,
            self.retry.max_elapsed_secs,
            self.retry.timeout_secs
        )
    }
}

fn mask(secret: &str) -> String {
    let tail: String = secret.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{tail}")
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

impl VitalDocConfig {
    /// Defaults, then `path` (if given), then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_json5_str(&content)?
            }
            None => Self::default(),
        };

        let config = base.with_env_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON5 document; missing keys keep their defaults.
    pub fn from_json5_str(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies `VITALDOC_*` overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_BASE_URL) {
            self.base_url = v;
        }
        if let Some(v) = lookup(ENV_SPONSOR_ID) {
            self.sponsor_id = v;
        }
        if let Some(v) = lookup(ENV_TOKEN) {
            self.token = v;
        }
        if let Some(v) = lookup(ENV_RETRY_DELAY_SECS) {
            self.retry.delay_secs = parse_number(ENV_RETRY_DELAY_SECS, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_ATTEMPTS) {
            self.retry.max_attempts = parse_number(ENV_MAX_ATTEMPTS, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_ELAPSED_SECS) {
            self.retry.max_elapsed_secs = Some(parse_number(ENV_MAX_ELAPSED_SECS, &v)?);
        }
        if let Some(v) = lookup(ENV_TIMEOUT_SECS) {
            self.retry.timeout_secs = parse_number(ENV_TIMEOUT_SECS, &v)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        if self.token.trim().is_empty() {
            return Err(ConfigError::Missing("Token"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MaxAttempts",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// The base URL, checked to be absolute http(s).
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        Ok(url)
    }
}
