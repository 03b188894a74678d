//! Optional TOML configuration file.
//!
//! Every key is optional. Values from the file sit between command-line
//! flags (which win) and built-in defaults.
//!
//! ```toml
//! timeout_secs = 8
//! delay_secs = 0.5
//! concurrency = 4
//! platforms = ["github", "gitlab", "reddit"]
//! user_agent = "Mozilla/5.0 (compatible; research)"
//! retries = 1
//! retry_delay_ms = 250
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::HttpConfig;
use crate::ScanError;

/// Environment variable naming a config file when `--config` is absent
pub const CONFIG_ENV: &str = "SHADOWHUNTER_CONFIG";

/// Upper bound for `retries`
pub const MAX_RETRIES: u32 = 10;

/// Upper bound for `retry_delay_ms`
pub const MAX_RETRY_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: Option<f64>,
    /// Pause between requests in seconds
    pub delay_secs: Option<f64>,
    pub concurrency: Option<usize>,
    /// Default platform subset
    pub platforms: Option<Vec<String>>,
    pub user_agent: Option<String>,
    /// GET retries on 429/5xx
    pub retries: Option<u32>,
    /// First retry delay; doubles on each retry
    pub retry_delay_ms: Option<u64>,
}

impl FileConfig {
    /// Load from `path`, or return an empty config when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ScanError> {
        match path {
            Some(path) => Self::from_toml_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ScanError> {
        let content = std::fs::read_to_string(path).map_err(|e| ScanError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Parse and validate; `origin` names the source in errors
    pub fn from_toml_str(s: &str, origin: &str) -> Result<Self, ScanError> {
        let config: FileConfig = toml::from_str(s).map_err(|e| ScanError::Config {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate().map_err(|message| ScanError::Config {
            path: origin.to_string(),
            message,
        })?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(t) = self.timeout_secs {
            timeout_from_secs(t).map_err(|e| format!("timeout_secs: {}", e))?;
        }
        if let Some(d) = self.delay_secs {
            secs_to_duration(d).map_err(|e| format!("delay_secs: {}", e))?;
        }
        if self.concurrency == Some(0) {
            return Err("concurrency must be at least 1".to_string());
        }
        if let Some(r) = self.retries.filter(|r| *r > MAX_RETRIES) {
            return Err(format!("retries: {} is more than {}", r, MAX_RETRIES));
        }
        if let Some(d) = self.retry_delay_ms.filter(|d| *d > MAX_RETRY_DELAY_MS) {
            return Err(format!("retry_delay_ms: {} is more than {}", d, MAX_RETRY_DELAY_MS));
        }
        Ok(())
    }

    /// Transport settings for a run with the given per-request timeout
    pub fn http_config(&self, timeout: Duration) -> HttpConfig {
        let defaults = HttpConfig::default();
        HttpConfig {
            timeout,
            max_retries: self.retries.unwrap_or(defaults.max_retries),
            retry_delay_ms: self.retry_delay_ms.unwrap_or(defaults.retry_delay_ms),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            max_redirects: defaults.max_redirects,
        }
    }
}

/// Convert fractional seconds to a millisecond-precision `Duration`
pub fn secs_to_duration(secs: f64) -> Result<Duration, String> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("{} is not a non-negative number of seconds", secs));
    }
    Ok(Duration::from_millis((secs * 1000.0).round() as u64))
}

/// Per-request timeout from fractional seconds; must be at least 1 ms
pub fn timeout_from_secs(secs: f64) -> Result<Duration, String> {
    let timeout = secs_to_duration(secs)?;
    if timeout.is_zero() {
        return Err(format!("timeout of {} seconds is under 1 ms", secs));
    }
    Ok(timeout)
}
