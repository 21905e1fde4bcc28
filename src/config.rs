//! Configuration data model and validation

use crate::error::{Result, SpeedtestError};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// Main speed test configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedtestConfig {
    /// Number of concurrent transfer workers per throughput phase
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Wall-clock budget of each throughput phase in seconds
    #[serde(default = "default_duration_secs")]
    pub duration_seconds: u64,

    /// Per-request timeout in seconds; bounds any single in-flight exchange
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Interval between periodic rate samples in milliseconds
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Optional proxy URL (http, https or socks) for the transport
    #[serde(default)]
    pub proxy: Option<String>,

    /// Optional source interface IP address to bind outgoing connections to
    #[serde(default)]
    pub source: Option<String>,

    /// Skip the download phase
    #[serde(default)]
    pub no_download: bool,

    /// Skip the upload phase
    #[serde(default)]
    pub no_upload: bool,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SpeedtestConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            duration_seconds: default_duration_secs(),
            timeout_seconds: default_timeout_secs(),
            sample_interval_ms: default_sample_interval_ms(),
            proxy: None,
            source: None,
            no_download: false,
            no_upload: false,
            user_agent: default_user_agent(),
        }
    }
}

impl SpeedtestConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the throughput phase budget as a Duration
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }

    /// Get the per-request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Get the rate sampler interval as a Duration
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(SpeedtestError::config(
                "Concurrency must be at least 1 worker",
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(SpeedtestError::config(
                "Request timeout must be at least 1 second",
            ));
        }

        if self.sample_interval_ms == 0 {
            return Err(SpeedtestError::config(
                "Sample interval must be at least 1 millisecond",
            ));
        }

        if let Some(proxy) = &self.proxy {
            if url::Url::parse(proxy).is_err() {
                return Err(SpeedtestError::config(format!(
                    "Invalid proxy URL: {}",
                    proxy
                )));
            }
        }

        if let Some(source) = &self.source {
            if IpAddr::from_str(source).is_err() {
                return Err(SpeedtestError::config(format!(
                    "Invalid source interface IP address: {}",
                    source
                )));
            }
        }

        Ok(())
    }
}

fn default_concurrency() -> usize {
    num_cpus::get()
}

fn default_duration_secs() -> u64 {
    crate::defaults::DEFAULT_DURATION_SECS
}

fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT_SECS
}

fn default_sample_interval_ms() -> u64 {
    crate::defaults::DEFAULT_SAMPLE_INTERVAL_MS
}

fn default_user_agent() -> String {
    format!("network-speed-tester/{}", env!("CARGO_PKG_VERSION"))
}
