//! HTTP client construction and the shared test context

use crate::config::SpeedtestConfig;
use crate::error::{Result, SpeedtestError};
use crate::meter::RateMeter;
use reqwest::Client;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

/// Build a pooled HTTP client honoring the configured timeout, proxy and
/// source-interface binding
///
/// Connections are reused across the jobs of a phase through reqwest's
/// internal pool; no cross-phase reuse is guaranteed or required.
pub fn build_client(config: &SpeedtestConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.clone());

    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| SpeedtestError::config(format!("Invalid proxy: {}", e)))?;
        builder = builder.proxy(proxy);
    }

    if let Some(source) = &config.source {
        let addr = IpAddr::from_str(source).map_err(|e| {
            SpeedtestError::config(format!("Invalid source address '{}': {}", source, e))
        })?;
        builder = builder.local_address(addr);
    }

    builder
        .build()
        .map_err(|e| SpeedtestError::network(format!("Failed to create HTTP client: {}", e)))
}

/// Everything a test phase needs: the HTTP client, the shared rate meter
/// and the caller-supplied configuration
pub struct TestContext {
    /// Pooled HTTP client used by probes and transfer jobs
    pub client: Client,
    /// Shared byte-rate meter, reset at each phase boundary
    pub meter: Arc<RateMeter>,
    /// Caller-supplied configuration
    pub config: SpeedtestConfig,
}

impl TestContext {
    /// Validate `config` and build a context around it
    pub fn new(config: SpeedtestConfig) -> Result<Self> {
        config.validate()?;
        let client = build_client(&config)?;
        Ok(Self {
            client,
            meter: Arc::new(RateMeter::new()),
            config,
        })
    }
}
