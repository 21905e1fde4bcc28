//! Sequential round-trip latency probing
//!
//! Issues a small fixed number of sequential GET requests against the
//! server's probe endpoint and reduces the observed round-trip times to
//! latency/jitter statistics. Unlike throughput jobs, any probe failure is
//! surfaced immediately: a three-sample statistic cannot absorb a missing
//! sample without biasing the minimum.

use crate::error::{Result, SpeedtestError};
use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Number of sequential round trips per probe
pub const PROBE_COUNT: usize = 3;

/// Probe endpoint path appended to the server base URL
pub const LATENCY_PATH: &str = "latency.txt";

/// Latency statistics reduced from one probe run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyStats {
    /// Approximated one-way delay: half the minimum observed RTT
    pub latency: Duration,
    /// Mean absolute difference between consecutive RTT samples
    pub jitter: Duration,
    /// Minimum observed round-trip time
    pub min: Duration,
    /// Maximum observed round-trip time
    pub max: Duration,
}

impl LatencyStats {
    /// Reduce raw round-trip samples to latency statistics
    pub fn from_rtts(rtts: &[Duration]) -> Result<Self> {
        if rtts.is_empty() {
            return Err(SpeedtestError::probe("no round-trip samples collected"));
        }

        let min = *rtts.iter().min().expect("non-empty samples");
        let max = *rtts.iter().max().expect("non-empty samples");

        let jitter = if rtts.len() > 1 {
            let spread_nanos: u128 = rtts
                .windows(2)
                .map(|pair| pair[0].abs_diff(pair[1]).as_nanos())
                .sum();
            Duration::from_nanos((spread_nanos / (rtts.len() as u128 - 1)) as u64)
        } else {
            Duration::ZERO
        };

        Ok(Self {
            // Assumes symmetric paths
            latency: min / 2,
            jitter,
            min,
            max,
        })
    }
}

/// Probe `<base_url>/latency.txt` with sequential round trips
///
/// Requests are deliberately not concurrent so each sample sees an idle
/// connection. Any 2xx response with a measurable RTT counts; the body is
/// not interpreted.
pub async fn probe(client: &Client, base_url: &str) -> Result<LatencyStats> {
    let url = format!("{}/{}", base_url.trim_end_matches('/'), LATENCY_PATH);
    let mut rtts = Vec::with_capacity(PROBE_COUNT);

    for _ in 0..PROBE_COUNT {
        let start = Instant::now();
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| SpeedtestError::probe(format!("latency request failed: {}", e)))?;
        response
            .error_for_status()
            .map_err(|e| SpeedtestError::probe(format!("latency request rejected: {}", e)))?;
        rtts.push(start.elapsed());
    }

    LatencyStats::from_rtts(&rtts)
}
