//! Measurement endpoint model and per-server test phases
//!
//! A [`Server`] identifies one measurement endpoint and accumulates the
//! results of the latency probe and the two throughput phases. The caller
//! owns the server exclusively for the duration of one run; each test
//! method mutates it in place.

use crate::client::TestContext;
use crate::error::{Result, SpeedtestError};
use crate::latency;
use crate::logging;
use crate::meter::RateCallback;
use crate::scheduler::{JobScheduler, TransferJob};
use crate::transfer::{
    DownloadJob, UploadJob, DOWNLOAD_WARMUP_INDEX, STEADY_STATE_INDEX, UPLOAD_WARMUP_INDEX,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Suffix of the conventional speedtest upload URL; download and latency
/// paths hang off the portion before it
const UPLOAD_SUFFIX: &str = "/upload.php";

/// One measurement endpoint with its accumulated results
#[derive(Debug, Clone, Serialize)]
pub struct Server {
    /// Upload URL of the server (`…/upload.php` by convention)
    pub url: String,
    /// Display name
    pub name: String,
    /// Sponsor label
    pub sponsor: String,
    /// Country label
    pub country: String,
    /// Geographic distance from the caller in kilometers
    pub distance: f64,
    /// One-way latency from the last probe
    pub latency: Duration,
    /// Jitter across the last probe's samples
    pub jitter: Duration,
    /// Minimum round-trip time observed by the last probe
    pub min_latency: Duration,
    /// Maximum round-trip time observed by the last probe
    pub max_latency: Duration,
    /// Sustained download throughput in Mbps
    pub download_speed: f64,
    /// Sustained upload throughput in Mbps
    pub upload_speed: f64,
}

impl Server {
    /// Create a server for `url`, validating it up front
    ///
    /// A malformed URL is a setup error and is surfaced before any
    /// scheduling can begin.
    pub fn new<S: Into<String>>(url: S) -> Result<Self> {
        let url = url.into();
        let parsed = url::Url::parse(&url)?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(SpeedtestError::validation(format!(
                    "Unsupported URL scheme: {}",
                    scheme
                )))
            }
        }
        if parsed.host().is_none() {
            return Err(SpeedtestError::validation("Server URL must have a host"));
        }

        Ok(Self {
            url,
            name: String::new(),
            sponsor: String::new(),
            country: String::new(),
            distance: 0.0,
            latency: Duration::ZERO,
            jitter: Duration::ZERO,
            min_latency: Duration::ZERO,
            max_latency: Duration::ZERO,
            download_speed: 0.0,
            upload_speed: 0.0,
        })
    }

    /// Attach display metadata supplied by the caller
    pub fn with_metadata<S: Into<String>>(
        mut self,
        name: S,
        sponsor: S,
        country: S,
        distance: f64,
    ) -> Self {
        self.name = name.into();
        self.sponsor = sponsor.into();
        self.country = country.into();
        self.distance = distance;
        self
    }

    /// Server base URL: everything before the `/upload.php` suffix
    pub fn base_url(&self) -> String {
        match self.url.find(UPLOAD_SUFFIX) {
            Some(pos) => self.url[..pos].to_string(),
            None => self.url.trim_end_matches('/').to_string(),
        }
    }

    /// Run the download throughput phase and record the result
    ///
    /// A single warm-up transfer primes connection state, then the meter is
    /// reset and the scheduler saturates the link for the configured budget
    /// while periodic samples stream to `progress`.
    pub async fn download_test(
        &mut self,
        ctx: &TestContext,
        progress: Option<RateCallback>,
    ) -> Result<()> {
        let base = self.base_url();
        logging::info("server", &format!("download phase starting against {}", base));

        let warmup = DownloadJob::new(
            ctx.client.clone(),
            Arc::clone(&ctx.meter),
            base.clone(),
            DOWNLOAD_WARMUP_INDEX,
        );
        if let Err(err) = warmup.run().await {
            // Warm-up primes TCP/TLS state but does not gate correctness
            logging::debug("server", &format!("download warm-up failed: {}", err));
        }

        ctx.meter.reset();
        let capture = progress.map(|callback| {
            ctx.meter
                .start_download_capture(ctx.config.sample_interval(), callback)
        });

        let scheduler = JobScheduler::new(ctx.config.concurrency);
        let job: Arc<dyn TransferJob> = Arc::new(DownloadJob::new(
            ctx.client.clone(),
            Arc::clone(&ctx.meter),
            base,
            STEADY_STATE_INDEX,
        ));
        let dispatched = scheduler.run(job, ctx.config.duration()).await?;

        if let Some(capture) = capture {
            capture.stop();
        }
        self.download_speed = ctx.meter.download_rate_mbps();
        logging::info(
            "server",
            &format!(
                "download phase finished: {} jobs, {:.2} Mbps",
                dispatched, self.download_speed
            ),
        );
        Ok(())
    }

    /// Run the upload throughput phase and record the result
    pub async fn upload_test(
        &mut self,
        ctx: &TestContext,
        progress: Option<RateCallback>,
    ) -> Result<()> {
        logging::info(
            "server",
            &format!("upload phase starting against {}", self.url),
        );

        let warmup = UploadJob::new(
            ctx.client.clone(),
            Arc::clone(&ctx.meter),
            self.url.clone(),
            UPLOAD_WARMUP_INDEX,
        );
        if let Err(err) = warmup.run().await {
            logging::debug("server", &format!("upload warm-up failed: {}", err));
        }

        ctx.meter.reset();
        let capture = progress.map(|callback| {
            ctx.meter
                .start_upload_capture(ctx.config.sample_interval(), callback)
        });

        let scheduler = JobScheduler::new(ctx.config.concurrency);
        let job: Arc<dyn TransferJob> = Arc::new(UploadJob::new(
            ctx.client.clone(),
            Arc::clone(&ctx.meter),
            self.url.clone(),
            STEADY_STATE_INDEX,
        ));
        let dispatched = scheduler.run(job, ctx.config.duration()).await?;

        if let Some(capture) = capture {
            capture.stop();
        }
        self.upload_speed = ctx.meter.upload_rate_mbps();
        logging::info(
            "server",
            &format!(
                "upload phase finished: {} jobs, {:.2} Mbps",
                dispatched, self.upload_speed
            ),
        );
        Ok(())
    }

    /// Run the latency probe and record all four latency fields
    ///
    /// Probe failures are fatal for this server's test and propagate to
    /// the caller.
    pub async fn ping_test(&mut self, ctx: &TestContext) -> Result<()> {
        let stats = latency::probe(&ctx.client, &self.base_url()).await?;
        self.latency = stats.latency;
        self.jitter = stats.jitter;
        self.min_latency = stats.min;
        self.max_latency = stats.max;
        Ok(())
    }

    /// Flat, unit-annotated summary for machine-readable output
    pub fn summary(&self) -> SpeedtestSummary {
        SpeedtestSummary {
            url: self.url.clone(),
            name: self.name.clone(),
            sponsor: self.sponsor.clone(),
            country: self.country.clone(),
            distance_km: self.distance,
            latency_ms: self.latency.as_secs_f64() * 1000.0,
            jitter_ms: self.jitter.as_secs_f64() * 1000.0,
            min_latency_ms: self.min_latency.as_secs_f64() * 1000.0,
            max_latency_ms: self.max_latency.as_secs_f64() * 1000.0,
            download_mbps: self.download_speed,
            upload_mbps: self.upload_speed,
        }
    }
}

/// Machine-readable result summary emitted by `--json`
#[derive(Debug, Clone, Serialize)]
pub struct SpeedtestSummary {
    pub url: String,
    pub name: String,
    pub sponsor: String,
    pub country: String,
    pub distance_km: f64,
    pub latency_ms: f64,
    pub jitter_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    pub download_mbps: f64,
    pub upload_mbps: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_url() {
        assert!(Server::new("http://host.example/speedtest/upload.php").is_ok());
        assert!(Server::new("https://host.example/upload.php").is_ok());

        assert!(matches!(
            Server::new("ftp://host.example/upload.php"),
            Err(SpeedtestError::Validation(_))
        ));
        assert!(matches!(
            Server::new("not a url"),
            Err(SpeedtestError::Parse(_))
        ));
    }

    #[test]
    fn test_base_url_strips_upload_suffix() {
        let server = Server::new("http://host.example/speedtest/upload.php").unwrap();
        assert_eq!(server.base_url(), "http://host.example/speedtest");

        let server = Server::new("http://host.example/upload.php?x=1").unwrap();
        assert_eq!(server.base_url(), "http://host.example");
    }

    #[test]
    fn test_base_url_without_suffix_trims_trailing_slash() {
        let server = Server::new("http://host.example/speedtest/").unwrap();
        assert_eq!(server.base_url(), "http://host.example/speedtest");
    }

    #[test]
    fn test_metadata_builder() {
        let server = Server::new("http://host.example/upload.php")
            .unwrap()
            .with_metadata("Telia", "Telia AB", "SE", 12.5);
        assert_eq!(server.name, "Telia");
        assert_eq!(server.sponsor, "Telia AB");
        assert_eq!(server.country, "SE");
        assert_eq!(server.distance, 12.5);
    }

    #[test]
    fn test_fresh_server_has_zeroed_results() {
        let server = Server::new("http://host.example/upload.php").unwrap();
        assert_eq!(server.latency, Duration::ZERO);
        assert_eq!(server.download_speed, 0.0);
        assert_eq!(server.upload_speed, 0.0);
    }

    #[test]
    fn test_summary_converts_units() {
        let mut server = Server::new("http://host.example/upload.php").unwrap();
        server.latency = Duration::from_micros(12_500);
        server.jitter = Duration::from_millis(10);
        server.download_speed = 93.7;

        let summary = server.summary();
        assert!((summary.latency_ms - 12.5).abs() < 1e-9);
        assert!((summary.jitter_ms - 10.0).abs() < 1e-9);
        assert!((summary.download_mbps - 93.7).abs() < 1e-9);
    }
}
