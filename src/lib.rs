//! Network Speed Tester
//!
//! An HTTP-based network performance measurement engine: a latency/jitter
//! probe plus bounded concurrent download and upload bursts that turn raw
//! transferred-byte counts into periodic throughput samples, in the manner
//! of commercial bandwidth-test utilities. The engine only requires a
//! server that serves `random<W>x<W>.jpg` binary payloads, accepts
//! arbitrary-length POST uploads and answers `latency.txt`.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod latency;
pub mod logging;
pub mod meter;
pub mod payload;
pub mod scheduler;
pub mod server;
pub mod transfer;
pub mod types;

// Re-export commonly used types
pub use client::TestContext;
pub use config::SpeedtestConfig;
pub use error::{Result, SpeedtestError};
pub use latency::LatencyStats;
pub use meter::{CaptureHandle, RateCallback, RateMeter};
pub use scheduler::{JobScheduler, SchedulerState, TransferJob};
pub use server::{Server, SpeedtestSummary};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    /// Wall-clock budget of each throughput phase
    pub const DEFAULT_DURATION_SECS: u64 = 10;
    /// Per-request timeout
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Interval between periodic rate samples
    pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 1000;
}
