//! Shared byte-rate accounting for throughput phases
//!
//! The meter decouples byte accounting (mutated by many concurrent transfer
//! jobs) from rate sampling (read by one periodic task): workers perform a
//! single atomic add on the hot path while the sampler alone computes
//! derived rates. The meter is always passed explicitly behind an [`Arc`],
//! never held as a process global, and is reset at the start of every
//! measurement phase so counts cannot leak between phases or servers.

use crate::types::{mbps, Direction};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Callback invoked with each periodic throughput sample, in Mbps
pub type RateCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Process-wide byte counters for one measurement phase
pub struct RateMeter {
    download_bytes: AtomicU64,
    upload_bytes: AtomicU64,
    epoch: Mutex<Instant>,
}

impl RateMeter {
    /// Create a new meter with zeroed counters and the epoch set to now
    pub fn new() -> Self {
        Self {
            download_bytes: AtomicU64::new(0),
            upload_bytes: AtomicU64::new(0),
            epoch: Mutex::new(Instant::now()),
        }
    }

    /// Zero both counters and re-arm the epoch
    ///
    /// Must be called before a new measurement phase. Callers are expected
    /// to have fully stopped jobs from a previous phase first; additions
    /// racing a reset would be credited to the new phase.
    pub fn reset(&self) {
        let mut epoch = self.epoch.lock().expect("epoch lock poisoned");
        self.download_bytes.store(0, Ordering::Relaxed);
        self.upload_bytes.store(0, Ordering::Relaxed);
        *epoch = Instant::now();
    }

    /// Record `n` downloaded bytes; safe under arbitrary concurrency
    pub fn add_download_bytes(&self, n: u64) {
        self.download_bytes.fetch_add(n, Ordering::Relaxed);
    }

    /// Record `n` uploaded bytes; safe under arbitrary concurrency
    pub fn add_upload_bytes(&self, n: u64) {
        self.upload_bytes.fetch_add(n, Ordering::Relaxed);
    }

    /// Record `n` bytes moved in the given direction
    pub fn add_bytes(&self, direction: Direction, n: u64) {
        match direction {
            Direction::Download => self.add_download_bytes(n),
            Direction::Upload => self.add_upload_bytes(n),
        }
    }

    /// Bytes moved in the given direction since the last reset
    pub fn bytes(&self, direction: Direction) -> u64 {
        match direction {
            Direction::Download => self.download_bytes.load(Ordering::Relaxed),
            Direction::Upload => self.upload_bytes.load(Ordering::Relaxed),
        }
    }

    /// Time elapsed since the last reset
    pub fn elapsed(&self) -> Duration {
        self.epoch.lock().expect("epoch lock poisoned").elapsed()
    }

    /// Current moving throughput for the given direction, in Mbps
    pub fn rate_mbps(&self, direction: Direction) -> f64 {
        mbps(self.bytes(direction), self.elapsed().as_secs_f64())
    }

    /// Current download throughput in Mbps
    pub fn download_rate_mbps(&self) -> f64 {
        self.rate_mbps(Direction::Download)
    }

    /// Current upload throughput in Mbps
    pub fn upload_rate_mbps(&self) -> f64 {
        self.rate_mbps(Direction::Upload)
    }

    /// Start a periodic sampler that invokes `callback` with the current
    /// download rate every `interval` until the handle is stopped
    pub fn start_download_capture(
        self: &Arc<Self>,
        interval: Duration,
        callback: RateCallback,
    ) -> CaptureHandle {
        self.start_capture(Direction::Download, interval, callback)
    }

    /// Start a periodic sampler for the upload rate
    pub fn start_upload_capture(
        self: &Arc<Self>,
        interval: Duration,
        callback: RateCallback,
    ) -> CaptureHandle {
        self.start_capture(Direction::Upload, interval, callback)
    }

    fn start_capture(
        self: &Arc<Self>,
        direction: Direction,
        interval: Duration,
        callback: RateCallback,
    ) -> CaptureHandle {
        let meter = Arc::clone(self);
        let task = tokio::spawn(async move {
            // First sample lands one full interval in, not immediately
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                ticker.tick().await;
                callback(meter.rate_mbps(direction));
            }
        });
        CaptureHandle { task }
    }
}

impl Default for RateMeter {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running periodic rate sampler
pub struct CaptureHandle {
    task: JoinHandle<()>,
}

impl CaptureHandle {
    /// Halt sampling; no further callback invocations occur after this
    /// returns
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn test_counters_accumulate_independently() {
        let meter = RateMeter::new();
        meter.add_download_bytes(100);
        meter.add_download_bytes(50);
        meter.add_upload_bytes(7);

        assert_eq!(meter.bytes(Direction::Download), 150);
        assert_eq!(meter.bytes(Direction::Upload), 7);
    }

    #[test]
    fn test_reset_clears_both_counters() {
        let meter = RateMeter::new();
        meter.add_download_bytes(1024);
        meter.add_upload_bytes(2048);

        meter.reset();

        assert_eq!(meter.bytes(Direction::Download), 0);
        assert_eq!(meter.bytes(Direction::Upload), 0);
        // No stale carry-over: a sample right after reset reads 0
        assert_eq!(meter.download_rate_mbps(), 0.0);
        assert_eq!(meter.upload_rate_mbps(), 0.0);
    }

    #[test]
    fn test_rate_matches_bytes_over_elapsed() {
        // The derived figure is pure arithmetic over (bytes, elapsed)
        assert!((mbps(1_250_000, 1.0) - 10.0).abs() < 1e-9);
        assert!((mbps(1_250_000, 2.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_adds_lose_no_updates() {
        const WORKERS: usize = 16;
        const ADDS_PER_WORKER: u64 = 10_000;
        const CHUNK: u64 = 17;

        let meter = Arc::new(RateMeter::new());
        let mut handles = Vec::new();
        for _ in 0..WORKERS {
            let meter = Arc::clone(&meter);
            handles.push(std::thread::spawn(move || {
                for _ in 0..ADDS_PER_WORKER {
                    meter.add_download_bytes(CHUNK);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            meter.bytes(Direction::Download),
            WORKERS as u64 * ADDS_PER_WORKER * CHUNK
        );
    }

    #[test]
    fn test_epoch_tracks_wall_time_without_a_test_harness() {
        // Constructing and resetting the meter needs no runtime; a plain
        // block_on is enough to let wall time pass between observations.
        tokio_test::block_on(async {
            let meter = RateMeter::new();
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert!(meter.elapsed() >= Duration::from_millis(20));

            meter.reset();
            assert!(meter.elapsed() < Duration::from_millis(20));
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_emits_periodic_samples() {
        let meter = Arc::new(RateMeter::new());
        meter.add_download_bytes(1_000_000);

        let samples: Arc<StdMutex<Vec<f64>>> = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&samples);
        let callback: RateCallback = Arc::new(move |rate| {
            sink.lock().unwrap().push(rate);
        });

        let handle = meter.start_download_capture(Duration::from_millis(100), callback);
        tokio::time::sleep(Duration::from_millis(350)).await;
        handle.stop();
        tokio::task::yield_now().await;

        let samples = samples.lock().unwrap();
        assert!(samples.len() >= 3, "expected 3+ samples, got {}", samples.len());
        assert!(samples.iter().all(|&rate| rate >= 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_stop_halts_sampling() {
        let meter = Arc::new(RateMeter::new());
        let samples: Arc<StdMutex<Vec<f64>>> = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&samples);
        let callback: RateCallback = Arc::new(move |rate| {
            sink.lock().unwrap().push(rate);
        });

        let handle = meter.start_download_capture(Duration::from_millis(10), callback);
        tokio::time::sleep(Duration::from_millis(35)).await;
        handle.stop();
        tokio::task::yield_now().await;

        let count = samples.lock().unwrap().len();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(samples.lock().unwrap().len(), count);
    }
}
