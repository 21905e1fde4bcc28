//! Single-shot download and upload transfer jobs
//!
//! Each job performs one full HTTP exchange against the target server and
//! reports the bytes it moved to the shared rate meter. Jobs are stateless
//! and re-executable; the scheduler runs many instances of one job per
//! throughput phase.

use crate::error::Result;
use crate::meter::RateMeter;
use crate::payload::{upload_payload, CountingStream};
use crate::scheduler::TransferJob;
use crate::types::Direction;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::Client;
use std::sync::Arc;

/// Download size ladder: `W` in `random<W>x<W>.jpg`, ascending
pub const DOWNLOAD_SIZES: [usize; 10] =
    [350, 500, 750, 1000, 1500, 2000, 2500, 3000, 3500, 4000];

/// Upload payload size ladder in kilobytes, ascending
pub const UPLOAD_SIZES_KB: [usize; 10] =
    [100, 300, 500, 800, 1000, 1500, 2500, 3000, 3500, 4000];

/// Ladder index used for the single download warm-up transfer
pub const DOWNLOAD_WARMUP_INDEX: usize = 2;

/// Ladder index used for the single upload warm-up transfer
pub const UPLOAD_WARMUP_INDEX: usize = 4;

/// Ladder index used during the measured burst, both directions
pub const STEADY_STATE_INDEX: usize = 5;

/// Byte length of the upload payload for a ladder index
pub fn upload_size_bytes(size_index: usize) -> usize {
    UPLOAD_SIZES_KB[size_index.min(UPLOAD_SIZES_KB.len() - 1)] * 1000
}

/// One sized download exchange streamed into a discard sink
pub struct DownloadJob {
    client: Client,
    meter: Arc<RateMeter>,
    base_url: String,
    size_index: usize,
}

impl DownloadJob {
    /// Create a download job against `base_url` with the given ladder index
    pub fn new(client: Client, meter: Arc<RateMeter>, base_url: String, size_index: usize) -> Self {
        Self {
            client,
            meter,
            base_url,
            size_index,
        }
    }

    /// Target URL following the `random<W>x<W>.jpg` convention
    pub fn url(&self) -> String {
        let width = DOWNLOAD_SIZES[self.size_index.min(DOWNLOAD_SIZES.len() - 1)];
        format!("{}/random{}x{}.jpg", self.base_url, width, width)
    }
}

#[async_trait]
impl TransferJob for DownloadJob {
    fn name(&self) -> &str {
        "downLink"
    }

    async fn run(&self) -> Result<()> {
        let response = self.client.get(self.url()).send().await?.error_for_status()?;

        // Count every chunk as it arrives; the body itself is discarded.
        // Partial bodies credit partial bytes.
        let mut body = CountingStream::new(
            response.bytes_stream(),
            Arc::clone(&self.meter),
            Direction::Download,
        );
        while let Some(chunk) = body.next().await {
            chunk?;
        }
        Ok(())
    }
}

/// One fixed-size upload exchange with exact declared length
pub struct UploadJob {
    client: Client,
    meter: Arc<RateMeter>,
    url: String,
    size_index: usize,
}

impl UploadJob {
    /// Create an upload job against `url` with the given ladder index
    pub fn new(client: Client, meter: Arc<RateMeter>, url: String, size_index: usize) -> Self {
        Self {
            client,
            meter,
            url,
            size_index,
        }
    }

    /// Payload size for this job in bytes
    pub fn payload_size(&self) -> usize {
        upload_size_bytes(self.size_index)
    }
}

#[async_trait]
impl TransferJob for UploadJob {
    fn name(&self) -> &str {
        "upLink"
    }

    async fn run(&self) -> Result<()> {
        let payload = upload_payload(self.payload_size());

        // Upload bytes are credited from the payload length before the
        // send; the fixed Bytes body gives reqwest an exact Content-Length.
        self.meter.add_upload_bytes(payload.len() as u64);

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"))
            .body(payload)
            .send()
            .await?
            .error_for_status()?;

        // Drain the response body; nothing additional is counted
        let _ = response.bytes().await?;
        Ok(())
    }
}
