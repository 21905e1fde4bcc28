//! Synthetic payload generation and byte-counting body wrapper

use crate::meter::RateMeter;
use crate::types::Direction;
use bytes::{Bytes, BytesMut};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Repeating pattern used to fill upload payloads. Content is arbitrary;
/// only the exact length matters to the transport layer.
const PAYLOAD_PATTERN: &[u8] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

/// Build an upload payload of exactly `size_bytes` bytes
pub fn upload_payload(size_bytes: usize) -> Bytes {
    let mut buf = BytesMut::with_capacity(size_bytes);
    while buf.len() < size_bytes {
        let remaining = size_bytes - buf.len();
        let take = remaining.min(PAYLOAD_PATTERN.len());
        buf.extend_from_slice(&PAYLOAD_PATTERN[..take]);
    }
    buf.freeze()
}

/// Body stream wrapper that credits each chunk to the shared rate meter
/// before yielding it to the caller
///
/// Counts the bytes actually read, so a partially consumed body credits
/// only the partial amount, never the nominal transfer size.
pub struct CountingStream<S> {
    inner: Pin<Box<S>>,
    meter: Arc<RateMeter>,
    direction: Direction,
}

impl<S> CountingStream<S> {
    /// Wrap `inner`, attributing its chunks to `direction` on `meter`
    pub fn new(inner: S, meter: Arc<RateMeter>, direction: Direction) -> Self {
        Self {
            inner: Box::pin(inner),
            meter,
            direction,
        }
    }
}

impl<S, E> Stream for CountingStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
{
    type Item = std::result::Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.meter.add_bytes(this.direction, chunk.len() as u64);
                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }
}
