//! Media producer loops
//!
//! A producer reads raw bytes from the device stream, feeds them through a
//! [`FrameReassembler`] and publishes every completed access unit to the
//! video broadcaster. Reads are the only suspension point; publishing never
//! waits on viewers.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

use super::frame::AccessUnit;
use super::reassembler::FrameReassembler;
use crate::broadcast::Broadcaster;

/// Default read buffer size for pull-based sources
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Totals for one producer run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub bytes_read: u64,
    pub units_published: u64,
}

struct Producer<'a> {
    reassembler: FrameReassembler,
    broadcaster: &'a Broadcaster<AccessUnit>,
    report: SourceReport,
}

impl<'a> Producer<'a> {
    fn new(reassembler: FrameReassembler, broadcaster: &'a Broadcaster<AccessUnit>) -> Self {
        Self {
            reassembler,
            broadcaster,
            report: SourceReport::default(),
        }
    }

    fn feed(&mut self, chunk: &[u8]) {
        self.report.bytes_read += chunk.len() as u64;
        for unit in self.reassembler.push(chunk) {
            self.publish(unit);
        }
    }

    fn publish(&mut self, unit: AccessUnit) {
        tracing::trace!(
            sequence = unit.sequence,
            size = unit.len(),
            keyframe = unit.keyframe,
            "Access unit"
        );
        self.broadcaster.publish(unit);
        self.report.units_published += 1;
    }

    fn finish(mut self) -> SourceReport {
        if let Some(unit) = self.reassembler.finish() {
            self.publish(unit);
        }
        tracing::info!(
            topic = %self.broadcaster.topic(),
            bytes = self.report.bytes_read,
            units = self.report.units_published,
            "Media source ended"
        );
        self.report
    }
}

/// Pull bytes from `reader` until EOF or a read error
///
/// Whatever is still buffered at the end is flushed as a final unit.
pub async fn pump_reader<R>(
    mut reader: R,
    reassembler: FrameReassembler,
    broadcaster: &Broadcaster<AccessUnit>,
    read_buffer_size: usize,
) -> SourceReport
where
    R: AsyncRead + Unpin,
{
    let mut producer = Producer::new(reassembler, broadcaster);
    let mut buf = BytesMut::with_capacity(read_buffer_size.max(1));

    loop {
        buf.clear();
        match reader.read_buf(&mut buf).await {
            Ok(0) => break,
            Ok(_) => producer.feed(&buf),
            Err(e) => {
                tracing::error!(error = %e, "Media read failed");
                break;
            }
        }
    }

    producer.finish()
}

/// Consume pushed chunks until every sender is gone
pub async fn pump_channel(
    mut chunks: mpsc::Receiver<Bytes>,
    reassembler: FrameReassembler,
    broadcaster: &Broadcaster<AccessUnit>,
) -> SourceReport {
    let mut producer = Producer::new(reassembler, broadcaster);

    while let Some(chunk) = chunks.recv().await {
        producer.feed(&chunk);
    }

    producer.finish()
}
