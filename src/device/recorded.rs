//! Recorded-stream stand-ins for a live device
//!
//! [`RecordedVideo`] replays an H.264 capture in a loop, one access unit per
//! tick, the way the device would deliver it. [`SyntheticTelemetry`] emits
//! slowly changing flight data so deduplication and fan-out have something
//! to work with.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::media::reassembler::{reassemble, ReassemblerConfig};
use crate::telemetry::TelemetrySample;

/// Default frame pacing (25 fps)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(40);

/// Default telemetry sampling period
pub const DEFAULT_TELEMETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Looping replay of a recorded Annex B file
#[derive(Debug, Clone)]
pub struct RecordedVideo {
    units: Vec<Bytes>,
    interval: Duration,
    looping: bool,
}

impl RecordedVideo {
    /// Load a recording from disk
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let data = tokio::fs::read(path.as_ref()).await?;
        let recording = Self::from_bytes(data, ReassemblerConfig::default());
        tracing::info!(
            path = %path.as_ref().display(),
            units = recording.units.len(),
            "Loaded recording"
        );
        Ok(recording)
    }

    /// Split an in-memory recording into access units
    pub fn from_bytes(data: impl AsRef<[u8]>, config: ReassemblerConfig) -> Self {
        let units = reassemble([data.as_ref()], config)
            .map(|unit| unit.data)
            .collect();
        Self {
            units,
            interval: DEFAULT_FRAME_INTERVAL,
            looping: true,
        }
    }

    /// Set the pacing between units
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Stop after one pass instead of looping
    pub fn once(mut self) -> Self {
        self.looping = false;
        self
    }

    /// Number of access units in the recording
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Start replaying into `chunks`
    ///
    /// The task ends after one pass (when not looping) or as soon as the
    /// receiving side is gone.
    pub fn spawn(self, chunks: mpsc::Sender<Bytes>) -> JoinHandle<()> {
        tokio::spawn(async move {
            if self.units.is_empty() {
                tracing::warn!("Recording has no data");
                return;
            }

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                for unit in &self.units {
                    ticker.tick().await;
                    if chunks.send(unit.clone()).await.is_err() {
                        tracing::debug!("Recording consumer gone");
                        return;
                    }
                }
                if !self.looping {
                    break;
                }
            }
            tracing::debug!("Recording finished");
        })
    }
}

/// Periodic flight data generator
#[derive(Debug, Clone)]
pub struct SyntheticTelemetry {
    interval: Duration,
}

impl SyntheticTelemetry {
    pub fn new() -> Self {
        Self {
            interval: DEFAULT_TELEMETRY_INTERVAL,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sample for tick `n`: height changes every other tick, battery drains
    /// one percent every ten ticks
    pub fn sample_at(n: u64) -> TelemetrySample {
        let height = ((n / 2) % 10) as i32;
        let battery = 100 - ((n / 10) % 101) as i32;
        TelemetrySample::new(height, battery)
    }

    /// Start emitting samples until the receiver is gone
    pub fn spawn(self, samples: mpsc::Sender<TelemetrySample>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            let mut n = 0u64;
            loop {
                ticker.tick().await;
                if samples.send(Self::sample_at(n)).await.is_err() {
                    break;
                }
                n += 1;
            }
        })
    }
}

impl Default for SyntheticTelemetry {
    fn default() -> Self {
        Self::new()
    }
}
