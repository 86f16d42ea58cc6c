//! Flight telemetry ingestion
//!
//! Samples arrive from the device far more often than they change. Only a
//! sample that differs from the last published one is serialized and handed
//! to the telemetry broadcaster, which keeps viewer channels quiet.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::broadcast::{Broadcaster, PublishReport};
use crate::error::Result;

/// One flight data reading
///
/// Serialized as `{"Height":..,"BatteryPercentage":..}`, the shape viewer
/// pages expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TelemetrySample {
    /// Height in decimeters
    pub height: i32,
    /// Remaining battery, 0-100
    pub battery_percentage: i32,
}

impl TelemetrySample {
    pub fn new(height: i32, battery_percentage: i32) -> Self {
        Self {
            height,
            battery_percentage,
        }
    }

    /// JSON wire payload
    pub fn encode(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

/// Suppresses consecutive identical samples
#[derive(Debug, Default)]
pub struct TelemetryDedup {
    last: Option<TelemetrySample>,
}

impl TelemetryDedup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `sample` differs from the last accepted one
    pub fn observe(&mut self, sample: TelemetrySample) -> bool {
        if self.last == Some(sample) {
            return false;
        }
        self.last = Some(sample);
        true
    }

    /// Last accepted sample
    pub fn last(&self) -> Option<TelemetrySample> {
        self.last
    }
}

/// Deduplicating, serializing front end of the telemetry broadcaster
pub struct TelemetryPublisher {
    broadcaster: Arc<Broadcaster<Bytes>>,
    dedup: TelemetryDedup,
}

impl TelemetryPublisher {
    pub fn new(broadcaster: Arc<Broadcaster<Bytes>>) -> Self {
        Self {
            broadcaster,
            dedup: TelemetryDedup::new(),
        }
    }

    /// Publish `sample` unless it repeats the previous one
    ///
    /// Returns `None` for a suppressed duplicate.
    pub fn publish(&mut self, sample: TelemetrySample) -> Result<Option<PublishReport>> {
        if !self.dedup.observe(sample) {
            return Ok(None);
        }
        // Serialize before the broadcaster takes its lock
        let payload = sample.encode()?;
        let report = self.broadcaster.publish(payload);

        tracing::trace!(
            height = sample.height,
            battery = sample.battery_percentage,
            delivered = report.delivered,
            "Telemetry published"
        );
        Ok(Some(report))
    }
}

/// Drain a telemetry source into the broadcaster until the source closes
///
/// Returns the number of samples published after deduplication.
pub async fn pump_telemetry(
    mut samples: mpsc::Receiver<TelemetrySample>,
    broadcaster: Arc<Broadcaster<Bytes>>,
) -> u64 {
    let mut publisher = TelemetryPublisher::new(broadcaster);
    let mut published = 0;

    while let Some(sample) = samples.recv().await {
        match publisher.publish(sample) {
            Ok(Some(_)) => published += 1,
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "Failed to encode telemetry"),
        }
    }

    tracing::info!(published, "Telemetry source ended");
    published
}
