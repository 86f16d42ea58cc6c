//! Statistics and metrics for topics and viewer sessions

use std::time::Duration;

/// Broadcaster-level statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastStats {
    /// Currently registered subscribers
    pub subscribers: usize,
    /// Payloads published
    pub published: u64,
    /// Payloads accepted by a sink (one per sink)
    pub delivered: u64,
    /// Payloads dropped because a sink was full (one per sink)
    pub dropped: u64,
}

impl BroadcastStats {
    /// Fraction of offered payloads that were dropped
    pub fn drop_ratio(&self) -> f64 {
        let offered = self.delivered + self.dropped;
        if offered > 0 {
            self.dropped as f64 / offered as f64
        } else {
            0.0
        }
    }
}

/// Per-viewer session statistics
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Access units forwarded to the viewer
    pub video_frames: u64,
    /// Keyframes among them
    pub keyframes: u64,
    /// Video bytes forwarded
    pub video_bytes: u64,
    /// Telemetry payloads forwarded
    pub telemetry_messages: u64,
    /// Control messages decoded and applied
    pub commands_applied: u64,
    /// Control messages that failed to decode
    pub commands_rejected: u64,
    /// Commands the device failed to execute
    pub actuator_failures: u64,
    /// Session duration
    pub duration: Duration,
}

impl SessionStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Average video bitrate over the session (bits/sec)
    pub fn video_bitrate(&self) -> u64 {
        let secs = self.duration.as_secs();
        if secs > 0 {
            (self.video_bytes * 8) / secs
        } else {
            0
        }
    }

    /// Total control messages received
    pub fn commands_received(&self) -> u64 {
        self.commands_applied + self.commands_rejected + self.actuator_failures
    }
}
