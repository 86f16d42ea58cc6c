//! Broadcaster configuration

/// Pending items each subscriber sink can hold before payloads are dropped
pub const DEFAULT_SINK_CAPACITY: usize = 1;

/// Broadcaster configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Capacity of sinks created by [`crate::broadcast::Broadcaster::subscribe`]
    pub sink_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            sink_capacity: DEFAULT_SINK_CAPACITY,
        }
    }
}

impl BroadcastConfig {
    /// Set the sink capacity (at least 1)
    pub fn sink_capacity(mut self, capacity: usize) -> Self {
        self.sink_capacity = capacity.max(1);
        self
    }
}
