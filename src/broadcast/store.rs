//! Broadcaster implementation
//!
//! The subscriber registry of one topic and the drop-on-full fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::config::BroadcastConfig;
use super::subscription::{Subscription, SubscriptionId};
use crate::stats::BroadcastStats;

/// Outcome of a single publish
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Sinks that accepted the payload
    pub delivered: usize,
    /// Sinks that were full and skipped this payload
    pub dropped: usize,
    /// Sinks whose receiver is gone but which are still registered
    pub closed: usize,
}

/// Fan-out registry for one payload type
///
/// The registry lock is held only while inserting/removing an entry or while
/// iterating the sinks to `try_send`. Nothing awaits under the lock, so a
/// stalled subscriber can never hold up the publisher.
pub struct Broadcaster<T> {
    topic: String,
    sinks: Mutex<HashMap<SubscriptionId, mpsc::Sender<T>>>,
    next_id: AtomicU64,
    config: BroadcastConfig,
    published: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl<T> Broadcaster<T> {
    /// Create a broadcaster with default configuration
    pub fn new(topic: impl Into<String>) -> Self {
        Self::with_config(topic, BroadcastConfig::default())
    }

    /// Create a broadcaster with custom configuration
    pub fn with_config(topic: impl Into<String>, config: BroadcastConfig) -> Self {
        Self {
            topic: topic.into(),
            sinks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            config,
            published: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Topic name used in logs
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    /// Register an externally created sink
    ///
    /// Every payload published after this returns is offered to the sink.
    pub fn subscribe_sink(&self, sink: mpsc::Sender<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let count = {
            let mut sinks = self.sinks.lock();
            sinks.insert(id, sink);
            sinks.len()
        };

        tracing::debug!(
            topic = %self.topic,
            subscription = %id,
            subscribers = count,
            "Subscriber added"
        );
        id
    }

    /// Remove one registered sink
    ///
    /// Returns `false` if `id` is not (or no longer) registered. Once this
    /// returns, no publish will touch the removed sink.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let (removed, count) = {
            let mut sinks = self.sinks.lock();
            let removed = sinks.remove(&id);
            (removed, sinks.len())
        };
        // Dropping the sender outside the lock closes the subscriber's channel
        let found = removed.is_some();
        drop(removed);

        if found {
            tracing::debug!(
                topic = %self.topic,
                subscription = %id,
                subscribers = count,
                "Subscriber removed"
            );
        }
        found
    }

    /// Number of registered sinks
    pub fn subscriber_count(&self) -> usize {
        self.sinks.lock().len()
    }

    /// Snapshot of the broadcaster counters
    pub fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            subscribers: self.subscriber_count(),
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl<T: Clone> Broadcaster<T> {
    /// Create a sink of the configured capacity and register it
    pub fn subscribe(self: &Arc<Self>) -> Subscription<T> {
        let (tx, rx) = mpsc::channel(self.config.sink_capacity);
        let id = self.subscribe_sink(tx);
        Subscription::new(id, rx, Arc::clone(self))
    }

    /// Offer a payload to every registered sink without waiting
    ///
    /// The payload must be fully built before calling: this only clones it
    /// into each sink that has room.
    pub fn publish(&self, payload: T) -> PublishReport {
        let mut report = PublishReport::default();

        {
            let sinks = self.sinks.lock();
            for (id, sink) in sinks.iter() {
                match sink.try_send(payload.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        report.dropped += 1;
                        tracing::trace!(
                            topic = %self.topic,
                            subscription = %id,
                            "Slow subscriber, payload dropped"
                        );
                    }
                    Err(TrySendError::Closed(_)) => report.closed += 1,
                }
            }
        }

        self.published.fetch_add(1, Ordering::Relaxed);
        self.delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.dropped
            .fetch_add(report.dropped as u64, Ordering::Relaxed);

        report
    }
}

impl<T> std::fmt::Debug for Broadcaster<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("topic", &self.topic)
            .field("subscribers", &self.subscriber_count())
            .field("config", &self.config)
            .finish()
    }
}
