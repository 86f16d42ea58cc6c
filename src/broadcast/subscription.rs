//! Subscription handles

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use super::store::Broadcaster;

/// Stable identity of one registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(super) u64);

impl SubscriptionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving end of a registered sink
///
/// The registry entry is removed exactly once: either by
/// [`Subscription::unsubscribe`] or when the handle is dropped, whichever
/// comes first.
pub struct Subscription<T> {
    id: SubscriptionId,
    rx: mpsc::Receiver<T>,
    broadcaster: Arc<Broadcaster<T>>,
    registered: bool,
}

impl<T> Subscription<T> {
    pub(super) fn new(
        id: SubscriptionId,
        rx: mpsc::Receiver<T>,
        broadcaster: Arc<Broadcaster<T>>,
    ) -> Self {
        Self {
            id,
            rx,
            broadcaster,
            registered: true,
        }
    }

    /// Registry key of this subscription
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Topic this subscription belongs to
    pub fn topic(&self) -> &str {
        self.broadcaster.topic()
    }

    /// Wait for the next payload
    ///
    /// Returns `None` once the subscription has been removed from the
    /// registry and every pending payload was consumed.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Take a pending payload without waiting
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        self.rx.try_recv()
    }

    /// Remove this subscription from the registry
    ///
    /// Returns whether an entry was removed.
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        if !self.registered {
            return false;
        }
        self.registered = false;
        self.broadcaster.unsubscribe(self.id)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.broadcaster.topic())
            .field("registered", &self.registered)
            .finish()
    }
}
