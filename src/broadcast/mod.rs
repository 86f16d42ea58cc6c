//! Non-blocking fan-out of payloads to independently paced subscribers
//!
//! One [`Broadcaster`] exists per topic (video access units, telemetry). Every
//! subscriber owns a bounded sink, by default with room for a single pending
//! item. Publishing never waits: a payload that does not fit into a sink is
//! dropped for that sink only.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<Broadcaster<T>>
//!                   ┌──────────────────────────────┐
//!                   │ sinks: Mutex<HashMap<        │
//!                   │   SubscriptionId,            │
//!                   │   mpsc::Sender<T> (cap 1)    │
//!                   │ >>                           │
//!                   └──────────────┬───────────────┘
//!                                  │ try_send (drop on full)
//!         ┌────────────────────────┼────────────────────────┐
//!         ▼                        ▼                        ▼
//!   [Subscription 1]         [Subscription 2]         [Subscription 3]
//!   forward loop ──► viewer  forward loop ──► viewer  forward loop ──► viewer
//! ```
//!
//! Subscriptions are keyed by a stable [`SubscriptionId`] rather than by the
//! identity of the sink, so removal always removes exactly the entry that was
//! registered.

pub mod config;
pub mod store;
pub mod subscription;

pub use config::BroadcastConfig;
pub use store::{Broadcaster, PublishReport};
pub use subscription::{Subscription, SubscriptionId};
