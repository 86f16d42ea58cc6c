//! Statistics for broadcasters and viewer sessions

pub mod metrics;

pub use metrics::{BroadcastStats, SessionStats};
