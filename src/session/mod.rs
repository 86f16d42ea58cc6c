//! Viewer sessions
//!
//! A session connects one viewer to the shared video and telemetry
//! broadcasters and feeds the viewer's control messages to the device.

pub mod coordinator;
pub mod transport;

pub use coordinator::{SessionCoordinator, SessionSummary};
pub use transport::{ControlEvent, ViewerTransport};
