//! Viewer transport boundary

use std::future::Future;

use bytes::Bytes;

use crate::error::TransportError;
use crate::media::AccessUnit;

/// Inbound event on a viewer's control channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// The viewer's control channel is ready; telemetry may flow
    Opened,
    /// One binary control message
    Message(Bytes),
}

/// Outbound half of one viewer connection
///
/// Implementations are shared between the per-topic forwarding tasks, so
/// sends may be called concurrently from two tasks; each call must write
/// its payload atomically with respect to the other.
///
/// Implement with `async fn`:
///
/// ```ignore
/// impl ViewerTransport for MyTransport {
///     async fn send_video(&self, unit: AccessUnit) -> Result<(), TransportError> {
///         // ...
///     }
///     // ...
/// }
/// ```
pub trait ViewerTransport: Send + Sync + 'static {
    /// Deliver one access unit on the video channel
    fn send_video(
        &self,
        unit: AccessUnit,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Deliver one serialized telemetry payload
    fn send_telemetry(
        &self,
        payload: Bytes,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Release the connection
    ///
    /// Called once when the session ends.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
