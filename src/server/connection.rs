//! One viewer TCP connection

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};

use super::config::GatewayConfig;
use super::framing::{read_frame, write_frame, FrameType};
use crate::error::TransportError;
use crate::media::AccessUnit;
use crate::session::{ControlEvent, SessionCoordinator, SessionSummary, ViewerTransport};

/// Upper bound on shutting down the write half of a closing viewer
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Framed viewer transport over any byte stream
///
/// The write half sits behind an async mutex so the video and telemetry
/// forwarders never interleave partial frames.
pub struct StreamTransport<W> {
    writer: Mutex<BufWriter<W>>,
    peer: String,
}

impl<W> StreamTransport<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(writer: W, peer: impl Into<String>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            peer: peer.into(),
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    async fn send(&self, frame_type: FrameType, payload: &[u8]) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, frame_type, payload).await?;
        writer.flush().await?;
        Ok(())
    }
}

impl<W> ViewerTransport for StreamTransport<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn send_video(&self, unit: AccessUnit) -> Result<(), TransportError> {
        self.send(FrameType::Video, &unit.data).await
    }

    async fn send_telemetry(&self, payload: Bytes) -> Result<(), TransportError> {
        self.send(FrameType::Telemetry, &payload).await
    }

    /// Shut down the raw write half
    ///
    /// Bytes still buffered are discarded; a viewer that stopped reading
    /// must not hold the session open.
    async fn close(&self) {
        let mut writer = self.writer.lock().await;
        match tokio::time::timeout(CLOSE_TIMEOUT, writer.get_mut().shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(peer = %self.peer, error = %e, "Shutdown failed"),
            Err(_) => tracing::debug!(peer = %self.peer, "Shutdown timed out"),
        }
    }
}

/// Turn inbound control frames into control events
///
/// Emits [`ControlEvent::Opened`] first, since a connected stream is an
/// open control channel. Returns the number of control messages read.
pub async fn read_control<R>(
    mut reader: R,
    events: mpsc::Sender<ControlEvent>,
    max_frame: usize,
) -> Result<u64, TransportError>
where
    R: AsyncRead + Unpin,
{
    if events.send(ControlEvent::Opened).await.is_err() {
        return Ok(0);
    }

    let mut messages = 0;
    while let Some(frame) = read_frame(&mut reader, max_frame).await? {
        if frame.frame_type != FrameType::Control {
            return Err(TransportError::UnexpectedFrameType(frame.frame_type.as_u8()));
        }
        if events.send(ControlEvent::Message(frame.payload)).await.is_err() {
            break;
        }
        messages += 1;
    }
    Ok(messages)
}

/// Serve one accepted socket until the session ends
pub async fn serve_connection(
    socket: TcpStream,
    peer_addr: SocketAddr,
    coordinator: Arc<SessionCoordinator>,
    config: &GatewayConfig,
) -> SessionSummary {
    let (read_half, write_half) = socket.into_split();
    let transport = Arc::new(StreamTransport::new(write_half, peer_addr.to_string()));
    let (events_tx, events_rx) = mpsc::channel(config.control_queue);

    let reader = BufReader::with_capacity(config.read_buffer_size, read_half);
    let max_frame = config.max_control_frame;
    let control = tokio::spawn(async move {
        match read_control(reader, events_tx, max_frame).await {
            Ok(messages) => tracing::debug!(peer = %peer_addr, messages, "Viewer disconnected"),
            Err(e) => tracing::warn!(peer = %peer_addr, error = %e, "Dropping viewer"),
        }
    });

    let summary = coordinator.run_session(transport, events_rx).await;

    // The session can end on a failed send while the reader is still waiting
    control.abort();
    summary
}
