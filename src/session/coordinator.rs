//! Per-viewer session lifecycle
//!
//! A session owns two forwarding tasks (video, and telemetry once the
//! control channel opens) plus the control loop. Each forwarding task owns
//! its [`Subscription`], so stopping the task is what unsubscribes it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::transport::{ControlEvent, ViewerTransport};
use crate::broadcast::{Broadcaster, Subscription};
use crate::control::{CommandDecoder, CommandOutcome};
use crate::device::DroneActuator;
use crate::media::AccessUnit;
use crate::stats::SessionStats;

/// Final report of one session
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: u64,
    pub stats: SessionStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Video,
    Telemetry,
}

/// Counters updated by the forwarding tasks
#[derive(Debug, Default)]
struct ForwardCounters {
    video_frames: AtomicU64,
    keyframes: AtomicU64,
    video_bytes: AtomicU64,
    telemetry_messages: AtomicU64,
}

impl ForwardCounters {
    fn record_video(&self, size: usize, keyframe: bool) {
        self.video_frames.fetch_add(1, Ordering::Relaxed);
        self.video_bytes.fetch_add(size as u64, Ordering::Relaxed);
        if keyframe {
            self.keyframes.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn fill(&self, stats: &mut SessionStats) {
        stats.video_frames = self.video_frames.load(Ordering::Relaxed);
        stats.keyframes = self.keyframes.load(Ordering::Relaxed);
        stats.video_bytes = self.video_bytes.load(Ordering::Relaxed);
        stats.telemetry_messages = self.telemetry_messages.load(Ordering::Relaxed);
    }
}

/// Wires viewer connections to the shared broadcasters and the device
pub struct SessionCoordinator {
    video: Arc<Broadcaster<AccessUnit>>,
    telemetry: Arc<Broadcaster<Bytes>>,
    actuator: Arc<dyn DroneActuator>,
    decoder: CommandDecoder,
    next_session_id: AtomicU64,
}

impl SessionCoordinator {
    pub fn new(
        video: Arc<Broadcaster<AccessUnit>>,
        telemetry: Arc<Broadcaster<Bytes>>,
        actuator: Arc<dyn DroneActuator>,
        decoder: CommandDecoder,
    ) -> Self {
        Self {
            video,
            telemetry,
            actuator,
            decoder,
            next_session_id: AtomicU64::new(1),
        }
    }

    pub fn video(&self) -> &Arc<Broadcaster<AccessUnit>> {
        &self.video
    }

    pub fn telemetry(&self) -> &Arc<Broadcaster<Bytes>> {
        &self.telemetry
    }

    /// Serve one viewer until its control channel ends or a send fails
    ///
    /// Video is forwarded from the start. Telemetry is subscribed the first
    /// time [`ControlEvent::Opened`] arrives. On return both subscriptions
    /// have been released and the transport closed.
    pub async fn run_session<T>(
        &self,
        transport: Arc<T>,
        mut control: mpsc::Receiver<ControlEvent>,
    ) -> SessionSummary
    where
        T: ViewerTransport,
    {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();
        let counters = Arc::new(ForwardCounters::default());
        let mut stats = SessionStats::new();
        let mut forwarders = JoinSet::new();

        tracing::info!(session_id, "Session opened");

        forwarders.spawn(forward_video(
            session_id,
            self.video.subscribe(),
            Arc::clone(&transport),
            Arc::clone(&counters),
        ));
        let mut telemetry_open = false;

        loop {
            tokio::select! {
                event = control.recv() => match event {
                    Some(ControlEvent::Opened) if !telemetry_open => {
                        telemetry_open = true;
                        tracing::debug!(session_id, "Control channel opened");
                        forwarders.spawn(forward_telemetry(
                            session_id,
                            self.telemetry.subscribe(),
                            Arc::clone(&transport),
                            Arc::clone(&counters),
                        ));
                    }
                    Some(ControlEvent::Opened) => {
                        tracing::debug!(session_id, "Duplicate open ignored");
                    }
                    Some(ControlEvent::Message(message)) => {
                        self.handle_control(session_id, &message, &mut stats);
                    }
                    None => {
                        tracing::debug!(session_id, "Control channel closed");
                        break;
                    }
                },
                Some(finished) = forwarders.join_next() => {
                    match finished {
                        Ok(topic) => tracing::debug!(session_id, ?topic, "Forwarding stopped"),
                        Err(e) => tracing::error!(session_id, error = %e, "Forwarding task failed"),
                    }
                    break;
                }
            }
        }

        // Aborting the forwarders drops their subscriptions
        forwarders.shutdown().await;
        transport.close().await;

        counters.fill(&mut stats);
        stats.duration = started.elapsed();

        tracing::info!(
            session_id,
            video_frames = stats.video_frames,
            telemetry = stats.telemetry_messages,
            commands = stats.commands_received(),
            duration_ms = stats.duration.as_millis() as u64,
            "Session closed"
        );

        SessionSummary { session_id, stats }
    }

    fn handle_control(&self, session_id: u64, message: &[u8], stats: &mut SessionStats) {
        match self.decoder.handle(message, self.actuator.as_ref()) {
            CommandOutcome::Applied(command) => {
                tracing::debug!(session_id, ?command, "Control command");
                stats.commands_applied += 1;
            }
            CommandOutcome::Rejected(_) => stats.commands_rejected += 1,
            CommandOutcome::Failed(..) => stats.actuator_failures += 1,
        }
    }
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("video", &self.video)
            .field("telemetry", &self.telemetry)
            .field("decoder", &self.decoder)
            .finish()
    }
}

async fn forward_video<T: ViewerTransport>(
    session_id: u64,
    mut subscription: Subscription<AccessUnit>,
    transport: Arc<T>,
    counters: Arc<ForwardCounters>,
) -> Topic {
    while let Some(unit) = subscription.recv().await {
        let size = unit.len();
        let keyframe = unit.keyframe;
        if let Err(e) = transport.send_video(unit).await {
            tracing::debug!(session_id, error = %e, "Video send failed");
            break;
        }
        counters.record_video(size, keyframe);
    }
    Topic::Video
}

async fn forward_telemetry<T: ViewerTransport>(
    session_id: u64,
    mut subscription: Subscription<Bytes>,
    transport: Arc<T>,
    counters: Arc<ForwardCounters>,
) -> Topic {
    while let Some(payload) = subscription.recv().await {
        if let Err(e) = transport.send_telemetry(payload).await {
            tracing::debug!(session_id, error = %e, "Telemetry send failed");
            break;
        }
        counters.telemetry_messages.fetch_add(1, Ordering::Relaxed);
    }
    Topic::Telemetry
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::broadcast::BroadcastConfig;
    use crate::device::LoggingActuator;
    use crate::error::TransportError;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Sent {
        Video(Vec<u8>),
        Telemetry(Vec<u8>),
    }

    /// Hands every payload to a channel; optionally fails video sends
    struct ChannelTransport {
        tx: mpsc::UnboundedSender<Sent>,
        fail_video: bool,
        closed: AtomicBool,
    }

    impl ChannelTransport {
        fn new(fail_video: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<Sent>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let transport = Arc::new(Self {
                tx,
                fail_video,
                closed: AtomicBool::new(false),
            });
            (transport, rx)
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    impl ViewerTransport for ChannelTransport {
        async fn send_video(&self, unit: AccessUnit) -> Result<(), TransportError> {
            if self.fail_video {
                return Err(TransportError::Closed);
            }
            self.tx
                .send(Sent::Video(unit.data.to_vec()))
                .map_err(|_| TransportError::Closed)
        }

        async fn send_telemetry(&self, payload: Bytes) -> Result<(), TransportError> {
            self.tx
                .send(Sent::Telemetry(payload.to_vec()))
                .map_err(|_| TransportError::Closed)
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    struct Fixture {
        coordinator: Arc<SessionCoordinator>,
        actuator: Arc<LoggingActuator>,
    }

    fn fixture() -> Fixture {
        let config = BroadcastConfig::default().sink_capacity(8);
        let actuator = Arc::new(LoggingActuator::new());
        let coordinator = SessionCoordinator::new(
            Arc::new(Broadcaster::with_config("video", config.clone())),
            Arc::new(Broadcaster::with_config("telemetry", config)),
            actuator.clone(),
            CommandDecoder::default(),
        );
        Fixture {
            coordinator: Arc::new(coordinator),
            actuator,
        }
    }

    async fn wait_for_subscribers<P>(broadcaster: &Broadcaster<P>, count: usize) {
        while broadcaster.subscriber_count() != count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn unit(sequence: u64, payload: u8) -> AccessUnit {
        AccessUnit::new(
            sequence,
            Bytes::from(vec![0x00, 0x00, 0x00, 0x01, 0x41, payload]),
            false,
        )
    }

    #[tokio::test]
    async fn test_session_forwards_and_controls() {
        let Fixture {
            coordinator,
            actuator,
        } = fixture();
        let (transport, mut sent) = ChannelTransport::new(false);
        let (control_tx, control_rx) = mpsc::channel(8);

        let session = {
            let coordinator = Arc::clone(&coordinator);
            let transport = Arc::clone(&transport);
            tokio::spawn(async move { coordinator.run_session(transport, control_rx).await })
        };

        wait_for_subscribers(coordinator.video(), 1).await;
        assert_eq!(coordinator.telemetry().subscriber_count(), 0);

        coordinator.video().publish(unit(0, 0xAA));
        assert_eq!(
            sent.recv().await,
            Some(Sent::Video(vec![0x00, 0x00, 0x00, 0x01, 0x41, 0xAA]))
        );

        control_tx.send(ControlEvent::Opened).await.unwrap();
        control_tx.send(ControlEvent::Opened).await.unwrap();
        wait_for_subscribers(coordinator.telemetry(), 1).await;

        coordinator.telemetry().publish(Bytes::from_static(b"{}"));
        assert_eq!(sent.recv().await, Some(Sent::Telemetry(b"{}".to_vec())));

        control_tx
            .send(ControlEvent::Message(Bytes::from_static(b"+takeoff")))
            .await
            .unwrap();
        control_tx
            .send(ControlEvent::Message(Bytes::from_static(b"+xyzzy")))
            .await
            .unwrap();
        control_tx
            .send(ControlEvent::Message(Bytes::from_static(b"+land")))
            .await
            .unwrap();
        drop(control_tx);

        let summary = session.await.unwrap();
        assert_eq!(summary.stats.video_frames, 1);
        assert_eq!(summary.stats.telemetry_messages, 1);
        assert_eq!(summary.stats.commands_applied, 2);
        assert_eq!(summary.stats.commands_rejected, 1);
        assert_eq!(actuator.command_count(), 2);

        assert!(transport.is_closed());
        assert_eq!(coordinator.video().subscriber_count(), 0);
        assert_eq!(coordinator.telemetry().subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_send_failure_ends_session() {
        let Fixture { coordinator, .. } = fixture();
        let (transport, _sent) = ChannelTransport::new(true);
        let (control_tx, control_rx) = mpsc::channel(8);

        let session = {
            let coordinator = Arc::clone(&coordinator);
            let transport = Arc::clone(&transport);
            tokio::spawn(async move { coordinator.run_session(transport, control_rx).await })
        };

        control_tx.send(ControlEvent::Opened).await.unwrap();
        wait_for_subscribers(coordinator.telemetry(), 1).await;
        wait_for_subscribers(coordinator.video(), 1).await;
        coordinator.video().publish(unit(0, 0x01));

        let summary = session.await.unwrap();
        assert_eq!(summary.stats.video_frames, 0);
        assert!(transport.is_closed());
        assert_eq!(coordinator.video().subscriber_count(), 0);
        assert_eq!(coordinator.telemetry().subscriber_count(), 0);

        // Control sender outlives the session without effect
        assert!(control_tx.send(ControlEvent::Opened).await.is_err());
    }

    #[tokio::test]
    async fn test_session_ids_are_unique() {
        let Fixture { coordinator, .. } = fixture();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let (transport, _sent) = ChannelTransport::new(false);
            let (control_tx, control_rx) = mpsc::channel(1);
            drop(control_tx);
            ids.push(coordinator.run_session(transport, control_rx).await.session_id);
        }
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_control_state() {
        let Fixture {
            coordinator,
            actuator,
        } = fixture();
        let record = Arc::new(Mutex::new(Vec::new()));

        let mut sessions = Vec::new();
        for message in ["+forwa", "-clock"] {
            let (transport, _sent) = ChannelTransport::new(false);
            let (control_tx, control_rx) = mpsc::channel(1);
            control_tx
                .send(ControlEvent::Message(Bytes::from_static(message.as_bytes())))
                .await
                .unwrap();
            drop(control_tx);
            let coordinator = Arc::clone(&coordinator);
            let record = Arc::clone(&record);
            sessions.push(tokio::spawn(async move {
                let summary = coordinator.run_session(transport, control_rx).await;
                record.lock().push(summary.stats.commands_applied);
            }));
        }
        for session in sessions {
            session.await.unwrap();
        }

        assert_eq!(*record.lock(), vec![1, 1]);
        assert_eq!(actuator.command_count(), 2);
    }
}
