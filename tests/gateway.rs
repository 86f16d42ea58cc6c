//! End-to-end: producer -> broadcasters -> TCP viewer -> actuator

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};

use drone_gateway::media::pump_channel;
use drone_gateway::server::{read_frame, Frame, FrameType};
use drone_gateway::{
    pump_telemetry, BroadcastConfig, Broadcaster, CommandDecoder, FrameReassembler,
    GatewayConfig, GatewayServer, LoggingActuator, SessionCoordinator, TelemetrySample,
};

const TIMEOUT: Duration = Duration::from_secs(5);

struct Gateway {
    addr: std::net::SocketAddr,
    server: Arc<GatewayServer>,
    actuator: Arc<LoggingActuator>,
    stop: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<drone_gateway::Result<()>>,
}

async fn start_gateway() -> Gateway {
    let config = BroadcastConfig::default().sink_capacity(64);
    let actuator = Arc::new(LoggingActuator::new());
    let coordinator = SessionCoordinator::new(
        Arc::new(Broadcaster::with_config("video", config.clone())),
        Arc::new(Broadcaster::with_config("telemetry", config)),
        actuator.clone(),
        CommandDecoder::default(),
    );
    let server = Arc::new(GatewayServer::new(
        GatewayConfig::default(),
        Arc::new(coordinator),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stop_rx) = oneshot::channel::<()>();
    let handle = {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            server
                .serve_until(listener, async {
                    let _ = stop_rx.await;
                })
                .await
        })
    };

    Gateway {
        addr,
        server,
        actuator,
        stop,
        handle,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn viewer_receives_video_and_telemetry_and_controls_device() {
    let gateway = start_gateway().await;
    let coordinator = Arc::clone(gateway.server.coordinator());

    let stream = TcpStream::connect(gateway.addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    wait_until(|| {
        coordinator.video().subscriber_count() == 1
            && coordinator.telemetry().subscriber_count() == 1
    })
    .await;

    // Video: three units pushed byte by byte
    let stream_bytes: Vec<u8> = [
        &[0x00, 0x00, 0x00, 0x01, 0x67, 0x64, 0x00, 0x1F][..],
        &[0x00, 0x00, 0x00, 0x01, 0x41, 0x9A, 0x02][..],
        &[0x00, 0x00, 0x00, 0x01, 0x41, 0x9A, 0x04][..],
    ]
    .concat();
    let (chunk_tx, chunk_rx) = mpsc::channel(256);
    let video = Arc::clone(coordinator.video());
    let producer =
        tokio::spawn(async move { pump_channel(chunk_rx, FrameReassembler::new(), &video).await });
    for byte in &stream_bytes {
        chunk_tx.send(Bytes::copy_from_slice(&[*byte])).await.unwrap();
    }
    drop(chunk_tx);
    assert_eq!(producer.await.unwrap().units_published, 3);

    let mut received = Vec::new();
    for _ in 0..3 {
        let frame = tokio::time::timeout(TIMEOUT, read_frame(&mut reader, 1 << 20))
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(frame.frame_type, FrameType::Video);
        received.extend_from_slice(&frame.payload);
    }
    assert_eq!(received, stream_bytes);

    // Telemetry: duplicates collapse before reaching the viewer
    let (sample_tx, sample_rx) = mpsc::channel(8);
    let telemetry = tokio::spawn(pump_telemetry(sample_rx, Arc::clone(coordinator.telemetry())));
    for sample in [
        TelemetrySample::new(4, 90),
        TelemetrySample::new(4, 90),
        TelemetrySample::new(5, 90),
    ] {
        sample_tx.send(sample).await.unwrap();
    }
    drop(sample_tx);
    assert_eq!(telemetry.await.unwrap(), 2);

    for expected in [r#"{"Height":4,"BatteryPercentage":90}"#, r#"{"Height":5,"BatteryPercentage":90}"#] {
        let frame = tokio::time::timeout(TIMEOUT, read_frame(&mut reader, 1 << 20))
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(frame.frame_type, FrameType::Telemetry);
        assert_eq!(frame.payload, Bytes::from(expected));
    }

    // Control: one valid, one unrecognized, one valid
    for message in ["+takeoff", "+xyzzy", "-forwa"] {
        let frame = Frame::new(FrameType::Control, Bytes::from(message));
        write_half.write_all(&frame.encode().unwrap()).await.unwrap();
    }
    let actuator = Arc::clone(&gateway.actuator);
    wait_until(|| actuator.command_count() == 2).await;

    // Disconnect releases both subscriptions
    write_half.shutdown().await.unwrap();
    drop(reader);
    wait_until(|| {
        coordinator.video().subscriber_count() == 0
            && coordinator.telemetry().subscriber_count() == 0
    })
    .await;

    let _ = gateway.stop.send(());
    gateway.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn oversized_control_frame_drops_viewer() {
    let gateway = start_gateway().await;
    let coordinator = Arc::clone(gateway.server.coordinator());

    let mut stream = TcpStream::connect(gateway.addr).await.unwrap();
    wait_until(|| coordinator.video().subscriber_count() == 1).await;

    // Declared length far above the default limit
    stream
        .write_all(&[0x03, 0x00, 0x10, 0x00, 0x00])
        .await
        .unwrap();
    wait_until(|| coordinator.video().subscriber_count() == 0).await;
    assert_eq!(gateway.actuator.command_count(), 0);

    let _ = gateway.stop.send(());
    gateway.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn one_viewer_leaving_does_not_affect_another() {
    let gateway = start_gateway().await;
    let coordinator = Arc::clone(gateway.server.coordinator());

    let staying = TcpStream::connect(gateway.addr).await.unwrap();
    let leaving = TcpStream::connect(gateway.addr).await.unwrap();
    wait_until(|| coordinator.video().subscriber_count() == 2).await;

    drop(leaving);
    wait_until(|| coordinator.video().subscriber_count() == 1).await;

    let unit = Bytes::from_static(&[0x00, 0x00, 0x00, 0x01, 0x41, 0x01]);
    coordinator
        .video()
        .publish(drone_gateway::AccessUnit::new(0, unit.clone(), false));

    let mut reader = BufReader::new(staying);
    let frame = tokio::time::timeout(TIMEOUT, read_frame(&mut reader, 1024))
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(frame.payload, unit);

    let _ = gateway.stop.send(());
    gateway.handle.await.unwrap().unwrap();
}
