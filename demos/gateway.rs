//! Gateway demo without a drone attached
//!
//! Run with: cargo run --example gateway
//!
//! Environment:
//!   ADDR        address to listen on (default: localhost:3000)
//!   MOCK_VIDEO  recorded Annex B H.264 file to loop as the video feed;
//!               without it, raw H.264 is read from stdin
//!
//! Examples:
//!   MOCK_VIDEO=assets/flight.h264 cargo run --example gateway
//!   ffmpeg -re -i input.mp4 -c:v libx264 -bsf:v h264_mp4toannexb -f h264 - \
//!       | ADDR=0.0.0.0:3000 cargo run --example gateway
//!
//! Viewers speak the framed protocol from `drone_gateway::server::framing`
//! and receive video (0x01) and telemetry (0x02) frames; control frames
//! (0x03) such as "+takeoff" are logged by the stand-in actuator.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::lookup_host;
use tokio::sync::mpsc;

use drone_gateway::device::{RecordedVideo, SyntheticTelemetry};
use drone_gateway::media::{pump_channel, pump_reader};
use drone_gateway::{
    pump_telemetry, Broadcaster, CommandDecoder, FrameReassembler, GatewayConfig, GatewayServer,
    LoggingActuator, SessionCoordinator,
};

const DEFAULT_ADDR: &str = "localhost:3000";

async fn resolve_addr(addr: &str) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    lookup_host(addr)
        .await?
        .next()
        .ok_or_else(|| format!("Invalid listen address: '{}'", addr).into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("drone_gateway=info".parse()?)
                .add_directive("gateway=debug".parse()?),
        )
        .init();

    let addr = std::env::var("ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let config = GatewayConfig::with_addr(resolve_addr(&addr).await?);

    let video = Arc::new(Broadcaster::new("video"));
    let telemetry = Arc::new(Broadcaster::<Bytes>::new("telemetry"));

    // Video producer
    match std::env::var("MOCK_VIDEO") {
        Ok(path) => {
            let recording = RecordedVideo::open(&path).await?;
            let (chunk_tx, chunk_rx) = mpsc::channel(8);
            recording.spawn(chunk_tx);

            let video = Arc::clone(&video);
            tokio::spawn(async move {
                pump_channel(chunk_rx, FrameReassembler::new(), &video).await;
            });
        }
        Err(_) => {
            tracing::info!("MOCK_VIDEO not set, reading H.264 from stdin");
            let video = Arc::clone(&video);
            let read_buffer_size = config.read_buffer_size;
            tokio::spawn(async move {
                pump_reader(
                    tokio::io::stdin(),
                    FrameReassembler::new(),
                    &video,
                    read_buffer_size,
                )
                .await;
            });
        }
    }

    // Telemetry producer
    let (sample_tx, sample_rx) = mpsc::channel(8);
    SyntheticTelemetry::new().spawn(sample_tx);
    tokio::spawn(pump_telemetry(sample_rx, Arc::clone(&telemetry)));

    let coordinator = SessionCoordinator::new(
        video,
        telemetry,
        Arc::new(LoggingActuator::new()),
        CommandDecoder::default(),
    );
    let server = GatewayServer::new(config, Arc::new(coordinator));

    println!("Gateway listening on {}", server.bind_addr());
    println!("Press Ctrl+C to stop");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("Failed to listen for Ctrl+C: {}", e);
            }
        })
        .await?;

    let stats = server.coordinator().video().stats();
    println!(
        "Published {} video units, dropped {} deliveries ({:.1}%)",
        stats.published,
        stats.dropped,
        stats.drop_ratio() * 100.0
    );

    Ok(())
}
