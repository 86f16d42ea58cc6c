//! Drone video and telemetry gateway
//!
//! Splits the raw H.264 byte stream coming off a device into access units,
//! fans video and telemetry out to any number of viewers without letting a
//! slow viewer hold up the others, and turns each viewer's control messages
//! into device commands.
//!
//! ```text
//! device bytes -> FrameReassembler -> Broadcaster<AccessUnit> --+
//! telemetry -> dedup -> JSON -> Broadcaster<Bytes> -------------+-> session -> viewer
//! viewer control -> CommandDecoder -> DroneActuator <-----------+
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use drone_gateway::{
//!     Broadcaster, CommandDecoder, GatewayConfig, GatewayServer, LoggingActuator,
//!     SessionCoordinator,
//! };
//!
//! # async fn run() -> drone_gateway::Result<()> {
//! let coordinator = SessionCoordinator::new(
//!     Arc::new(Broadcaster::new("video")),
//!     Arc::new(Broadcaster::new("telemetry")),
//!     Arc::new(LoggingActuator::new()),
//!     CommandDecoder::default(),
//! );
//! let server = GatewayServer::new(GatewayConfig::default(), Arc::new(coordinator));
//! server.run().await
//! # }
//! ```

pub mod broadcast;
pub mod control;
pub mod device;
pub mod error;
pub mod media;
pub mod server;
pub mod session;
pub mod stats;
pub mod telemetry;

pub use broadcast::{BroadcastConfig, Broadcaster, PublishReport, Subscription, SubscriptionId};
pub use control::{Command, CommandDecoder, CommandOutcome, DecoderConfig};
pub use device::{DroneActuator, FlipDirection, LoggingActuator};
pub use error::{Error, Result};
pub use media::{AccessUnit, FrameReassembler, ReassemblerConfig};
pub use server::{GatewayConfig, GatewayServer};
pub use session::{ControlEvent, SessionCoordinator, SessionSummary, ViewerTransport};
pub use telemetry::{pump_telemetry, TelemetrySample};
