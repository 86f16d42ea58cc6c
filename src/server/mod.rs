//! TCP viewer gateway
//!
//! Viewers connect over TCP and exchange length-prefixed frames (see
//! [`framing`]). Each connection becomes one session on the shared
//! [`SessionCoordinator`](crate::session::SessionCoordinator).

pub mod config;
pub mod connection;
pub mod framing;
pub mod listener;

pub use config::GatewayConfig;
pub use connection::{read_control, serve_connection, StreamTransport};
pub use framing::{read_frame, write_frame, Frame, FrameType};
pub use listener::GatewayServer;
