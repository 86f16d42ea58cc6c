//! Error types for the gateway
//!
//! Each area has its own error enum; [`Error`] wraps them for APIs that can
//! fail in more than one way.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Control message could not be decoded
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Device rejected or failed a command
    #[error("Actuator error: {0}")]
    Actuator(#[from] ActuatorError),

    /// Viewer transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Telemetry serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Control message decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Message had no bytes at all
    #[error("Empty control message")]
    Empty,

    /// Keyword is not part of the command vocabulary
    #[error("Unrecognized command: {0:?}")]
    Unrecognized(String),

    /// `flip` without a trailing direction digit
    #[error("Flip command is missing a direction digit")]
    MissingFlipDirection,

    /// Flip direction digit outside the supported range
    #[error("Invalid flip direction: {0}")]
    InvalidFlipDirection(u8),

    /// Movement magnitude does not fit the configured scale
    #[error("Movement magnitude overflows with scale {0}")]
    MagnitudeOverflow(i32),
}

/// Errors reported by a [`crate::device::DroneActuator`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    /// The device refused the command
    #[error("Command rejected by device: {0}")]
    Rejected(String),

    /// No link to the device
    #[error("Device not connected")]
    NotConnected,

    /// The command could not be delivered to the device
    #[error("Device link error: {0}")]
    Link(String),
}

/// Viewer transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// The viewer connection is gone
    #[error("Connection closed")]
    Closed,

    /// Inbound frame exceeds the configured limit
    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    /// Inbound frame type byte is not known
    #[error("Unknown frame type: 0x{0:02x}")]
    UnknownFrameType(u8),

    /// Peer sent a frame type it is not allowed to send
    #[error("Unexpected frame type: 0x{0:02x}")]
    UnexpectedFrameType(u8),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
