//! Viewer control channel
//!
//! Each inbound control message is decoded independently into a
//! [`Command`] and applied synchronously to the
//! [`DroneActuator`](crate::device::DroneActuator). Nothing is kept between
//! messages.

pub mod command;
pub mod dispatch;

pub use command::{Action, Command, CommandDecoder, DecoderConfig};
pub use dispatch::{dispatch, CommandOutcome};
