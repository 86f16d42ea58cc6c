//! Video handling
//!
//! This module provides:
//! - H.264 Annex B unit typing
//! - Access unit reassembly from arbitrarily chunked byte streams
//! - Producer loops that publish access units to a broadcaster

pub mod frame;
pub mod h264;
pub mod reassembler;
pub mod source;

pub use frame::AccessUnit;
pub use h264::{NaluHeaders, NaluType};
pub use reassembler::{reassemble, FrameReassembler, ReassemblerConfig};
pub use source::{pump_channel, pump_reader, SourceReport};
