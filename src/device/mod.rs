//! Device boundary
//!
//! [`DroneActuator`] is the capability surface decoded control commands are
//! applied to. A real driver implements it on top of its radio link; the
//! stand-ins in this module let the gateway run without hardware.

pub mod logging;
pub mod recorded;

pub use logging::LoggingActuator;
pub use recorded::{RecordedVideo, SyntheticTelemetry};

use crate::error::ActuatorError;

/// Flip direction, numbered the way the device protocol numbers it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlipDirection {
    Front = 0,
    Left = 1,
    Back = 2,
    Right = 3,
    ForwardLeft = 4,
    BackLeft = 5,
    BackRight = 6,
    ForwardRight = 7,
}

impl FlipDirection {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(FlipDirection::Front),
            1 => Some(FlipDirection::Left),
            2 => Some(FlipDirection::Back),
            3 => Some(FlipDirection::Right),
            4 => Some(FlipDirection::ForwardLeft),
            5 => Some(FlipDirection::BackLeft),
            6 => Some(FlipDirection::BackRight),
            7 => Some(FlipDirection::ForwardRight),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for FlipDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({})", self, self.as_u8())
    }
}

/// Actuation capabilities of the controlled device
///
/// Calls are synchronous hand-offs to the driver and must not block for
/// long. Magnitudes are signed: negative values move backward, left, down
/// or counter-clockwise.
pub trait DroneActuator: Send + Sync + 'static {
    /// Move forward (positive) or backward (negative)
    fn move_forward_back(&self, magnitude: i32) -> Result<(), ActuatorError>;

    /// Rotate clockwise (positive) or counter-clockwise (negative)
    fn rotate(&self, magnitude: i32) -> Result<(), ActuatorError>;

    /// Move right (positive) or left (negative)
    fn strafe(&self, magnitude: i32) -> Result<(), ActuatorError>;

    /// Climb (positive) or descend (negative)
    fn change_altitude(&self, magnitude: i32) -> Result<(), ActuatorError>;

    fn flip(&self, direction: FlipDirection) -> Result<(), ActuatorError>;

    /// Stop all motion and hold position
    fn hover(&self) -> Result<(), ActuatorError>;

    fn take_off(&self) -> Result<(), ActuatorError>;

    fn land(&self) -> Result<(), ActuatorError>;
}
