//! Actuator stand-in that logs every command

use std::sync::atomic::{AtomicU64, Ordering};

use super::{DroneActuator, FlipDirection};
use crate::error::ActuatorError;

/// Logs commands instead of flying
///
/// Used when no device is attached, e.g. while replaying a recorded stream.
#[derive(Debug, Default)]
pub struct LoggingActuator {
    commands: AtomicU64,
}

impl LoggingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received so far
    pub fn command_count(&self) -> u64 {
        self.commands.load(Ordering::Relaxed)
    }

    fn record(&self, action: &'static str, magnitude: Option<i32>) -> Result<(), ActuatorError> {
        self.commands.fetch_add(1, Ordering::Relaxed);
        match magnitude {
            Some(magnitude) => tracing::info!(action, magnitude, "Actuator command"),
            None => tracing::info!(action, "Actuator command"),
        }
        Ok(())
    }
}

impl DroneActuator for LoggingActuator {
    fn move_forward_back(&self, magnitude: i32) -> Result<(), ActuatorError> {
        self.record("forward", Some(magnitude))
    }

    fn rotate(&self, magnitude: i32) -> Result<(), ActuatorError> {
        self.record("clockwise", Some(magnitude))
    }

    fn strafe(&self, magnitude: i32) -> Result<(), ActuatorError> {
        self.record("right", Some(magnitude))
    }

    fn change_altitude(&self, magnitude: i32) -> Result<(), ActuatorError> {
        self.record("up", Some(magnitude))
    }

    fn flip(&self, direction: FlipDirection) -> Result<(), ActuatorError> {
        self.record("flip", Some(direction.as_u8() as i32))
    }

    fn hover(&self) -> Result<(), ActuatorError> {
        self.record("hover", None)
    }

    fn take_off(&self) -> Result<(), ActuatorError> {
        self.record("takeoff", None)
    }

    fn land(&self) -> Result<(), ActuatorError> {
        self.record("land", None)
    }
}
