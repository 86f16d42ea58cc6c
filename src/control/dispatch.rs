//! Applying decoded commands to the device

use super::command::{Command, CommandDecoder};
use crate::device::DroneActuator;
use crate::error::{ActuatorError, CommandError};

/// Result of handling one control message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Decoded and accepted by the device
    Applied(Command),
    /// Not a valid control message; nothing was sent to the device
    Rejected(CommandError),
    /// Decoded, but the device failed to execute it
    Failed(Command, ActuatorError),
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied(_))
    }
}

/// Apply one command to the actuator
pub fn dispatch<A>(command: Command, actuator: &A) -> Result<(), ActuatorError>
where
    A: DroneActuator + ?Sized,
{
    match command {
        Command::MoveForwardBack(m) => actuator.move_forward_back(m),
        Command::Rotate(m) => actuator.rotate(m),
        Command::Strafe(m) => actuator.strafe(m),
        Command::ChangeAltitude(m) => actuator.change_altitude(m),
        Command::Flip(direction) => actuator.flip(direction),
        Command::Hover => actuator.hover(),
        Command::TakeOff => actuator.take_off(),
        Command::Land => actuator.land(),
    }
}

impl CommandDecoder {
    /// Decode `message` and apply it
    ///
    /// Failures are logged and returned as an outcome; none of them is fatal
    /// to the control channel.
    pub fn handle<A>(&self, message: &[u8], actuator: &A) -> CommandOutcome
    where
        A: DroneActuator + ?Sized,
    {
        let command = match self.decode(message) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected control message");
                return CommandOutcome::Rejected(e);
            }
        };

        match dispatch(command, actuator) {
            Ok(()) => {
                tracing::debug!(command = ?command, "Command applied");
                CommandOutcome::Applied(command)
            }
            Err(e) => {
                tracing::warn!(command = ?command, error = %e, "Actuator failed");
                CommandOutcome::Failed(command, e)
            }
        }
    }
}
