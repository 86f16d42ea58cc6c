//! Control message decoding
//!
//! Control messages are short byte strings sent by viewers:
//!
//! ```text
//! +------+---------------------+---------+
//! | sign |      keyword        | [digit] |
//! | 1    |   1..n bytes        | flip    |
//! +------+---------------------+---------+
//!
//!   "+forwa"  move forward       "-forwa"  move backward
//!   "+clock"  rotate clockwise   "-clock"  rotate counter-clockwise
//!   "+right"  strafe right       "-right"  strafe left
//!   "+up"     climb              "-up"     descend
//!   "+hover"  "+takeoff"  "+land"          stateless, sign ignored
//!   "+flip3"  flip, digit selects the direction (0-7)
//! ```
//!
//! A sign byte of `-` negates the movement; any other byte keeps it
//! positive.

use crate::device::FlipDirection;
use crate::error::CommandError;

/// Base magnitude for forward/backward movement
pub const FORWARD_MAGNITUDE: i32 = 20;
/// Base magnitude for rotation
pub const ROTATE_MAGNITUDE: i32 = 25;
/// Base magnitude for strafing
pub const STRAFE_MAGNITUDE: i32 = 20;
/// Base magnitude for altitude changes
pub const ALTITUDE_MAGNITUDE: i32 = 20;

/// Command kind without parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveForwardBack,
    Rotate,
    Strafe,
    ChangeAltitude,
    Flip,
    Hover,
    TakeOff,
    Land,
}

/// A decoded actuation command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveForwardBack(i32),
    Rotate(i32),
    Strafe(i32),
    ChangeAltitude(i32),
    Flip(FlipDirection),
    Hover,
    TakeOff,
    Land,
}

impl Command {
    pub fn action(&self) -> Action {
        match self {
            Command::MoveForwardBack(_) => Action::MoveForwardBack,
            Command::Rotate(_) => Action::Rotate,
            Command::Strafe(_) => Action::Strafe,
            Command::ChangeAltitude(_) => Action::ChangeAltitude,
            Command::Flip(_) => Action::Flip,
            Command::Hover => Action::Hover,
            Command::TakeOff => Action::TakeOff,
            Command::Land => Action::Land,
        }
    }

    /// Signed magnitude for movement, direction number for flips, 0 otherwise
    pub fn magnitude(&self) -> i32 {
        match self {
            Command::MoveForwardBack(m)
            | Command::Rotate(m)
            | Command::Strafe(m)
            | Command::ChangeAltitude(m) => *m,
            Command::Flip(direction) => direction.as_u8() as i32,
            Command::Hover | Command::TakeOff | Command::Land => 0,
        }
    }
}

/// Decoder configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Multiplier applied to every movement magnitude
    pub scale: i32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { scale: 1 }
    }
}

impl DecoderConfig {
    pub fn scale(mut self, scale: i32) -> Self {
        self.scale = scale;
        self
    }
}

/// Stateless control message decoder
#[derive(Debug, Clone, Default)]
pub struct CommandDecoder {
    config: DecoderConfig,
}

impl CommandDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one control message
    pub fn decode(&self, message: &[u8]) -> Result<Command, CommandError> {
        let (&sign, keyword) = message.split_first().ok_or(CommandError::Empty)?;
        let direction = if sign == b'-' { -1 } else { 1 };
        let movement = |base: i32| {
            base.checked_mul(direction)
                .and_then(|m| m.checked_mul(self.config.scale))
                .ok_or(CommandError::MagnitudeOverflow(self.config.scale))
        };

        let command = match keyword {
            b"forwa" => Command::MoveForwardBack(movement(FORWARD_MAGNITUDE)?),
            b"clock" => Command::Rotate(movement(ROTATE_MAGNITUDE)?),
            b"right" => Command::Strafe(movement(STRAFE_MAGNITUDE)?),
            b"up" => Command::ChangeAltitude(movement(ALTITUDE_MAGNITUDE)?),
            b"hover" => Command::Hover,
            b"takeoff" => Command::TakeOff,
            b"land" => Command::Land,
            [b'f', b'l', b'i', b'p', rest @ ..] => Command::Flip(Self::flip_direction(rest)?),
            _ => {
                return Err(CommandError::Unrecognized(
                    String::from_utf8_lossy(message).into_owned(),
                ))
            }
        };

        Ok(command)
    }

    fn flip_direction(rest: &[u8]) -> Result<FlipDirection, CommandError> {
        match rest {
            [] => Err(CommandError::MissingFlipDirection),
            [digit @ b'0'..=b'9'] => {
                let value = digit - b'0';
                FlipDirection::from_u8(value).ok_or(CommandError::InvalidFlipDirection(value))
            }
            _ => Err(CommandError::Unrecognized(format!(
                "flip{}",
                String::from_utf8_lossy(rest)
            ))),
        }
    }
}
