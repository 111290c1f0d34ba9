//! Command vocabulary of the remote body controller.
//!
//! The body controller (device [`BODY_DEVICE_ID`](crate::consts::BODY_DEVICE_ID))
//! accepts short space-separated commands:
//!
//! | Command          | Meaning                              |
//! |------------------|--------------------------------------|
//! | `1 0` / `1 1`    | eye off / on                         |
//! | `2 0` / `2 1`    | lights off / on                      |
//! | `3 0` / `3 1`    | body (servo power) off / on          |
//! | `4 a b c d`      | servo positions, one digit `0..=9` each |
//!
//! [`BodyCommand`] renders to exactly this text through [`Display`](core::fmt::Display)
//! and parses it back through [`FromStr`].

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// Number of servos addressed by a position command.
pub const SERVO_COUNT: usize = 4;

/// Highest servo position digit.
pub const SERVO_MAX: u8 = 9;

/// A command for the body controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum BodyCommand {
    /// Eye LED on or off.
    Eye(bool),
    /// Body lights on or off.
    Lights(bool),
    /// Servo power on or off.
    Body(bool),
    /// Servo positions.
    Servos(ServoPositions),
}

/// Four servo positions, each a single digit `0..=9`.
///
/// Only constructed through [`ServoPositions::new`] (or
/// [`BodyCommand::servos`]), so a rendered position command always fits the
/// one-digit grammar of the body controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ServoPositions([u8; SERVO_COUNT]);

impl ServoPositions {
    /// Checks every position is `0..=9`.
    pub fn new(positions: [u8; SERVO_COUNT]) -> Result<Self, CommandError> {
        match positions.iter().find(|&&p| p > SERVO_MAX) {
            Some(&p) => Err(CommandError::ServoOutOfRange(p)),
            None => Ok(Self(positions)),
        }
    }

    /// The positions, first servo first.
    pub fn get(&self) -> [u8; SERVO_COUNT] {
        self.0
    }
}

impl TryFrom<[u8; SERVO_COUNT]> for ServoPositions {
    type Error = CommandError;

    fn try_from(positions: [u8; SERVO_COUNT]) -> Result<Self, Self::Error> {
        Self::new(positions)
    }
}

/// Failures building or parsing a [`BodyCommand`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum CommandError {
    /// A servo position is not a single digit.
    #[error("servo position {0} is out of range 0..=9")]
    ServoOutOfRange(u8),
    /// The text is not a body command.
    #[error("not a body command")]
    Unrecognized,
}

impl BodyCommand {
    /// Pose the body is moved to before it is switched off.
    pub const REST_POSE: BodyCommand = BodyCommand::Servos(ServoPositions([5, 7, 5, 5]));

    /// Builds a servo position command, checking every position is `0..=9`.
    pub fn servos(positions: [u8; SERVO_COUNT]) -> Result<Self, CommandError> {
        ServoPositions::new(positions).map(BodyCommand::Servos)
    }

    /// Leading selector digit of the command.
    pub fn selector(&self) -> u8 {
        match self {
            BodyCommand::Eye(_) => 1,
            BodyCommand::Lights(_) => 2,
            BodyCommand::Body(_) => 3,
            BodyCommand::Servos(_) => 4,
        }
    }
}

/// Commands sent before the body is powered down: eye, lights and servo
/// power off, then the rest pose.
pub fn shutdown_sequence() -> [BodyCommand; 4] {
    [
        BodyCommand::Eye(false),
        BodyCommand::Lights(false),
        BodyCommand::Body(false),
        BodyCommand::REST_POSE,
    ]
}

impl fmt::Display for BodyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector())?;
        match self {
            BodyCommand::Eye(on) | BodyCommand::Lights(on) | BodyCommand::Body(on) => {
                write!(f, " {}", u8::from(*on))
            }
            BodyCommand::Servos(positions) => {
                for p in positions.get() {
                    write!(f, " {p}")?;
                }
                Ok(())
            }
        }
    }
}

fn digit(field: &str) -> Result<u8, CommandError> {
    match field.as_bytes() {
        [d @ b'0'..=b'9'] => Ok(d - b'0'),
        [_, ..] if field.bytes().all(|b| b.is_ascii_digit()) => {
            Err(CommandError::ServoOutOfRange(field.parse().unwrap_or(u8::MAX)))
        }
        _ => Err(CommandError::Unrecognized),
    }
}

fn switch(field: Option<&str>) -> Result<bool, CommandError> {
    match field {
        Some("0") => Ok(false),
        Some("1") => Ok(true),
        _ => Err(CommandError::Unrecognized),
    }
}

impl FromStr for BodyCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split_ascii_whitespace();
        let command = match fields.next() {
            Some("1") => BodyCommand::Eye(switch(fields.next())?),
            Some("2") => BodyCommand::Lights(switch(fields.next())?),
            Some("3") => BodyCommand::Body(switch(fields.next())?),
            Some("4") => {
                let mut positions = [0u8; SERVO_COUNT];
                for p in positions.iter_mut() {
                    *p = digit(fields.next().ok_or(CommandError::Unrecognized)?)?;
                }
                BodyCommand::Servos(ServoPositions(positions))
            }
            _ => return Err(CommandError::Unrecognized),
        };
        match fields.next() {
            Some(_) => Err(CommandError::Unrecognized),
            None => Ok(command),
        }
    }
}
