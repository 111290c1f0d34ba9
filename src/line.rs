//! The shared data line and the controller that provisions it.
//!
//! SIMON uses one open-drain style line for both directions. The line is idle
//! high (pulled up); either side signals by pulling it low for a timed
//! interval. Switching between listening and driving is a direction change on
//! the same pin, which `embedded-hal` does not model, so [`DataLine`] extends
//! the `embedded-hal` pin traits with direction and pull control.
//!
//! The pin itself is owned by a [`LineController`]. A session borrows nothing
//! global: it is handed the controller at construction, asks it for a line,
//! and on [`reset`](crate::session::Session::reset) gives the line back and
//! provisions a fresh one.

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// Direction of the data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Direction {
    /// Listening; the line floats to the pull level unless the remote drives it.
    #[default]
    Input,
    /// Driving the line high or low.
    Output,
}

/// Pull resistor configuration of the data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Pull {
    /// Pull-up enabled; the idle level is high.
    Up,
    /// No pull resistor.
    Off,
}

/// A bidirectional digital pin usable as the SIMON data line.
pub trait DataLine: InputPin + OutputPin {
    /// Switches the pin between input and output.
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// Configures the pull resistor. Only meaningful as an input.
    fn set_pull(&mut self, pull: Pull) -> Result<(), Self::Error>;
}

/// Error type of a controller's line.
pub type LineError<C> = <<C as LineController>::Line as ErrorType>::Error;

/// Owner of the digital-I/O peripheral the data line lives on.
pub trait LineController {
    /// The line handed out by this controller.
    type Line: DataLine;

    /// Provisions the line as an input with the given pull.
    fn provision_input(
        &mut self,
        pull: Pull,
    ) -> Result<Self::Line, <Self::Line as ErrorType>::Error>;

    /// Provisions the line as an output.
    ///
    /// Used to wake a line that refuses to come up as an input.
    fn provision_output(&mut self) -> Result<Self::Line, <Self::Line as ErrorType>::Error>;

    /// Gives the line back. The pin should be left low with pull disabled.
    fn release(&mut self, line: Self::Line);

    /// Shuts down and reinitializes the underlying I/O controller.
    ///
    /// Called between [`release`](Self::release) and the next provisioning
    /// when a session resets.
    fn reinitialize(&mut self) -> Result<(), <Self::Line as ErrorType>::Error>;
}
