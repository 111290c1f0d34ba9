//! Physical layer: transmitting and receiving bit sequences as timed pulses.
//!
//! A [`Transceiver`] is a short-lived view over a data line, a spin delay and
//! the line timing. [`Session`](crate::session::Session) builds one for every
//! step of an exchange; it can also be used directly to talk to a remote
//! device without the retry policy.
//!
//! ## Transmission
//!
//! ```text
//!  wake   preamble (8x)     settle  enable gap  bit bit ...  end   hold
//! ‾‾‾‾‾‾‾|_|‾|_|‾ ... |_|‾‾‾‾‾‾‾‾‾‾|___|‾|_|‾|__|‾ ...  |____|‾‾‾‾‾‾‾
//!  2u     1u 1u             5u      3u   1u 1u  2u        4u    2 ms
//! ```
//!
//! - `0` bits are 1 unit low, `1` bits 2 units low, each followed by 1 unit high
//! - the preamble lets the receiver resynchronize against clock drift
//!
//! ## Reception
//!
//! [`read_bits`](Transceiver::read_bits) skips pulses until the enable marker
//! (or a timeout), then collects `0`/`1` pulses until the end marker (or a
//! timeout). A timeout is treated as "no more data", never as an error.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::ErrorType;

use crate::config::Timing;
use crate::consts::{
    BIT_GAP_UNITS, END_HOLD, END_UNITS, ENABLE_UNITS, INPUT_SETTLE, ONE_UNITS, PREAMBLE_SETTLE_UNITS,
    PREAMBLE_TOGGLES, PREAMBLE_UNITS, WAKE_UNITS, ZERO_UNITS,
};
use crate::encoding::{BitBuf, push_bit};
use crate::error::Error;
use crate::line::{DataLine, Direction, Pull};
use crate::pulse::{Pulse, PulseMeter};
use crate::timer::{Monotonic, SpinDelay};

type LineResult<L, T> = Result<T, <L as ErrorType>::Error>;

/// Pulse-level transmitter and receiver over one data line.
#[derive(Debug)]
pub struct Transceiver<'a, L, M> {
    line: &'a mut L,
    delay: &'a mut SpinDelay<M>,
    timing: Timing,
}

impl<'a, L, M> Transceiver<'a, L, M>
where
    L: DataLine,
    M: Monotonic,
{
    /// Borrows a line and a delay for the duration of one operation.
    pub fn new(line: &'a mut L, delay: &'a mut SpinDelay<M>, timing: Timing) -> Self {
        Self {
            line,
            delay,
            timing,
        }
    }

    fn hold(&mut self, units: u32) {
        self.delay.spin(self.timing.units(units));
    }

    fn drive(&mut self, high: bool, units: u32) -> LineResult<L, ()> {
        if high {
            self.line.set_high()?;
        } else {
            self.line.set_low()?;
        }
        self.hold(units);
        Ok(())
    }

    /// Pulls the line low for `units`, then releases it high for `gap` units.
    fn pulse(&mut self, units: u32, gap: u32) -> LineResult<L, ()> {
        self.drive(false, units)?;
        self.drive(true, gap)
    }

    /// Transmits a bit sequence, bracketed by the wake-up, preamble, enable
    /// and end markers.
    ///
    /// Leaves the line driven high as an output.
    pub fn send_bits(&mut self, bits: &[bool]) -> LineResult<L, ()> {
        self.line.set_direction(Direction::Output)?;
        self.drive(true, WAKE_UNITS)?;
        for _ in 0..PREAMBLE_TOGGLES {
            self.pulse(PREAMBLE_UNITS, PREAMBLE_UNITS)?;
        }
        self.hold(PREAMBLE_SETTLE_UNITS);
        self.pulse(ENABLE_UNITS, BIT_GAP_UNITS)?;
        for &bit in bits {
            let units = if bit { ONE_UNITS } else { ZERO_UNITS };
            self.pulse(units, BIT_GAP_UNITS)?;
        }
        self.line.set_low()?;
        self.hold(END_UNITS);
        self.line.set_high()?;
        self.delay.delay_us(micros(END_HOLD));
        Ok(())
    }

    /// Switches the line to input with pull-up and lets it settle.
    pub fn listen(&mut self) -> LineResult<L, ()> {
        self.line.set_direction(Direction::Input)?;
        self.line.set_pull(Pull::Up)?;
        self.delay.delay_us(micros(INPUT_SETTLE));
        Ok(())
    }

    /// Drives the line high for `units`, then hands it back as an input with
    /// pull-up.
    pub fn release_high(&mut self, units: u32) -> LineResult<L, ()> {
        self.line.set_direction(Direction::Output)?;
        self.drive(true, units)?;
        self.line.set_direction(Direction::Input)?;
        self.line.set_pull(Pull::Up)
    }

    /// Blocks until one pulse has been measured or the timeout elapsed.
    pub fn measure_pulse(&mut self) -> LineResult<L, Pulse> {
        let mut meter = PulseMeter::new(self.timing, self.delay.now_ns());
        nb::block!(meter.poll(&mut *self.line, self.delay.now_ns()))
    }

    /// Listens for one transmission and returns its bits.
    ///
    /// The result is empty when nothing was received before the timeout.
    ///
    /// # Errors
    /// - [`Error::Line`] if the pin fails
    /// - [`Error::FrameOverflow`] if the sender exceeds the maximum frame size
    pub fn read_bits(&mut self) -> Result<BitBuf, Error<L::Error>> {
        self.listen().map_err(Error::Line)?;
        loop {
            match self.measure_pulse().map_err(Error::Line)? {
                Pulse::Enable | Pulse::Timeout => break,
                _ => {}
            }
        }
        let mut bits = BitBuf::new();
        loop {
            let pulse = self.measure_pulse().map_err(Error::Line)?;
            if pulse.is_terminal() {
                break;
            }
            if let Some(bit) = pulse.bit() {
                push_bit(&mut bits, bit).map_err(|_| Error::FrameOverflow)?;
            }
        }
        Ok(bits)
    }
}

fn micros(duration: core::time::Duration) -> u32 {
    u32::try_from(duration.as_micros()).unwrap_or(u32::MAX)
}
