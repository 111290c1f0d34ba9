//! Pulse measurement for SIMON reception.
//!
//! A pulse is one low phase of the line. Its length, counted in whole base
//! units, is the symbol: 1 unit is a `0` bit, 2 units a `1` bit, 3 units the
//! enable marker and 4 units the end marker. The high phases in between only
//! separate pulses and are not measured.
//!
//! [`PulseMeter`] is a non-blocking state machine in the style of
//! `embedded-hal` 0.2 / `nb` drivers: [`PulseMeter::poll`] samples the line
//! once and returns [`nb::Error::WouldBlock`] until a pulse has completed or
//! the timeout has elapsed. Wrap it in [`nb::block!`] for a blocking
//! measurement, as [`Transceiver::measure_pulse`](crate::transceiver::Transceiver::measure_pulse)
//! does.

use embedded_hal::digital::InputPin;

use crate::config::Timing;
use crate::consts::{END_UNITS, ENABLE_UNITS, ONE_UNITS, ZERO_UNITS};

/// Classification of one measured low phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Pulse {
    /// 1 unit: a `0` bit.
    Zero,
    /// 2 units: a `1` bit.
    One,
    /// 3 units: start of payload.
    Enable,
    /// 4 units: end of transmission.
    End,
    /// Any other unit count below the timeout, passed through uninterpreted.
    Other(u32),
    /// No complete pulse was seen within the timeout window.
    Timeout,
}

impl Pulse {
    /// Classifies a low phase of `units` whole base units.
    pub fn classify(units: u32, timing: &Timing) -> Self {
        if units >= timing.timeout_units {
            return Pulse::Timeout;
        }
        match units {
            ZERO_UNITS => Pulse::Zero,
            ONE_UNITS => Pulse::One,
            ENABLE_UNITS => Pulse::Enable,
            END_UNITS => Pulse::End,
            other => Pulse::Other(other),
        }
    }

    /// Length in units. A timeout reports the configured timeout value.
    pub fn units(&self, timing: &Timing) -> u32 {
        match self {
            Pulse::Zero => ZERO_UNITS,
            Pulse::One => ONE_UNITS,
            Pulse::Enable => ENABLE_UNITS,
            Pulse::End => END_UNITS,
            Pulse::Other(units) => *units,
            Pulse::Timeout => timing.timeout_units,
        }
    }

    /// The data bit carried by this pulse, if any.
    pub fn bit(&self) -> Option<bool> {
        match self {
            Pulse::Zero => Some(false),
            Pulse::One => Some(true),
            _ => None,
        }
    }

    /// Whether this pulse ends a transmission.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Pulse::End | Pulse::Timeout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Line is high; `since` is when the measurement started.
    Idle { since: u64 },
    /// Line went low at `since`.
    Low { since: u64 },
}

/// Non-blocking measurement of a single pulse.
#[derive(Debug, Clone, Copy)]
pub struct PulseMeter {
    timing: Timing,
    phase: Phase,
}

impl PulseMeter {
    /// Starts a measurement at `now_ns`.
    ///
    /// The timeout for the line to go low counts from this instant.
    pub fn new(timing: Timing, now_ns: u64) -> Self {
        Self {
            timing,
            phase: Phase::Idle { since: now_ns },
        }
    }

    /// Whether the line has been seen low during this measurement.
    pub fn in_pulse(&self) -> bool {
        matches!(self.phase, Phase::Low { .. })
    }

    /// Samples the line once.
    ///
    /// # Arguments
    /// - `line`: the data line, configured as input
    /// - `now_ns`: clock reading taken for this sample
    ///
    /// # Returns
    /// - `Ok(pulse)` once the line returned high, or [`Pulse::Timeout`] once
    ///   the timeout elapsed while waiting for the line to go low or while it
    ///   stayed low
    /// - `Err(nb::Error::WouldBlock)` while the measurement is in progress
    /// - `Err(nb::Error::Other(e))` if the pin could not be read
    pub fn poll<L: InputPin>(
        &mut self,
        line: &mut L,
        now_ns: u64,
    ) -> nb::Result<Pulse, L::Error> {
        match self.phase {
            Phase::Idle { since } => {
                if line.is_low().map_err(nb::Error::Other)? {
                    self.phase = Phase::Low { since: now_ns };
                    Err(nb::Error::WouldBlock)
                } else if self.timed_out(since, now_ns) {
                    Ok(Pulse::Timeout)
                } else {
                    Err(nb::Error::WouldBlock)
                }
            }
            Phase::Low { since } => {
                if line.is_high().map_err(nb::Error::Other)? {
                    let units = self.timing.to_units(now_ns.saturating_sub(since));
                    Ok(Pulse::classify(units, &self.timing))
                } else if self.timed_out(since, now_ns) {
                    Ok(Pulse::Timeout)
                } else {
                    Err(nb::Error::WouldBlock)
                }
            }
        }
    }

    fn timed_out(&self, since: u64, now_ns: u64) -> bool {
        self.timing.to_units(now_ns.saturating_sub(since)) >= self.timing.timeout_units
    }
}
