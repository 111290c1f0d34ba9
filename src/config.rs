//! Session configuration.
//!
//! [`Timing`] holds the two values every pulse is measured against; [`Config`]
//! adds addressing and retry policy. Defaults match the remote device's
//! firmware: a 1 ms base unit, a 200-unit timeout, device id 1, and a reset
//! after every fifth failed trial with no upper bound on reset cycles.

use core::time::Duration;

use crate::consts::{DEFAULT_DEVICE_ID, DEFAULT_MAX_TRIALS, DEFAULT_TIMEOUT_UNITS, DEFAULT_UNIT};

/// Pulse timing of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Base unit (`minimumSignalLength`). Every pulse is a multiple of it.
    pub unit: Duration,
    /// Per-pulse timeout, in units.
    pub timeout_units: u32,
}

impl Timing {
    /// Duration of `units` base units.
    pub fn units(&self, units: u32) -> Duration {
        self.unit * units
    }

    /// The per-pulse timeout as a duration.
    pub fn timeout(&self) -> Duration {
        self.units(self.timeout_units)
    }

    /// Converts an elapsed time in nanoseconds to whole units, rounding down.
    pub fn to_units(&self, elapsed_ns: u64) -> u32 {
        let unit_ns = self.unit.as_nanos().max(1);
        let units = u128::from(elapsed_ns) / unit_ns;
        u32::try_from(units).unwrap_or(u32::MAX)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            unit: DEFAULT_UNIT,
            timeout_units: DEFAULT_TIMEOUT_UNITS,
        }
    }
}

/// Configuration of a [`Session`](crate::session::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Device id frames must carry to be accepted by [`receive`](crate::session::Session::receive).
    pub own_device_id: u8,
    /// Pulse timing.
    pub timing: Timing,
    /// Failed trials before the line is reset.
    pub max_trials: u8,
    /// Reset cycles after which one call gives up.
    ///
    /// `None` retries forever, blocking the caller until the exchange
    /// succeeds.
    pub max_reset_cycles: Option<u32>,
}

impl Config {
    /// Sets the device id of this host.
    pub fn with_device_id(mut self, id: u8) -> Self {
        self.own_device_id = id;
        self
    }

    /// Sets the pulse timing.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Sets the number of failed trials that trigger a reset. Clamped to at least 1.
    pub fn with_max_trials(mut self, trials: u8) -> Self {
        self.max_trials = trials.max(1);
        self
    }

    /// Bounds the number of reset cycles per call.
    pub fn with_max_reset_cycles(mut self, cycles: Option<u32>) -> Self {
        self.max_reset_cycles = cycles;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            own_device_id: DEFAULT_DEVICE_ID,
            timing: Timing::default(),
            max_trials: DEFAULT_MAX_TRIALS,
            max_reset_cycles: None,
        }
    }
}
