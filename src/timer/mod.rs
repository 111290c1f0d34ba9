//! Clock and spin-wait utilities for pulse timing.
//!
//! Every pulse on the line is timed by actively polling a monotonic clock.
//! OS sleeps overshoot by far more than the 1 ms base unit, so nothing in
//! this crate ever yields the thread while an exchange is in flight.
//!
//! Contains:
//! - [`Monotonic`]: the time source the driver is generic over
//! - [`SpinDelay`]: busy-wait delay on top of a [`Monotonic`] clock, also usable
//!   as an [`embedded_hal::delay::DelayNs`]
//! - `StdClock`: a [`Monotonic`] backed by `std::time::Instant` (feature `std`)
//!
//! ## Blocking
//!
//! A spin wait consumes the calling thread for its whole duration. Run the
//! session on a dedicated thread, never inside a cooperative scheduler whose
//! other tasks would starve while a frame is on the wire.

mod delay;
pub use delay::*;

#[cfg(feature = "std")]
mod clock;
#[cfg(feature = "std")]
pub use clock::*;

/// A monotonic time source with nanosecond resolution.
///
/// Implementations must never go backwards. The origin is arbitrary.
///
/// The clock is read with interrupts enabled, except inside the short
/// critical sections of [`crate::shared`], so it may be extended by a timer
/// overflow interrupt.
pub trait Monotonic {
    /// Nanoseconds elapsed since the clock's origin.
    fn now_ns(&mut self) -> u64;
}
