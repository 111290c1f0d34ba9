use core::hint::spin_loop;
use core::time::Duration;

use embedded_hal::delay::DelayNs;

use super::Monotonic;

/// Busy-wait delay driven by a [`Monotonic`] clock.
///
/// This is the only way the driver waits. It never sleeps: each wait spins on
/// [`Monotonic::now_ns`] until the deadline has passed, so a wait ends within
/// one clock read of its deadline and never before it.
///
/// # Example
/// ```rust
/// use core::time::Duration;
/// use simon_line::timer::{SpinDelay, StdClock};
///
/// let mut delay = SpinDelay::new(StdClock::new());
/// let start = delay.now_ns();
/// delay.spin(Duration::from_micros(200));
/// assert!(delay.now_ns() - start >= 200_000);
/// ```
#[derive(Debug)]
pub struct SpinDelay<M> {
    clock: M,
}

impl<M: Monotonic> SpinDelay<M> {
    /// Wraps a clock.
    pub fn new(clock: M) -> Self {
        Self { clock }
    }

    /// Current clock reading.
    pub fn now_ns(&mut self) -> u64 {
        self.clock.now_ns()
    }

    /// Nanoseconds elapsed since `start`, a previous [`now_ns`](Self::now_ns) reading.
    pub fn elapsed_since(&mut self, start: u64) -> u64 {
        self.clock.now_ns().saturating_sub(start)
    }

    /// Spins until `duration` has passed.
    pub fn spin(&mut self, duration: Duration) {
        let wait = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        let deadline = self.clock.now_ns().saturating_add(wait);
        while self.clock.now_ns() < deadline {
            spin_loop();
        }
    }

    /// Returns the wrapped clock.
    pub fn into_inner(self) -> M {
        self.clock
    }
}

impl<M: Monotonic> DelayNs for SpinDelay<M> {
    fn delay_ns(&mut self, ns: u32) {
        self.spin(Duration::from_nanos(u64::from(ns)));
    }
}
