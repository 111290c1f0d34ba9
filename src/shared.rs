//! Sharing one [`Session`] between execution contexts.
//!
//! The line carries one exchange at a time, so every caller must go through
//! the same session and no exchange may start while another is in flight.
//! A [`SharedSession`] is a `critical_section` mutex around a slot holding the
//! session. [`with_shared_session`] enters the critical section only to move
//! the session out of the slot and to put it back; the exchange runs with
//! interrupts enabled, so a [`Monotonic`](crate::timer::Monotonic) clock
//! driven by a timer interrupt keeps counting. While the session is leased
//! out, a second caller spins until it is returned, so it blocks until the
//! first exchange, including any resets it triggers, has completed.
//!
//! An interrupt handler that preempts the holder would spin forever. Handlers
//! use [`try_with_shared_session`], which gives up instead of waiting.
//!
//! With `critical-section/std` the critical section is a process-wide lock.
//!
//! ```rust,ignore
//! simon_line::shared_session!(SESSION: MyController, MyClock);
//!
//! fn main() {
//!     let session = Session::new(controller, clock, Config::default()).unwrap();
//!     let _ = shared_session_setup(&SESSION, session);
//!     with_shared_session(&SESSION, |s| s.send_body(&BodyCommand::Eye(true)));
//! }
//! ```

use core::cell::RefCell;
use core::hint::spin_loop;
use core::{fmt, mem};

use critical_section::Mutex;

use crate::line::LineController;
use crate::session::Session;

enum Slot<S> {
    Empty,
    Idle(S),
    Busy,
}

impl<S> Slot<S> {
    /// Stores `next`, returning the idle session previously held.
    fn replace(&mut self, next: Self) -> Option<S> {
        match mem::replace(self, next) {
            Slot::Idle(session) => Some(session),
            _ => None,
        }
    }
}

/// A session guarded by a critical-section mutex.
pub struct SharedSession<C: LineController, M> {
    slot: Mutex<RefCell<Slot<Session<C, M>>>>,
}

impl<C: LineController, M> fmt::Debug for SharedSession<C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSession").finish_non_exhaustive()
    }
}

/// Creates an empty [`SharedSession`], usable in a `static` initializer.
pub const fn shared_session_init<C: LineController, M>() -> SharedSession<C, M> {
    SharedSession {
        slot: Mutex::new(RefCell::new(Slot::Empty)),
    }
}

/// Runs `f` on the slot inside a critical section once no exchange is in
/// flight.
fn when_idle<C: LineController, M, R>(
    shared: &SharedSession<C, M>,
    f: impl FnOnce(&mut Slot<Session<C, M>>) -> R,
) -> R {
    let mut f = Some(f);
    loop {
        let done = critical_section::with(|cs| {
            let mut slot = shared.slot.borrow(cs).borrow_mut();
            if matches!(*slot, Slot::Busy) {
                return None;
            }
            f.take().map(|f| f(&mut *slot))
        });
        if let Some(result) = done {
            return result;
        }
        spin_loop();
    }
}

/// Marks an idle slot busy and returns its session.
fn lease_out<S>(slot: &mut Slot<S>) -> Option<S> {
    if matches!(slot, Slot::Idle(_)) {
        slot.replace(Slot::Busy)
    } else {
        None
    }
}

/// A session moved out of its slot. Put back on drop, also when the
/// exchange unwinds.
struct Lease<'a, C: LineController, M> {
    shared: &'a SharedSession<C, M>,
    session: Option<Session<C, M>>,
}

impl<C: LineController, M> Lease<'_, C, M> {
    fn run<R>(mut self, f: impl FnOnce(&mut Session<C, M>) -> R) -> Option<R> {
        self.session.as_mut().map(f)
    }
}

impl<C: LineController, M> Drop for Lease<'_, C, M> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            critical_section::with(|cs| {
                let _ = self
                    .shared
                    .slot
                    .borrow(cs)
                    .borrow_mut()
                    .replace(Slot::Idle(session));
            });
        }
    }
}

/// Installs `session`, returning the one previously installed.
///
/// Waits for an exchange in flight to finish first.
pub fn shared_session_setup<C: LineController, M>(
    shared: &SharedSession<C, M>,
    session: Session<C, M>,
) -> Option<Session<C, M>> {
    when_idle(shared, |slot| slot.replace(Slot::Idle(session)))
}

/// Removes and returns the installed session.
///
/// Waits for an exchange in flight to finish first.
pub fn take_shared_session<C: LineController, M>(
    shared: &SharedSession<C, M>,
) -> Option<Session<C, M>> {
    when_idle(shared, |slot| slot.replace(Slot::Empty))
}

/// Runs `f` on the installed session, waiting while another caller holds it.
///
/// Interrupts stay enabled while `f` runs. Returns `None` if no session is
/// installed.
pub fn with_shared_session<C: LineController, M, R>(
    shared: &SharedSession<C, M>,
    f: impl FnOnce(&mut Session<C, M>) -> R,
) -> Option<R> {
    let session = when_idle(shared, lease_out);
    Lease { shared, session }.run(f)
}

/// Runs `f` on the installed session if it is free right now.
///
/// Returns `None` without waiting if no session is installed or another
/// caller holds it.
pub fn try_with_shared_session<C: LineController, M, R>(
    shared: &SharedSession<C, M>,
    f: impl FnOnce(&mut Session<C, M>) -> R,
) -> Option<R> {
    let session =
        critical_section::with(|cs| lease_out(&mut *shared.slot.borrow(cs).borrow_mut()));
    Lease { shared, session }.run(f)
}

/// Declares a `static` [`SharedSession`].
///
/// # Example
/// ```rust,ignore
/// shared_session!(pub SESSION: MyController, MyClock);
/// ```
#[macro_export]
macro_rules! shared_session {
    ($vis:vis $name:ident : $controller:ty, $clock:ty) => {
        $vis static $name: $crate::shared::SharedSession<$controller, $clock> =
            $crate::shared::shared_session_init();
    };
}
