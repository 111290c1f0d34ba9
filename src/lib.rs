//! # simon-line
//!
//! A portable, no_std Rust driver for the SIMON single-wire command protocol: a
//! half-duplex, pulse-width encoded link between a host and one remote
//! microcontroller over a single shared digital line.
//!
//! The driver bit-bangs the protocol using:
//! - `embedded-hal` traits for digital I/O and delays
//! - a spin-polled monotonic clock for every pulse (no OS sleeps)
//! - a two-byte Fletcher-style checksum on every frame
//! - acknowledgment, retry and line reset handled inside each call
//!
//! ## Crate features
//! | Feature            | Description |
//! |--------------------|-------------|
//! | `std`              | Disables `#![no_std]`, replaces `heapless` buffers with `std` ones and adds `StdClock` |
//! | `shared` (default) | Session sharing through `critical_section` |
//! | `defmt-0-3`        | Uses `defmt` logging |
//! | `log`              | Uses `log` logging |
//!
//! ## Wire format
//!
//! - the line idles high; information is carried by how long it is held low,
//!   in multiples of a base unit (1 ms by default)
//! - `0` = 1 unit, `1` = 2 units, enable marker = 3 units, end marker = 4 units
//! - a frame is `device id (8) | payload (8 * n) | checksum (16)`
//! - the receiver answers an accepted frame with eight `1` bits
//!
//! ## Usage
//!
//! Implement [`line::LineController`] for your GPIO peripheral and
//! [`timer::Monotonic`] for your clock, then:
//!
//! ```rust,ignore
//! use simon_line::{BodyCommand, Config, Session};
//!
//! let mut session = Session::new(controller, clock, Config::default())?;
//! session.send_body(&BodyCommand::Eye(true))?;
//! session.send(2, "4 5 7 5 5")?;
//! let reply = session.receive()?;
//! ```
//!
//! ## Integration Notes
//!
//! - Every call blocks the calling thread while spinning; run the session on
//!   a dedicated thread
//! - Transient failures are retried internally; by default a call only
//!   returns once it succeeds or the line cannot be provisioned
//! - Use [`shared`] to serialize callers from several threads

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "shared")]
pub use critical_section;

#[cfg(not(feature = "std"))]
pub use heapless;

pub mod checksum;
pub mod command;
pub mod config;
pub mod consts;
pub mod encoding;
pub mod error;
pub mod frame;
pub mod line;
pub mod pulse;

// Textually scoped: must stay below every module deriving `thiserror::Error`,
// whose `#[error]` attribute would otherwise resolve to `fmt::error!`.
#[macro_use]
mod fmt;

pub mod session;
#[cfg(feature = "shared")]
pub mod shared;
pub mod timer;
pub mod transceiver;

pub use command::{BodyCommand, ServoPositions};
pub use config::{Config, Timing};
pub use error::{CodecError, Error};
pub use line::{DataLine, Direction, LineController, Pull};
pub use session::{Session, SessionState};
