//! Constants used across the SIMON protocol implementation.
//!
//! This module defines the wire-level timing of every marker, the framing
//! sizes, and the defaults used by [`Config`](crate::config::Config).
//!
//! All pulse lengths are expressed in *units*: integer multiples of the base
//! unit (`minimumSignalLength`, see [`Timing`](crate::config::Timing)). The
//! remote microcontroller runs a fixed-function decoder, so these values must
//! not change.
//!
//! ## Key Concepts
//!
//! - **Pulses**: information is carried by how long the line is held low.
//! - **Preamble**: a run of short toggles that lets the receiver lock onto
//!   the sender's unit length before the enable marker.
//! - **Frame envelope**: one address byte in front of the payload and two
//!   checksum bytes behind it.

use core::time::Duration;

/// Low time (in units) of a `0` bit.
pub const ZERO_UNITS: u32 = 1;

/// Low time (in units) of a `1` bit.
pub const ONE_UNITS: u32 = 2;

/// Low time (in units) of the enable marker that opens the payload.
pub const ENABLE_UNITS: u32 = 3;

/// Low time (in units) of the end marker that closes a transmission.
pub const END_UNITS: u32 = 4;

/// High time (in units) used to wake the receiver before the preamble.
pub const WAKE_UNITS: u32 = 2;

/// Number of low/high toggles in the preamble.
pub const PREAMBLE_TOGGLES: u8 = 8;

/// Low time and high time (in units) of each preamble toggle.
pub const PREAMBLE_UNITS: u32 = 1;

/// High time (in units) between the preamble and the enable marker.
pub const PREAMBLE_SETTLE_UNITS: u32 = 5;

/// High time (in units) after every bit and after the enable marker.
pub const BIT_GAP_UNITS: u32 = 1;

/// High time (in units) the sender keeps driving after an acknowledged frame.
pub const SUCCESS_HOLD_UNITS: u32 = 5;

/// Time the line is held high after the end marker so the receiver sees the
/// final level before the line is released.
///
/// Absolute, independent of the unit length.
pub const END_HOLD: Duration = Duration::from_millis(2);

/// Settling time after switching the line to input before sampling starts.
pub const INPUT_SETTLE: Duration = Duration::from_millis(1);

/// The acknowledgment pattern returned by the receiver for an accepted frame.
pub const ACK_PATTERN: [bool; 8] = [true; 8];

/// Width in bits of every fixed field (device id, checksum bytes).
pub const FIELD_BITS: usize = 8;

/// Bits surrounding the payload: one device-id byte and two checksum bytes.
pub const FRAME_ENVELOPE_BITS: usize = FIELD_BITS * 3;

/// Maximum payload length in bytes.
///
/// The remote device's command buffer is small; the longest command of the
/// body vocabulary is nine characters.
pub const MAX_PAYLOAD_LEN: usize = 32;

/// Maximum size of a frame in bits (envelope plus a full payload).
pub const MAX_FRAME_BITS: usize = FRAME_ENVELOPE_BITS + MAX_PAYLOAD_LEN * FIELD_BITS;

/// Maximum size of a frame in bytes.
pub const MAX_FRAME_BYTES: usize = MAX_FRAME_BITS / FIELD_BITS;

/// Default base unit (`minimumSignalLength`).
pub const DEFAULT_UNIT: Duration = Duration::from_millis(1);

/// Default per-pulse timeout, in units.
pub const DEFAULT_TIMEOUT_UNITS: u32 = 200;

/// Failed trials tolerated before the line is reset.
pub const DEFAULT_MAX_TRIALS: u8 = 5;

/// Device id of the host running this driver.
pub const DEFAULT_DEVICE_ID: u8 = 1;

/// Device id of the remote body controller (eye, lights, servos).
pub const BODY_DEVICE_ID: u8 = 2;
