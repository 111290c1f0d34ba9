//! Error types for the SIMON protocol.
//!
//! Two layers exist: [`CodecError`] covers pure bit/text conversions and has
//! no hardware dependency, while [`Error`] is generic over the data line's
//! `embedded_hal::digital::ErrorType::Error` and covers whole exchanges.

use thiserror::Error;

/// Failures of the signal codec and frame parser.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum CodecError {
    /// The bit count is not a multiple of 8.
    #[error("bit count {0} is not a multiple of 8")]
    Misaligned(usize),

    /// A fixed-width field did not have exactly 8 bits.
    #[error("expected an 8-bit field, got {0} bits")]
    Width(usize),

    /// The decoded bytes are not valid text.
    #[error("payload is not valid UTF-8 text")]
    InvalidText,

    /// The frame does not fit the fixed-size frame buffer.
    #[error("frame exceeds the maximum frame size")]
    Capacity,

    /// The bit sequence is shorter than the device-id and checksum envelope.
    #[error("frame of {0} bits is shorter than the 24-bit envelope")]
    Truncated(usize),
}

/// Main error type for all session operations.
///
/// The transient variants ([`Error::is_transient`]) are consumed by the
/// retry loop of [`Session`](crate::session::Session) and are only visible
/// to callers driving a [`Transceiver`](crate::transceiver::Transceiver)
/// directly.
#[derive(Debug, Error)]
pub enum Error<E> {
    /// No valid transition was observed within the timeout window.
    #[error("no pulse observed within the timeout window")]
    PulseTimeout,

    /// The reply to a frame was not the all-ones acknowledgment.
    #[error("receiver did not acknowledge the frame")]
    AcknowledgmentFailure,

    /// The received checksum does not match the payload.
    #[error("checksum mismatch: expected {expected:?}, received {received:?}")]
    ChecksumMismatch {
        /// Checksum computed over the received payload.
        expected: (u8, u8),
        /// Checksum carried by the frame.
        received: (u8, u8),
    },

    /// The frame is addressed to another device.
    #[error("frame addressed to device {received}, this device is {expected}")]
    DeviceIdMismatch {
        /// Our own device id.
        expected: u8,
        /// Device id carried by the frame.
        received: u8,
    },

    /// The received bits are too few to hold a frame.
    #[error("received {0} bits, too short for a frame")]
    FrameTooShort(usize),

    /// The sender kept transmitting past the maximum frame size.
    #[error("received frame exceeds the maximum frame size")]
    FrameOverflow,

    /// A frame passed validation but its payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),

    /// The data line reported an I/O error.
    #[error("line I/O error: {0:?}")]
    Line(E),

    /// The line could not be released or provisioned again.
    #[error("line provisioning failed: {0:?}")]
    ResourceFailure(E),

    /// A previous reset failed and the session holds no line.
    #[error("session holds no provisioned line")]
    NotProvisioned,

    /// The configured number of reset cycles was exhausted.
    #[error("communication failed after {resets} reset cycles")]
    CommunicationFailure {
        /// Reset cycles performed during the call.
        resets: u32,
    },
}

impl<E> Error<E> {
    /// Whether the retry loop absorbs this error as a failed trial.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::PulseTimeout
                | Error::AcknowledgmentFailure
                | Error::ChecksumMismatch { .. }
                | Error::DeviceIdMismatch { .. }
                | Error::FrameTooShort(_)
                | Error::FrameOverflow
        )
    }

    /// Short label used when logging failed trials.
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Error::PulseTimeout => "pulse timeout",
            Error::AcknowledgmentFailure => "no acknowledgment",
            Error::ChecksumMismatch { .. } => "checksum mismatch",
            Error::DeviceIdMismatch { .. } => "device id mismatch",
            Error::FrameTooShort(_) => "frame too short",
            Error::FrameOverflow => "frame overflow",
            Error::Decode(_) => "decode error",
            Error::Line(_) => "line error",
            Error::ResourceFailure(_) => "resource failure",
            Error::NotProvisioned => "not provisioned",
            Error::CommunicationFailure { .. } => "communication failure",
        }
    }
}

/// Result type alias using [`Error`].
pub type Result<T, E> = core::result::Result<T, Error<E>>;
