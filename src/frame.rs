//! Frame layout.
//!
//! ```text
//! | device id (8) | payload (8 * n) | checksum sum1 (8) | checksum sum2 (8) |
//! ```
//!
//! The checksum covers the payload bits only. Every field is MSB first.

use crate::checksum::checksum16;
use crate::consts::{FIELD_BITS, FRAME_ENVELOPE_BITS};
use crate::encoding::{BitBuf, Text, bits_to_int, bits_to_text, extend_bits, int_to_bits, text_to_bits};
use crate::error::CodecError;

/// Builds the bit sequence for a frame addressed to `device_id`.
///
/// Fails with [`CodecError::Capacity`] if the payload does not fit one frame.
pub fn encode_frame(device_id: u8, payload: &str) -> Result<BitBuf, CodecError> {
    let payload = text_to_bits(payload)?;
    let (sum1, sum2) = checksum16(&payload);
    let mut frame = BitBuf::new();
    extend_bits(&mut frame, &int_to_bits(device_id))?;
    extend_bits(&mut frame, &payload)?;
    extend_bits(&mut frame, &int_to_bits(sum1))?;
    extend_bits(&mut frame, &int_to_bits(sum2))?;
    Ok(frame)
}

/// A received frame split into its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedFrame<'a> {
    /// Addressee.
    pub device_id: u8,
    /// Payload bits, not necessarily a whole number of bytes.
    pub payload: &'a [bool],
    /// Checksum carried by the frame.
    pub checksum: (u8, u8),
}

impl<'a> ReceivedFrame<'a> {
    /// Splits a received bit sequence into device id, payload and checksum.
    ///
    /// Fails with [`CodecError::Truncated`] if fewer than 24 bits were received.
    pub fn parse(bits: &'a [bool]) -> Result<Self, CodecError> {
        if bits.len() < FRAME_ENVELOPE_BITS {
            return Err(CodecError::Truncated(bits.len()));
        }
        let (id, rest) = bits.split_at(FIELD_BITS);
        let (payload, sums) = rest.split_at(rest.len() - 2 * FIELD_BITS);
        let (sum1, sum2) = sums.split_at(FIELD_BITS);
        Ok(Self {
            device_id: bits_to_int(id)?,
            payload,
            checksum: (bits_to_int(sum1)?, bits_to_int(sum2)?),
        })
    }

    /// Checksum computed over the received payload.
    pub fn expected_checksum(&self) -> (u8, u8) {
        checksum16(self.payload)
    }

    /// Whether the carried checksum matches the payload.
    pub fn checksum_ok(&self) -> bool {
        self.expected_checksum() == self.checksum
    }

    /// Decodes the payload as text.
    pub fn text(&self) -> Result<Text, CodecError> {
        bits_to_text(self.payload)
    }
}
