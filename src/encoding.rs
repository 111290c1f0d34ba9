//! Bit-level signal codec for SIMON frames.
//!
//! The protocol moves data as a plain sequence of bits, one pulse per bit.
//! This module converts between that representation and the values the
//! session works with: text payloads and 8-bit fields.
//!
//! ## Bit order
//!
//! Every byte is emitted as an 8-bit field, most significant bit first, and
//! fields are concatenated in order. There is no escaping; any byte value is
//! representable.
//!
//! ## Buffers
//!
//! With the `std` feature bit and byte buffers are plain `Vec`s. Without it
//! they are `heapless` vectors sized for the largest frame
//! ([`MAX_FRAME_BITS`]). The cap applies in both builds so that both accept
//! exactly the same frames.
//!
//! ## Functions
//!
//! - [`text_to_bits`] / [`bits_to_text`]: payload text
//! - [`int_to_bits`] / [`bits_to_int`]: fixed-width 8-bit fields
//! - [`bits_to_bytes`]: raw byte recovery, used by [`bits_to_text`]

#[cfg(not(feature = "std"))]
use heapless::{String, Vec};

use crate::consts::{FIELD_BITS, MAX_FRAME_BITS};
#[cfg(not(feature = "std"))]
use crate::consts::{MAX_FRAME_BYTES, MAX_PAYLOAD_LEN};
use crate::error::CodecError;

/// A sequence of protocol bits (`true` = `1`).
#[cfg(feature = "std")]
pub type BitBuf = Vec<bool>;
/// A sequence of protocol bits (`true` = `1`).
#[cfg(not(feature = "std"))]
pub type BitBuf = Vec<bool, MAX_FRAME_BITS>;

/// Raw bytes recovered from a bit sequence.
#[cfg(feature = "std")]
pub type ByteBuf = Vec<u8>;
/// Raw bytes recovered from a bit sequence.
#[cfg(not(feature = "std"))]
pub type ByteBuf = Vec<u8, MAX_FRAME_BYTES>;

/// Decoded payload text.
#[cfg(feature = "std")]
pub type Text = String;
/// Decoded payload text.
#[cfg(not(feature = "std"))]
pub type Text = String<MAX_PAYLOAD_LEN>;

/// Appends one bit, failing once the frame size cap is reached.
pub fn push_bit(buf: &mut BitBuf, bit: bool) -> Result<(), CodecError> {
    if buf.len() >= MAX_FRAME_BITS {
        return Err(CodecError::Capacity);
    }
    #[cfg(feature = "std")]
    buf.push(bit);
    #[cfg(not(feature = "std"))]
    buf.push(bit).map_err(|_| CodecError::Capacity)?;
    Ok(())
}

/// Appends a slice of bits, failing once the frame size cap is reached.
pub fn extend_bits(buf: &mut BitBuf, bits: &[bool]) -> Result<(), CodecError> {
    for &bit in bits {
        push_bit(buf, bit)?;
    }
    Ok(())
}

/// Encodes an 8-bit integer as an MSB-first field.
pub fn int_to_bits(value: u8) -> [bool; 8] {
    let mut bits = [false; 8];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = value & (0x80 >> i) != 0;
    }
    bits
}

/// Decodes an MSB-first 8-bit field.
///
/// Returns [`CodecError::Width`] unless `bits` is exactly 8 bits long.
pub fn bits_to_int(bits: &[bool]) -> Result<u8, CodecError> {
    if bits.len() != FIELD_BITS {
        return Err(CodecError::Width(bits.len()));
    }
    Ok(pack_byte(bits))
}

fn pack_byte(bits: &[bool]) -> u8 {
    bits.iter().fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit))
}

/// Encodes raw bytes, one 8-bit field per byte.
pub fn bytes_to_bits(bytes: &[u8]) -> Result<BitBuf, CodecError> {
    let mut bits = BitBuf::new();
    for &byte in bytes {
        extend_bits(&mut bits, &int_to_bits(byte))?;
    }
    Ok(bits)
}

/// Encodes text as its bytes, one 8-bit field per byte.
pub fn text_to_bits(text: &str) -> Result<BitBuf, CodecError> {
    bytes_to_bits(text.as_bytes())
}

/// Groups bits into bytes.
///
/// Unlike the checksum, this never drops trailing bits: a length that is not
/// a multiple of 8 is reported as [`CodecError::Misaligned`].
pub fn bits_to_bytes(bits: &[bool]) -> Result<ByteBuf, CodecError> {
    if bits.len() % FIELD_BITS != 0 {
        return Err(CodecError::Misaligned(bits.len()));
    }
    let mut bytes = ByteBuf::new();
    for chunk in bits.chunks(FIELD_BITS) {
        #[cfg(feature = "std")]
        bytes.push(pack_byte(chunk));
        #[cfg(not(feature = "std"))]
        bytes
            .push(pack_byte(chunk))
            .map_err(|_| CodecError::Capacity)?;
    }
    Ok(bytes)
}

/// Reconstructs text from a bit sequence produced by [`text_to_bits`].
pub fn bits_to_text(bits: &[bool]) -> Result<Text, CodecError> {
    let bytes = bits_to_bytes(bits)?;
    let text = core::str::from_utf8(&bytes).map_err(|_| CodecError::InvalidText)?;
    owned_text(text)
}

#[cfg(feature = "std")]
fn owned_text(text: &str) -> Result<Text, CodecError> {
    Ok(String::from(text))
}

#[cfg(not(feature = "std"))]
fn owned_text(text: &str) -> Result<Text, CodecError> {
    let mut out = Text::new();
    out.push_str(text).map_err(|_| CodecError::Capacity)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(bits: &str) -> Vec<bool> {
        bits.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn test_int_to_bits_is_msb_first() {
        assert_eq!(int_to_bits(7).to_vec(), parse("00000111"));
        assert_eq!(int_to_bits(0x80).to_vec(), parse("10000000"));
        assert_eq!(int_to_bits(255), [true; 8]);
    }

    #[test]
    fn test_int_round_trip_full_range() {
        for n in 0..=u8::MAX {
            assert_eq!(bits_to_int(&int_to_bits(n)), Ok(n));
        }
    }

    #[test]
    fn test_bits_to_int_rejects_wrong_width() {
        assert_eq!(bits_to_int(&parse("0101")), Err(CodecError::Width(4)));
        assert_eq!(bits_to_int(&parse("000000001")), Err(CodecError::Width(9)));
    }

    #[test]
    fn test_text_to_bits_known_vector() {
        let bits = text_to_bits("A1").unwrap();
        assert_eq!(bits, parse("0100000100110001"));
    }

    #[test]
    fn test_text_round_trip_printable_ascii() {
        let printable: String = (0x20u8..0x7f).map(char::from).collect();
        for chunk in printable.as_bytes().chunks(16) {
            let s = core::str::from_utf8(chunk).unwrap();
            let bits = text_to_bits(s).unwrap();
            assert_eq!(bits.len(), s.len() * 8);
            assert_eq!(bits_to_text(&bits).unwrap(), s);
        }
        assert_eq!(bits_to_text(&text_to_bits("4 5 7 5 5").unwrap()).unwrap(), "4 5 7 5 5");
    }

    #[test]
    fn test_empty_text() {
        let bits = text_to_bits("").unwrap();
        assert!(bits.is_empty());
        assert_eq!(bits_to_text(&bits).unwrap(), "");
    }

    #[test]
    fn test_misaligned_bits_fail_to_decode() {
        let mut bits = text_to_bits("hi").unwrap();
        let _ = bits.pop();
        assert_eq!(bits_to_text(&bits), Err(CodecError::Misaligned(15)));
    }

    #[test]
    fn test_invalid_text_is_reported() {
        let bits = bytes_to_bits(&[0xff, 0xfe]).unwrap();
        assert_eq!(bits_to_bytes(&bits).unwrap().as_slice(), &[0xff, 0xfe]);
        assert_eq!(bits_to_text(&bits), Err(CodecError::InvalidText));
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut bits = BitBuf::new();
        for _ in 0..MAX_FRAME_BITS {
            push_bit(&mut bits, true).unwrap();
        }
        assert_eq!(push_bit(&mut bits, false), Err(CodecError::Capacity));
    }
}
