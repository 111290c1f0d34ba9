//! Two-byte Fletcher-style checksum carried at the end of every frame.
//!
//! The recurrence folds the *updated* first sum into the second sum after
//! every block, which differs from textbook Fletcher-16. The remote device
//! runs the identical algorithm, so only self-consistency matters and the
//! recurrence must stay as is.

use crate::consts::FIELD_BITS;

const MODULUS: u16 = 255;

/// Computes the checksum over a bit sequence.
///
/// The bits are split into `len / 8` blocks of 8 bits; trailing bits that do
/// not fill a block are ignored.
///
/// # Returns
/// `(sum1, sum2)`, each reduced modulo 255.
pub fn checksum16(bits: &[bool]) -> (u8, u8) {
    let mut sum1: u16 = 0;
    let mut sum2: u16 = 0;
    for block in bits.chunks_exact(FIELD_BITS) {
        let value = block
            .iter()
            .fold(0u16, |acc, &bit| (acc << 1) | u16::from(bit));
        sum1 = (sum1 + value) % MODULUS;
        sum2 = (sum1 + sum2) % MODULUS;
    }
    (lo8(sum1), lo8(sum2))
}

pub(crate) fn lo8(x: u16) -> u8 {
    (x & 0xff) as u8
}
