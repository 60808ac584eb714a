//! Code tables for DEFLATE (RFC 1951).
//!
//! Length and distance base/extra-bit tables, the code length permutation
//! used by dynamic block headers, and the fixed Huffman code lengths.

use crate::huffman::HuffmanDecoder;
use std::sync::OnceLock;
use tgzorder_core::Result;

/// Fixed literal/length code lengths (RFC 1951 Section 3.2.6).
///
/// - Symbols 0-143: 8 bits
/// - Symbols 144-255: 9 bits
/// - Symbols 256-279: 7 bits
/// - Symbols 280-287: 8 bits
pub const FIXED_LITLEN_LENGTHS: [u8; 288] = {
    let mut lengths = [8u8; 288];
    let mut i = 144;
    while i < 256 {
        lengths[i] = 9;
        i += 1;
    }
    while i < 280 {
        lengths[i] = 7;
        i += 1;
    }
    lengths
};

/// Fixed distance code lengths.
///
/// All 32 codes use 5 bits. Codes 30 and 31 never appear in valid data but
/// are part of the code, which is complete only with them.
pub const FIXED_DISTANCE_LENGTHS: [u8; 32] = [5u8; 32];

fn cached_decoder(
    cell: &'static OnceLock<HuffmanDecoder>,
    lengths: &[u8],
) -> Result<&'static HuffmanDecoder> {
    if let Some(decoder) = cell.get() {
        return Ok(decoder);
    }
    let decoder = HuffmanDecoder::from_code_lengths(lengths)?;
    Ok(cell.get_or_init(|| decoder))
}

/// Decoder for the fixed literal/length code, built once.
pub fn fixed_litlen_decoder() -> Result<&'static HuffmanDecoder> {
    static DECODER: OnceLock<HuffmanDecoder> = OnceLock::new();
    cached_decoder(&DECODER, &FIXED_LITLEN_LENGTHS)
}

/// Decoder for the fixed distance code, built once.
pub fn fixed_distance_decoder() -> Result<&'static HuffmanDecoder> {
    static DECODER: OnceLock<HuffmanDecoder> = OnceLock::new();
    cached_decoder(&DECODER, &FIXED_DISTANCE_LENGTHS)
}

/// Length code base values for codes 257-285.
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, // 257-264: 0 extra bits
    11, 13, 15, 17, // 265-268: 1 extra bit
    19, 23, 27, 31, // 269-272: 2 extra bits
    35, 43, 51, 59, // 273-276: 3 extra bits
    67, 83, 99, 115, // 277-280: 4 extra bits
    131, 163, 195, 227, // 281-284: 5 extra bits
    258, // 285
];

/// Number of extra bits for length codes 257-285.
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, // 257-264
    1, 1, 1, 1, // 265-268
    2, 2, 2, 2, // 269-272
    3, 3, 3, 3, // 273-276
    4, 4, 4, 4, // 277-280
    5, 5, 5, 5, // 281-284
    0, // 285
];

/// Distance code base values for codes 0-29.
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Number of extra bits for distance codes 0-29.
pub const DISTANCE_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Order of code length codes in a dynamic block header (RFC 1951 Section 3.2.7).
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Map a match length (3-258) to `(code, extra_bits, extra_value)`.
#[inline]
pub fn length_to_code(length: u16) -> (u16, u8, u16) {
    debug_assert!((3..=258).contains(&length), "Length out of range: {}", length);

    let idx = match length {
        3..=10 => length - 3,
        11..=18 => (length - 11) / 2 + 8,
        19..=34 => (length - 19) / 4 + 12,
        35..=66 => (length - 35) / 8 + 16,
        67..=130 => (length - 67) / 16 + 20,
        131..=257 => (length - 131) / 32 + 24,
        _ => 28,
    } as usize;

    (
        idx as u16 + 257,
        LENGTH_EXTRA_BITS[idx],
        length - LENGTH_BASE[idx],
    )
}

/// Map a distance (1-32768) to `(code, extra_bits, extra_value)`.
#[inline]
pub fn distance_to_code(distance: u16) -> (u16, u8, u16) {
    debug_assert!(distance >= 1, "Distance out of range: {}", distance);

    let code = if distance <= 4 {
        distance as usize - 1
    } else {
        // Two codes per power of two above 4.
        let d = (distance - 1) as u32;
        let msb = 31 - d.leading_zeros();
        let second = (d >> (msb - 1)) & 1;
        (2 * msb + second) as usize
    };

    (
        code as u16,
        DISTANCE_EXTRA_BITS[code],
        distance - DISTANCE_BASE[code],
    )
}
