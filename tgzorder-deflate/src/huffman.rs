//! Canonical Huffman coding for DEFLATE.
//!
//! DEFLATE uses canonical Huffman codes, where codes of the same length are
//! assigned consecutive values in symbol order. Only the code lengths are
//! transmitted; both sides rebuild the codes from them.
//!
//! # Alphabets
//!
//! - **Literal/Length**: 0-285 (0-255 literals, 256 EOB, 257-285 lengths)
//! - **Distance**: 0-29
//! - **Code Length**: 0-18 (for encoding dynamic block headers)

use tgzorder_core::bitstream::BitReader;
use tgzorder_core::error::{ArchiveError, Result};

/// Maximum code length in DEFLATE (15 bits).
pub const MAX_CODE_LENGTH: usize = 15;

/// Maximum code length for the code length alphabet.
pub const MAX_CODELEN_CODE_LENGTH: u8 = 7;

/// Size of the literal/length alphabet (0-285).
pub const LITLEN_ALPHABET_SIZE: usize = 286;

/// Size of the distance alphabet (0-29).
pub const DISTANCE_ALPHABET_SIZE: usize = 30;

/// Size of the code length alphabet (0-18).
pub const CODELEN_ALPHABET_SIZE: usize = 19;

/// End of block symbol.
pub const END_OF_BLOCK: u16 = 256;

/// A table-driven canonical Huffman decoder.
///
/// Codes up to `FAST_BITS` long resolve with one table lookup. Longer codes
/// fall back to a canonical walk over the per-length counts.
#[derive(Debug, Clone)]
pub struct HuffmanDecoder {
    /// Entry format: `symbol << 4 | length`; zero means "not in table".
    fast_table: Vec<u16>,
    /// Number of codes of each length.
    counts: [u16; MAX_CODE_LENGTH + 1],
    /// Symbols ordered by (length, symbol).
    symbols: Vec<u16>,
}

impl HuffmanDecoder {
    /// Number of bits for the fast lookup table.
    const FAST_BITS: u8 = 10;

    /// Build a decoder from code lengths.
    ///
    /// `code_lengths[i]` is the bit length for symbol `i`; zero means unused.
    /// Over-subscribed codes are rejected. An incomplete code is accepted only
    /// when it has at most one symbol, which DEFLATE permits for distances.
    pub fn from_code_lengths(code_lengths: &[u8]) -> Result<Self> {
        let mut counts = [0u16; MAX_CODE_LENGTH + 1];
        for &len in code_lengths {
            if len as usize > MAX_CODE_LENGTH {
                return Err(ArchiveError::invalid_header(format!(
                    "Huffman code length {} exceeds {}",
                    len, MAX_CODE_LENGTH
                )));
            }
            counts[len as usize] += 1;
        }
        counts[0] = 0;

        let used: u16 = counts.iter().sum();
        let mut left: i32 = 1;
        for &count in &counts[1..] {
            left = (left << 1) - count as i32;
            if left < 0 {
                return Err(ArchiveError::invalid_header("Over-subscribed Huffman code"));
            }
        }
        if left > 0 && used > 1 {
            return Err(ArchiveError::invalid_header("Incomplete Huffman code"));
        }

        // Offsets of each length within the sorted symbol list.
        let mut offsets = [0u16; MAX_CODE_LENGTH + 2];
        for len in 1..=MAX_CODE_LENGTH {
            offsets[len + 1] = offsets[len] + counts[len];
        }
        let mut symbols = vec![0u16; used as usize];
        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len > 0 {
                symbols[offsets[len as usize] as usize] = symbol as u16;
                offsets[len as usize] += 1;
            }
        }

        let codes = canonical_codes(code_lengths);
        let mut fast_table = vec![0u16; 1 << Self::FAST_BITS];
        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len == 0 || len > Self::FAST_BITS {
                continue;
            }
            let entry = ((symbol as u16) << 4) | len as u16;
            let mut index = codes[symbol] as usize;
            while index < fast_table.len() {
                fast_table[index] = entry;
                index += 1 << len;
            }
        }

        Ok(Self {
            fast_table,
            counts,
            symbols,
        })
    }

    /// Decode one symbol.
    #[inline]
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16> {
        let (bits, available) = reader.peek_bits(Self::FAST_BITS);
        let entry = self.fast_table[bits as usize];
        if entry != 0 {
            let len = (entry & 0xF) as u8;
            if len > available {
                return Err(ArchiveError::unexpected_eof(1));
            }
            reader.consume(len)?;
            return Ok(entry >> 4);
        }
        self.decode_slow(reader)
    }

    /// Canonical walk, one bit at a time, for codes longer than the table.
    fn decode_slow(&self, reader: &mut BitReader<'_>) -> Result<u16> {
        let (bits, available) = reader.peek_bits(MAX_CODE_LENGTH as u8);
        let mut code: i32 = 0;
        let mut first: i32 = 0;
        let mut index: i32 = 0;

        for len in 1..=MAX_CODE_LENGTH {
            if len as u8 > available {
                return Err(ArchiveError::unexpected_eof(1));
            }
            code |= ((bits >> (len - 1)) & 1) as i32;
            let count = self.counts[len] as i32;
            if code - first < count {
                reader.consume(len as u8)?;
                return Ok(self.symbols[(index + code - first) as usize]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }

        Err(ArchiveError::invalid_huffman(reader.bit_position()))
    }
}

/// Assign canonical codes to `code_lengths`, returned bit-reversed so they
/// can be written LSB-first.
pub fn canonical_codes(code_lengths: &[u8]) -> Vec<u16> {
    let mut bl_count = [0u16; MAX_CODE_LENGTH + 1];
    for &len in code_lengths {
        bl_count[len as usize] += 1;
    }
    bl_count[0] = 0;

    let mut next_code = [0u16; MAX_CODE_LENGTH + 1];
    let mut code = 0u16;
    for bits in 1..=MAX_CODE_LENGTH {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }

    code_lengths
        .iter()
        .map(|&len| {
            if len == 0 {
                return 0;
            }
            let code = next_code[len as usize];
            next_code[len as usize] += 1;
            code.reverse_bits() >> (16 - len as u16)
        })
        .collect()
}

/// Builder for length-limited Huffman code lengths from symbol frequencies.
#[derive(Debug, Clone)]
pub struct HuffmanBuilder {
    frequencies: Vec<u32>,
    max_length: u8,
}

impl HuffmanBuilder {
    /// Create a new Huffman builder.
    pub fn new(alphabet_size: usize, max_length: u8) -> Self {
        Self {
            frequencies: vec![0; alphabet_size],
            max_length,
        }
    }

    /// Add a symbol occurrence.
    #[inline]
    pub fn add(&mut self, symbol: u16) {
        self.frequencies[symbol as usize] += 1;
    }

    /// Add multiple occurrences of a symbol.
    pub fn add_count(&mut self, symbol: u16, count: u32) {
        self.frequencies[symbol as usize] += count;
    }

    /// Frequencies collected so far.
    pub fn frequencies(&self) -> &[u32] {
        &self.frequencies
    }

    /// Build code lengths from the collected frequencies.
    ///
    /// At least two symbols always receive a code, so the result is a
    /// complete prefix code whenever any symbol is used. No length exceeds
    /// `max_length`.
    pub fn build_lengths(&self) -> Vec<u8> {
        let n = self.frequencies.len();
        let mut lengths = vec![0u8; n];

        let mut leaves: Vec<(u32, usize)> = self
            .frequencies
            .iter()
            .enumerate()
            .filter(|&(_, f)| *f > 0)
            .map(|(i, f)| (*f, i))
            .collect();

        if leaves.is_empty() {
            return lengths;
        }

        // Pad to two symbols with a zero-weight companion.
        if leaves.len() == 1 && n > 1 {
            let companion = if leaves[0].1 == 0 { 1 } else { 0 };
            leaves.push((0, companion));
        }
        if leaves.len() == 1 {
            lengths[leaves[0].1] = 1;
            return lengths;
        }

        leaves.sort_unstable();
        let depths = tree_depths(&leaves);

        // Number of codes per length, clamped into max_length.
        let max_len = self.max_length as usize;
        let mut num_codes = vec![0u32; max_len.max(*depths.iter().max().unwrap_or(&0)) + 1];
        for &d in &depths {
            num_codes[d] += 1;
        }
        let overflow: u32 = num_codes[max_len + 1..].iter().sum();
        num_codes.truncate(max_len + 1);
        num_codes[max_len] += overflow;

        // Repair the Kraft sum by lengthening a shorter code for each excess leaf.
        let target = 1u64 << max_len;
        let mut total: u64 = (1..=max_len)
            .map(|len| (num_codes[len] as u64) << (max_len - len))
            .sum();
        while total > target {
            num_codes[max_len] -= 1;
            for len in (1..max_len).rev() {
                if num_codes[len] > 0 {
                    num_codes[len] -= 1;
                    num_codes[len + 1] += 2;
                    break;
                }
            }
            total -= 1;
        }

        // Longest codes go to the rarest symbols.
        let mut next = 0;
        for len in (1..=max_len).rev() {
            for _ in 0..num_codes[len] {
                lengths[leaves[next].1] = len as u8;
                next += 1;
            }
        }

        lengths
    }
}

/// Depth of each leaf in an optimal Huffman tree.
///
/// `leaves` must be sorted by ascending weight. Uses the two-queue merge, so
/// no heap is needed.
fn tree_depths(leaves: &[(u32, usize)]) -> Vec<usize> {
    let m = leaves.len();
    let mut weight: Vec<u64> = leaves.iter().map(|&(f, _)| f as u64).collect();
    weight.reserve(m - 1);
    let mut parent = vec![0usize; 2 * m - 1];

    let mut next_leaf = 0;
    let mut next_node = m;
    for _ in 0..m - 1 {
        let mut take = || {
            if next_leaf < m && (next_node >= weight.len() || weight[next_leaf] <= weight[next_node])
            {
                next_leaf += 1;
                next_leaf - 1
            } else {
                next_node += 1;
                next_node - 1
            }
        };
        let a = take();
        let b = take();
        let id = weight.len();
        weight.push(weight[a] + weight[b]);
        parent[a] = id;
        parent[b] = id;
    }

    // Parents always have larger ids than their children.
    let root = 2 * m - 2;
    let mut depth = vec![0usize; 2 * m - 1];
    for id in (0..root).rev() {
        depth[id] = depth[parent[id]] + 1;
    }
    depth.truncate(m);
    depth
}
