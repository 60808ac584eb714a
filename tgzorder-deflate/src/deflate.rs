//! DEFLATE compression.
//!
//! Input is tokenized by [`Lz77Encoder`], then cut into blocks of at most
//! [`BLOCK_SYMBOLS`] tokens. Each block is priced three ways (stored, fixed
//! Huffman, dynamic Huffman) and written with whichever is smallest.

use crate::huffman::{
    CODELEN_ALPHABET_SIZE, DISTANCE_ALPHABET_SIZE, END_OF_BLOCK, HuffmanBuilder,
    LITLEN_ALPHABET_SIZE, MAX_CODE_LENGTH, MAX_CODELEN_CODE_LENGTH, canonical_codes,
};
use crate::lz77::{Lz77Encoder, Lz77Token};
use crate::tables::{
    CODE_LENGTH_ORDER, FIXED_DISTANCE_LENGTHS, FIXED_LITLEN_LENGTHS, distance_to_code,
    length_to_code,
};
use std::sync::OnceLock;
use tgzorder_core::bitstream::BitWriter;

/// Maximum number of LZ77 tokens per block.
pub const BLOCK_SYMBOLS: usize = 16383;

/// Largest payload of a single stored block.
const MAX_STORED: usize = 65535;

/// Block encodings, in RFC 1951 BTYPE order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Uncompressed.
    Stored,
    /// Fixed Huffman codes.
    Fixed,
    /// Dynamic Huffman codes.
    Dynamic,
}

/// A Huffman code ready for writing: lengths plus bit-reversed codes.
struct Code {
    lengths: Vec<u8>,
    codes: Vec<u16>,
}

impl Code {
    fn new(lengths: Vec<u8>) -> Self {
        let codes = canonical_codes(&lengths);
        Self { lengths, codes }
    }

    #[inline]
    fn write(&self, writer: &mut BitWriter, symbol: usize) {
        writer.write_bits(self.codes[symbol] as u32, self.lengths[symbol]);
    }
}

fn fixed_codes() -> &'static (Code, Code) {
    static CODES: OnceLock<(Code, Code)> = OnceLock::new();
    CODES.get_or_init(|| {
        (
            Code::new(FIXED_LITLEN_LENGTHS.to_vec()),
            Code::new(FIXED_DISTANCE_LENGTHS.to_vec()),
        )
    })
}

/// Symbol statistics for one block.
struct BlockStats {
    litlen: HuffmanBuilder,
    distance: HuffmanBuilder,
    /// Total extra bits of all length and distance codes.
    extra_bits: u64,
}

impl BlockStats {
    fn collect(tokens: &[Lz77Token]) -> Self {
        let mut litlen = HuffmanBuilder::new(LITLEN_ALPHABET_SIZE, MAX_CODE_LENGTH as u8);
        let mut distance = HuffmanBuilder::new(DISTANCE_ALPHABET_SIZE, MAX_CODE_LENGTH as u8);
        let mut extra_bits = 0u64;

        for token in tokens {
            match *token {
                Lz77Token::Literal(b) => litlen.add(b as u16),
                Lz77Token::Match {
                    length,
                    distance: dist,
                } => {
                    let (lcode, lextra, _) = length_to_code(length);
                    let (dcode, dextra, _) = distance_to_code(dist);
                    litlen.add(lcode);
                    distance.add(dcode);
                    extra_bits += (lextra + dextra) as u64;
                }
            }
        }
        litlen.add(END_OF_BLOCK);

        Self {
            litlen,
            distance,
            extra_bits,
        }
    }

    /// Bits needed for the block body under the given code lengths.
    fn body_bits(&self, litlen_lengths: &[u8], distance_lengths: &[u8]) -> u64 {
        let weigh = |freqs: &[u32], lengths: &[u8]| -> u64 {
            freqs
                .iter()
                .zip(lengths)
                .map(|(&f, &l)| f as u64 * l as u64)
                .sum()
        };
        weigh(self.litlen.frequencies(), litlen_lengths)
            + weigh(self.distance.frequencies(), distance_lengths)
            + self.extra_bits
    }
}

/// A dynamic block header, fully planned before anything is written.
struct DynamicHeader {
    litlen: Code,
    distance: Code,
    codelen: Code,
    hlit: usize,
    hdist: usize,
    hclen: usize,
    /// Run-length encoded code lengths as `(symbol, extra value)`.
    runs: Vec<(u8, u8)>,
}

impl DynamicHeader {
    fn plan(stats: &BlockStats) -> Self {
        let litlen_lengths = stats.litlen.build_lengths();
        let mut distance_lengths = stats.distance.build_lengths();
        if distance_lengths.iter().all(|&l| l == 0) {
            // Literal-only block; keep a complete two-code distance tree.
            distance_lengths[0] = 1;
            distance_lengths[1] = 1;
        }

        let hlit = last_used(&litlen_lengths).max(257);
        let hdist = last_used(&distance_lengths).max(1);

        let mut combined = Vec::with_capacity(hlit + hdist);
        combined.extend_from_slice(&litlen_lengths[..hlit]);
        combined.extend_from_slice(&distance_lengths[..hdist]);
        let runs = run_length_encode(&combined);

        let mut codelen_builder = HuffmanBuilder::new(CODELEN_ALPHABET_SIZE, MAX_CODELEN_CODE_LENGTH);
        for &(symbol, _) in &runs {
            codelen_builder.add(symbol as u16);
        }
        let codelen_lengths = codelen_builder.build_lengths();

        let hclen = CODE_LENGTH_ORDER
            .iter()
            .rposition(|&s| codelen_lengths[s] != 0)
            .map_or(4, |i| (i + 1).max(4));

        Self {
            litlen: Code::new(litlen_lengths),
            distance: Code::new(distance_lengths),
            codelen: Code::new(codelen_lengths),
            hlit,
            hdist,
            hclen,
            runs,
        }
    }

    fn header_bits(&self) -> u64 {
        let runs: u64 = self
            .runs
            .iter()
            .map(|&(symbol, _)| self.codelen.lengths[symbol as usize] as u64 + codelen_extra(symbol) as u64)
            .sum();
        5 + 5 + 4 + 3 * self.hclen as u64 + runs
    }

    fn write(&self, writer: &mut BitWriter) {
        writer.write_bits((self.hlit - 257) as u32, 5);
        writer.write_bits((self.hdist - 1) as u32, 5);
        writer.write_bits((self.hclen - 4) as u32, 4);
        for &symbol in &CODE_LENGTH_ORDER[..self.hclen] {
            writer.write_bits(self.codelen.lengths[symbol] as u32, 3);
        }
        for &(symbol, extra) in &self.runs {
            self.codelen.write(writer, symbol as usize);
            let bits = codelen_extra(symbol);
            if bits > 0 {
                writer.write_bits(extra as u32, bits);
            }
        }
    }
}

fn last_used(lengths: &[u8]) -> usize {
    lengths.iter().rposition(|&l| l != 0).map_or(0, |i| i + 1)
}

fn codelen_extra(symbol: u8) -> u8 {
    match symbol {
        16 => 2,
        17 => 3,
        18 => 7,
        _ => 0,
    }
}

/// Run-length encode code lengths with symbols 16 (repeat), 17 and 18 (zeros).
fn run_length_encode(lengths: &[u8]) -> Vec<(u8, u8)> {
    let mut runs = Vec::new();
    let mut i = 0;

    while i < lengths.len() {
        let len = lengths[i];
        let mut run = lengths[i..].iter().take_while(|&&l| l == len).count();
        i += run;

        if len == 0 {
            while run >= 11 {
                let n = run.min(138);
                runs.push((18, (n - 11) as u8));
                run -= n;
            }
            if run >= 3 {
                runs.push((17, (run - 3) as u8));
                run = 0;
            }
        } else {
            runs.push((len, 0));
            run -= 1;
            while run >= 3 {
                let n = run.min(6);
                runs.push((16, (n - 3) as u8));
                run -= n;
            }
        }
        runs.extend(std::iter::repeat_n((len, 0), run));
    }

    runs
}

/// DEFLATE compressor.
#[derive(Debug, Clone, Copy)]
pub struct Deflater {
    level: u8,
}

impl Deflater {
    /// Create a compressor for a level (0-9).
    pub fn new(level: u8) -> Self {
        Self { level: level.min(9) }
    }

    /// Compression level in use.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Compress `data` into a complete raw DEFLATE stream.
    pub fn compress_to_vec(&self, data: &[u8]) -> Vec<u8> {
        let tokens = Lz77Encoder::compress_all(data, self.level);
        let mut writer = BitWriter::with_capacity(data.len() / 2 + 64);

        if tokens.is_empty() {
            // Final fixed block holding only end-of-block.
            writer.write_bits(1, 1);
            writer.write_bits(1, 2);
            fixed_codes().0.write(&mut writer, END_OF_BLOCK as usize);
            return writer.finish();
        }

        let block_count = tokens.len().div_ceil(BLOCK_SYMBOLS);
        let mut byte_start = 0;
        for (index, block) in tokens.chunks(BLOCK_SYMBOLS).enumerate() {
            let byte_len: usize = block.iter().map(Lz77Token::input_len).sum();
            let raw = &data[byte_start..byte_start + byte_len];
            write_block(&mut writer, block, raw, index + 1 == block_count);
            byte_start += byte_len;
        }

        writer.finish()
    }
}

impl Default for Deflater {
    fn default() -> Self {
        Self::new(6)
    }
}

/// Encode one block with the cheapest block kind. Returns the kind chosen.
fn write_block(writer: &mut BitWriter, tokens: &[Lz77Token], raw: &[u8], is_final: bool) -> BlockKind {
    let stats = BlockStats::collect(tokens);
    let dynamic = DynamicHeader::plan(&stats);
    let (fixed_litlen, fixed_distance) = fixed_codes();

    let dynamic_bits = 3
        + dynamic.header_bits()
        + stats.body_bits(&dynamic.litlen.lengths, &dynamic.distance.lengths);
    let fixed_bits = 3 + stats.body_bits(&fixed_litlen.lengths, &fixed_distance.lengths);
    let stored_bits = stored_cost(writer.bits_written(), raw.len());

    if stored_bits < dynamic_bits.min(fixed_bits) {
        write_stored(writer, raw, is_final);
        BlockKind::Stored
    } else if fixed_bits <= dynamic_bits {
        writer.write_bits(is_final as u32, 1);
        writer.write_bits(1, 2);
        write_tokens(writer, tokens, fixed_litlen, fixed_distance);
        BlockKind::Fixed
    } else {
        writer.write_bits(is_final as u32, 1);
        writer.write_bits(2, 2);
        dynamic.write(writer);
        write_tokens(writer, tokens, &dynamic.litlen, &dynamic.distance);
        BlockKind::Dynamic
    }
}

fn stored_cost(start_bits: u64, len: usize) -> u64 {
    let mut bits = start_bits;
    let mut remaining = len;
    loop {
        let piece = remaining.min(MAX_STORED);
        bits = (bits + 3).div_ceil(8) * 8 + 32 + 8 * piece as u64;
        remaining -= piece;
        if remaining == 0 {
            return bits - start_bits;
        }
    }
}

fn write_stored(writer: &mut BitWriter, raw: &[u8], is_final: bool) {
    let pieces = raw.len().div_ceil(MAX_STORED).max(1);
    for (index, piece) in raw.chunks(MAX_STORED).enumerate() {
        writer.write_bits((is_final && index + 1 == pieces) as u32, 1);
        writer.write_bits(0, 2);
        writer.align_to_byte();
        let len = piece.len() as u16;
        writer.write_bits(len as u32, 16);
        writer.write_bits(!len as u32, 16);
        writer.write_bytes(piece);
    }
}

fn write_tokens(writer: &mut BitWriter, tokens: &[Lz77Token], litlen: &Code, distance: &Code) {
    for token in tokens {
        match *token {
            Lz77Token::Literal(b) => litlen.write(writer, b as usize),
            Lz77Token::Match {
                length,
                distance: dist,
            } => {
                let (lcode, lextra_bits, lextra) = length_to_code(length);
                litlen.write(writer, lcode as usize);
                if lextra_bits > 0 {
                    writer.write_bits(lextra as u32, lextra_bits);
                }
                let (dcode, dextra_bits, dextra) = distance_to_code(dist);
                distance.write(writer, dcode as usize);
                if dextra_bits > 0 {
                    writer.write_bits(dextra as u32, dextra_bits);
                }
            }
        }
    }
    litlen.write(writer, END_OF_BLOCK as usize);
}

/// Compress `data` into a raw DEFLATE stream at `level` (0-9).
///
/// # Example
///
/// ```
/// use tgzorder_deflate::{deflate, inflate};
///
/// let data = b"abcabcabcabcabcabc";
/// let compressed = deflate(data, 9);
/// assert_eq!(inflate(&compressed).unwrap(), data);
/// ```
pub fn deflate(data: &[u8], level: u8) -> Vec<u8> {
    Deflater::new(level).compress_to_vec(data)
}
