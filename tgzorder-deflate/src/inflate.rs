//! DEFLATE decompression (inflate).
//!
//! Supports all three block types from RFC 1951:
//! - Type 0: Stored (uncompressed)
//! - Type 1: Fixed Huffman codes
//! - Type 2: Dynamic Huffman codes
//!
//! The decoder works on an in-memory slice and reports how many bytes the
//! stream occupied, so containers can find what follows it.

use crate::huffman::{
    CODELEN_ALPHABET_SIZE, DISTANCE_ALPHABET_SIZE, END_OF_BLOCK, HuffmanDecoder,
    LITLEN_ALPHABET_SIZE,
};
use crate::tables::{
    CODE_LENGTH_ORDER, DISTANCE_BASE, DISTANCE_EXTRA_BITS, LENGTH_BASE, LENGTH_EXTRA_BITS,
    fixed_distance_decoder, fixed_litlen_decoder,
};
use tgzorder_core::bitstream::BitReader;
use tgzorder_core::error::{ArchiveError, Result};

/// DEFLATE decompressor over a byte slice.
#[derive(Debug)]
pub struct Inflater<'a> {
    reader: BitReader<'a>,
    output: Vec<u8>,
    final_block: bool,
}

impl<'a> Inflater<'a> {
    /// Create a decompressor for the stream at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: BitReader::new(data),
            output: Vec::with_capacity(data.len().saturating_mul(3)),
            final_block: false,
        }
    }

    /// Decode every block up to and including the final one.
    ///
    /// Returns the decompressed bytes and the number of input bytes the
    /// stream used, rounded up to a whole byte.
    pub fn finish(mut self) -> Result<(Vec<u8>, usize)> {
        while !self.final_block {
            self.inflate_block()?;
        }
        self.reader.align_to_byte();
        let consumed = self.reader.bytes_consumed();
        Ok((self.output, consumed))
    }

    fn inflate_block(&mut self) -> Result<()> {
        self.final_block = self.reader.read_bit()?;
        match self.reader.read_bits(2)? {
            0 => self.inflate_stored(),
            1 => self.inflate_codes(fixed_litlen_decoder()?, fixed_distance_decoder()?),
            2 => {
                let (litlen, distance) = self.read_dynamic_header()?;
                self.inflate_codes(&litlen, &distance)
            }
            _ => Err(ArchiveError::unsupported_method("DEFLATE block type 3")),
        }
    }

    fn inflate_stored(&mut self) -> Result<()> {
        self.reader.align_to_byte();
        let len = self.reader.read_bits(16)? as u16;
        let nlen = self.reader.read_bits(16)? as u16;

        if len != !nlen {
            return Err(ArchiveError::corrupted(
                self.reader.bit_position() / 8,
                format!("stored block LEN/NLEN mismatch: {:#06x} vs {:#06x}", len, nlen),
            ));
        }

        let bytes = self.reader.read_aligned_bytes(len as usize)?;
        self.output.extend_from_slice(bytes);
        Ok(())
    }

    fn read_dynamic_header(&mut self) -> Result<(HuffmanDecoder, HuffmanDecoder)> {
        let hlit = self.reader.read_bits(5)? as usize + 257;
        let hdist = self.reader.read_bits(5)? as usize + 1;
        let hclen = self.reader.read_bits(4)? as usize + 4;

        if hlit > LITLEN_ALPHABET_SIZE || hdist > DISTANCE_ALPHABET_SIZE {
            return Err(ArchiveError::invalid_header(format!(
                "too many length or distance codes: {} / {}",
                hlit, hdist
            )));
        }

        let mut codelen_lengths = [0u8; CODELEN_ALPHABET_SIZE];
        for &symbol in &CODE_LENGTH_ORDER[..hclen] {
            codelen_lengths[symbol] = self.reader.read_bits(3)? as u8;
        }
        let codelen = HuffmanDecoder::from_code_lengths(&codelen_lengths)?;

        let total = hlit + hdist;
        let mut lengths = Vec::with_capacity(total);
        while lengths.len() < total {
            let symbol = codelen.decode(&mut self.reader)?;
            let (value, repeat) = match symbol {
                0..=15 => (symbol as u8, 1),
                16 => {
                    let previous = *lengths.last().ok_or_else(|| {
                        ArchiveError::invalid_header("repeat code with no previous length")
                    })?;
                    (previous, 3 + self.reader.read_bits(2)? as usize)
                }
                17 => (0, 3 + self.reader.read_bits(3)? as usize),
                _ => (0, 11 + self.reader.read_bits(7)? as usize),
            };
            if lengths.len() + repeat > total {
                return Err(ArchiveError::invalid_header("code length run overflows header"));
            }
            lengths.extend(std::iter::repeat_n(value, repeat));
        }

        if lengths[END_OF_BLOCK as usize] == 0 {
            return Err(ArchiveError::invalid_header("missing end-of-block code"));
        }

        let litlen = HuffmanDecoder::from_code_lengths(&lengths[..hlit])?;
        let distance = HuffmanDecoder::from_code_lengths(&lengths[hlit..])?;
        Ok((litlen, distance))
    }

    fn inflate_codes(&mut self, litlen: &HuffmanDecoder, distance: &HuffmanDecoder) -> Result<()> {
        loop {
            let symbol = litlen.decode(&mut self.reader)?;
            if symbol < END_OF_BLOCK {
                self.output.push(symbol as u8);
                continue;
            }
            if symbol == END_OF_BLOCK {
                return Ok(());
            }

            let index = (symbol - 257) as usize;
            if index >= LENGTH_BASE.len() {
                return Err(ArchiveError::invalid_huffman(self.reader.bit_position()));
            }
            let length = LENGTH_BASE[index] as usize
                + self.reader.read_bits(LENGTH_EXTRA_BITS[index])? as usize;

            let code = distance.decode(&mut self.reader)? as usize;
            if code >= DISTANCE_BASE.len() {
                return Err(ArchiveError::invalid_huffman(self.reader.bit_position()));
            }
            let dist = DISTANCE_BASE[code] as usize
                + self.reader.read_bits(DISTANCE_EXTRA_BITS[code])? as usize;

            if dist > self.output.len() {
                return Err(ArchiveError::invalid_distance(dist, self.output.len()));
            }

            let start = self.output.len() - dist;
            if dist >= length {
                self.output.extend_from_within(start..start + length);
            } else {
                // Overlapping copy repeats the last `dist` bytes.
                for i in 0..length {
                    let byte = self.output[start + i];
                    self.output.push(byte);
                }
            }
        }
    }
}

/// Decompress a complete raw DEFLATE stream.
///
/// Bytes after the final block are ignored.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    Inflater::new(data).finish().map(|(output, _)| output)
}

/// Decompress the DEFLATE stream at the start of `data` and report how many
/// bytes of `data` it occupied.
pub fn inflate_prefix(data: &[u8]) -> Result<(Vec<u8>, usize)> {
    Inflater::new(data).finish()
}
