//! Bit-level I/O for DEFLATE streams.
//!
//! `BitReader` reads from an in-memory byte slice and `BitWriter` appends to
//! an owned `Vec<u8>`. Both work entirely in memory, so the writer is
//! infallible and the reader only fails when the input runs out.
//!
//! # Bit Ordering
//!
//! DEFLATE packs bits LSB-first within each byte. Huffman codes are stored
//! MSB-first, so encoders reverse them before calling [`BitWriter::write_bits`].
//!
//! # Example
//!
//! ```
//! use tgzorder_core::bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3);
//! writer.write_bits(0b1100, 4);
//! let output = writer.finish();
//!
//! let mut reader = BitReader::new(&output);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(4).unwrap(), 0b1100);
//! ```

use crate::error::{ArchiveError, Result};

/// A bit-level reader over a byte slice.
///
/// Bits are pulled into a 64-bit buffer up to 8 bytes at a time. The reader
/// tracks how many bits were consumed so callers can find where a DEFLATE
/// stream ended inside a larger buffer.
#[derive(Debug)]
pub struct BitReader<'a> {
    /// Input bytes.
    data: &'a [u8],
    /// Next byte of `data` to load into the buffer.
    pos: usize,
    /// Bit buffer (LSB-first).
    buffer: u64,
    /// Number of valid bits in buffer.
    bits_in_buffer: u8,
    /// Total bits consumed.
    total_bits_read: u64,
}

impl<'a> BitReader<'a> {
    /// Create a new `BitReader` over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            buffer: 0,
            bits_in_buffer: 0,
            total_bits_read: 0,
        }
    }

    /// Get the current bit position (for error reporting).
    pub fn bit_position(&self) -> u64 {
        self.total_bits_read
    }

    /// Number of whole bytes consumed, rounding a partial byte up.
    pub fn bytes_consumed(&self) -> usize {
        self.total_bits_read.div_ceil(8) as usize
    }

    #[inline]
    fn refill(&mut self) {
        while self.bits_in_buffer <= 56 && self.pos < self.data.len() {
            self.buffer |= (self.data[self.pos] as u64) << self.bits_in_buffer;
            self.bits_in_buffer += 8;
            self.pos += 1;
        }
    }

    /// Read up to 32 bits, first bit read in the LSB position.
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "Cannot read more than 32 bits at once");

        if count == 0 {
            return Ok(0);
        }

        if self.bits_in_buffer < count {
            self.refill();
            if self.bits_in_buffer < count {
                let missing = (count - self.bits_in_buffer).div_ceil(8);
                return Err(ArchiveError::unexpected_eof(missing as usize));
            }
        }

        let mask = (1u64 << count).wrapping_sub(1);
        let result = (self.buffer & mask) as u32;

        self.buffer >>= count;
        self.bits_in_buffer -= count;
        self.total_bits_read += count as u64;

        Ok(result)
    }

    /// Peek at up to 32 bits without consuming them.
    ///
    /// Near the end of input fewer bits may be available; the second value
    /// is how many of the returned bits are real. Missing bits read as zero.
    #[inline]
    pub fn peek_bits(&mut self, count: u8) -> (u32, u8) {
        debug_assert!(count <= 32, "Cannot peek more than 32 bits at once");

        if self.bits_in_buffer < count {
            self.refill();
        }

        let mask = (1u64 << count).wrapping_sub(1);
        (
            (self.buffer & mask) as u32,
            count.min(self.bits_in_buffer),
        )
    }

    /// Discard `count` bits that were previously peeked.
    #[inline]
    pub fn consume(&mut self, count: u8) -> Result<()> {
        if self.bits_in_buffer < count {
            self.refill();
            if self.bits_in_buffer < count {
                return Err(ArchiveError::unexpected_eof(1));
            }
        }

        self.buffer >>= count;
        self.bits_in_buffer -= count;
        self.total_bits_read += count as u64;
        Ok(())
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Align to the next byte boundary by discarding partial bits.
    pub fn align_to_byte(&mut self) {
        let remainder = self.bits_in_buffer % 8;
        if remainder > 0 {
            self.buffer >>= remainder;
            self.bits_in_buffer -= remainder;
            self.total_bits_read += remainder as u64;
        }
    }

    /// Borrow `len` bytes starting at the next byte boundary.
    ///
    /// Partial bits are discarded first. The returned slice points into the
    /// original input, so stored blocks copy straight from it.
    pub fn read_aligned_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.align_to_byte();

        // Buffered bytes are exactly data[offset..pos].
        let offset = (self.total_bits_read / 8) as usize;
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| ArchiveError::unexpected_eof(len - (self.data.len() - offset).min(len)))?;

        self.buffer = 0;
        self.bits_in_buffer = 0;
        self.pos = end;
        self.total_bits_read += (len as u64) * 8;

        Ok(&self.data[offset..end])
    }
}

/// A bit-level writer that appends to an owned buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// Completed output bytes.
    output: Vec<u8>,
    /// Bit buffer (LSB-first).
    buffer: u64,
    /// Number of valid bits in buffer (always below 8 between calls).
    bits_in_buffer: u8,
}

impl BitWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty writer with room for `capacity` output bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Total number of bits written so far.
    pub fn bits_written(&self) -> u64 {
        self.output.len() as u64 * 8 + self.bits_in_buffer as u64
    }

    /// Write the low `count` bits of `value` (0-32), LSB first.
    #[inline]
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(count <= 32, "Cannot write more than 32 bits at once");

        let mask = (1u64 << count).wrapping_sub(1);
        self.buffer |= (value as u64 & mask) << self.bits_in_buffer;
        self.bits_in_buffer += count;

        while self.bits_in_buffer >= 8 {
            self.output.push(self.buffer as u8);
            self.buffer >>= 8;
            self.bits_in_buffer -= 8;
        }
    }

    /// Write a single bit.
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u32, 1);
    }

    /// Pad with zero bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        if self.bits_in_buffer > 0 {
            self.output.push(self.buffer as u8);
            self.buffer = 0;
            self.bits_in_buffer = 0;
        }
    }

    /// Align, then append raw bytes.
    pub fn write_bytes(&mut self, buf: &[u8]) {
        self.align_to_byte();
        self.output.extend_from_slice(buf);
    }

    /// Flush any partial byte and return the output.
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.output
    }
}
