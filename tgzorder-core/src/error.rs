//! Error types for archive codec operations.
//!
//! A single error type covers every failure that can occur while decoding or
//! encoding a tar.gz stream: I/O errors, container validation errors, and
//! DEFLATE bitstream errors.

use std::io;
use thiserror::Error;

/// The error type for archive decoding and encoding.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// I/O error from an underlying reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic number in a container header.
    #[error("Invalid magic number: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual magic bytes found.
        found: Vec<u8>,
    },

    /// Unsupported compression method or block type.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The compression method identifier.
        method: String,
    },

    /// CRC checksum mismatch.
    #[error("CRC mismatch: expected {expected:#x}, computed {computed:#x}")]
    CrcMismatch {
        /// Expected CRC value from the stream.
        expected: u32,
        /// Computed CRC value from the data.
        computed: u32,
    },

    /// Invalid Huffman code encountered during decompression.
    #[error("Invalid Huffman code at bit position {bit_position}")]
    InvalidHuffmanCode {
        /// Bit position where the invalid code was found.
        bit_position: u64,
    },

    /// Corrupted data.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Byte offset where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Invalid header format.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: expected {expected} more bytes")]
    UnexpectedEof {
        /// Number of bytes that were expected but not available.
        expected: usize,
    },

    /// Invalid distance in an LZ77 back-reference.
    #[error("Invalid back-reference distance: {distance} exceeds history size {history_size}")]
    InvalidDistance {
        /// The invalid distance value.
        distance: usize,
        /// Number of bytes decoded so far.
        history_size: usize,
    },

    /// A header field value does not fit its on-disk representation.
    #[error("Field '{field}' cannot represent value {value}")]
    FieldOverflow {
        /// Name of the header field.
        field: &'static str,
        /// The value that did not fit.
        value: u64,
    },
}

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

impl ArchiveError {
    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
        }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(expected: u32, computed: u32) -> Self {
        Self::CrcMismatch { expected, computed }
    }

    /// Create an invalid Huffman code error.
    pub fn invalid_huffman(bit_position: u64) -> Self {
        Self::InvalidHuffmanCode { bit_position }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(expected: usize) -> Self {
        Self::UnexpectedEof { expected }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, history_size: usize) -> Self {
        Self::InvalidDistance {
            distance,
            history_size,
        }
    }

    /// Create a field overflow error.
    pub fn field_overflow(field: &'static str, value: u64) -> Self {
        Self::FieldOverflow { field, value }
    }

    /// Returns true if the error means the input ended too early.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ArchiveError::invalid_magic([0x1f, 0x8b], [0x50, 0x4b]);
        assert!(err.to_string().contains("Invalid magic"));

        let err = ArchiveError::crc_mismatch(0x12345678, 0x87654321);
        assert!(err.to_string().contains("0x12345678"));

        let err = ArchiveError::field_overflow("size", 1 << 40);
        assert!(err.to_string().contains("size"));
    }

    #[test]
    fn test_truncation() {
        assert!(ArchiveError::unexpected_eof(4).is_truncation());
        assert!(!ArchiveError::invalid_header("bad").is_truncation());
    }

    #[test]
    fn test_io_conversion() {
        let io = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: ArchiveError = io.into();
        assert!(matches!(err, ArchiveError::Io(_)));
    }
}
