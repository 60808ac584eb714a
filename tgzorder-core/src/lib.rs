//! # tgzorder Core
//!
//! Core building blocks shared by the tgzorder codec crates:
//!
//! - [`bitstream`]: Bit-level I/O for Huffman-coded DEFLATE streams
//! - [`crc`]: CRC-32 for the gzip trailer
//! - [`error`]: The codec error type
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: Ordering                                            │
//! │     entry model, scorer, window chain, search, CLI     │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     TAR headers and GZIP members                       │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Deflate (LZ77+Huffman)                             │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     BitReader/BitWriter, CRC                           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tgzorder_core::bitstream::BitReader;
//! use tgzorder_core::crc::Crc32;
//!
//! let data = [0xAB, 0xCD];
//! let mut reader = BitReader::new(&data);
//! let bits = reader.read_bits(12).unwrap();
//! assert_eq!(bits, 0xDAB);
//!
//! let crc = Crc32::compute(b"Hello, World!");
//! assert_eq!(crc, 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod crc;
pub mod error;

// Re-exports
pub use bitstream::{BitReader, BitWriter};
pub use crc::Crc32;
pub use error::{ArchiveError, Result};
