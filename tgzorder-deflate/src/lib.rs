//! # tgzorder Deflate
//!
//! Pure Rust implementation of DEFLATE (RFC 1951), the codec inside gzip.
//!
//! ## Features
//!
//! - **Decompression**: stored, fixed Huffman and dynamic Huffman blocks,
//!   with strict validation of code tables and back-references
//! - **Compression**: LZ77 with hash chains and lazy matching, followed by
//!   a per-block choice of the cheapest block type
//!
//! The encoder is deterministic: the same input and level always produce
//! the same bytes, which makes compressed length usable as a score.
//!
//! ## Example
//!
//! ```rust
//! use tgzorder_deflate::{deflate, inflate};
//!
//! let original = b"Hello, World! Hello, World!";
//! let compressed = deflate(original, 9);
//!
//! let decompressed = inflate(&compressed).unwrap();
//! assert_eq!(&decompressed, original);
//! ```
//!
//! ## Compression Levels
//!
//! - Level 0: No compression (stored blocks)
//! - Level 1-3: Fast compression
//! - Level 4-6: Balanced (default is 6)
//! - Level 7-9: Best compression (slower)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod deflate;
pub mod huffman;
pub mod inflate;
pub mod lz77;
pub mod tables;

// Re-exports
pub use deflate::{Deflater, deflate};
pub use huffman::{HuffmanBuilder, HuffmanDecoder};
pub use inflate::{Inflater, inflate, inflate_prefix};
pub use lz77::{Lz77Encoder, Lz77Token};
