//! GZIP format support (RFC 1952).
//!
//! The encoder writes a single member with a fixed, deterministic header
//! (no timestamp, no name). The decoder accepts any conforming stream,
//! including optional header fields and concatenated members.
//!
//! ## Example
//!
//! ```rust
//! use tgzorder_archive::gzip;
//!
//! let data = b"Hello, World!";
//! let compressed = gzip::compress(data, 9);
//!
//! let decompressed = gzip::decompress(&compressed).unwrap();
//! assert_eq!(decompressed, data);
//! ```

mod header;

pub use header::{
    CM_DEFLATE, GZIP_MAGIC, GzipHeader, OS_UNKNOWN, compress, decompress, decompress_member, flags,
};
