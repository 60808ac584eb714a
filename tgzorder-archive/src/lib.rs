//! # tgzorder Archive
//!
//! The containers around the ordering engine: TAR entries inside a GZIP
//! stream.
//!
//! - **TAR**: ustar/v7 headers, PAX extended headers, GNU long names
//! - **GZIP**: RFC 1952 members over the crate's own DEFLATE codec
//! - **Codec**: [`ArchiveCodec`], the whole-archive decode/encode boundary
//!
//! ## Example
//!
//! ```rust
//! use tgzorder_archive::{ArchiveCodec, TarEntry, TarGzCodec, TarHeader};
//!
//! let entry = TarEntry::new(TarHeader::new_file("hello.txt", 0, 0o644), b"hi".to_vec());
//! let codec = TarGzCodec::default();
//!
//! let bytes = codec.encode(&[&entry]).unwrap();
//! let entries = codec.decode(&bytes).unwrap();
//! assert_eq!(entries[0].name(), "hello.txt");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod gzip;
pub mod tar;

// Re-exports
pub use codec::{ArchiveCodec, TarGzCodec};
pub use gzip::GzipHeader;
pub use tar::{EntryKind, TarEntry, TarHeader, TarReader, TarWriter};
