//! The tar.gz loader/writer boundary.
//!
//! [`ArchiveCodec`] turns compressed archive bytes into entries and back.
//! [`TarGzCodec`] is the production implementation; callers that only need
//! an objective (or want to inject faults) can provide their own.

use crate::gzip;
use crate::tar::{TarEntry, TarReader, TarWriter};
use tgzorder_core::error::Result;
use tracing::debug;

/// Compression level used by [`TarGzCodec::default`].
pub const BEST_COMPRESSION: u8 = 9;

/// Decodes and encodes a whole archive held in memory.
pub trait ArchiveCodec: Send + Sync {
    /// Decode compressed archive bytes into entries in stored order.
    fn decode(&self, data: &[u8]) -> Result<Vec<TarEntry>>;

    /// Serialize `entries` in the given order and compress the result.
    fn encode(&self, entries: &[&TarEntry]) -> Result<Vec<u8>>;
}

/// TAR inside a single GZIP member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TarGzCodec {
    level: u8,
}

impl Default for TarGzCodec {
    fn default() -> Self {
        Self::new(BEST_COMPRESSION)
    }
}

impl TarGzCodec {
    /// Create a codec compressing at `level` (clamped to 0-9).
    pub fn new(level: u8) -> Self {
        Self {
            level: level.min(9),
        }
    }

    /// Compression level.
    pub fn level(&self) -> u8 {
        self.level
    }
}

impl ArchiveCodec for TarGzCodec {
    fn decode(&self, data: &[u8]) -> Result<Vec<TarEntry>> {
        let tar = gzip::decompress(data)?;
        let entries = TarReader::new(&tar).entries()?;
        debug!(
            compressed = data.len(),
            tar_bytes = tar.len(),
            entries = entries.len(),
            "decoded tar.gz"
        );
        Ok(entries)
    }

    fn encode(&self, entries: &[&TarEntry]) -> Result<Vec<u8>> {
        let mut writer = TarWriter::new(Vec::new());
        for entry in entries {
            writer.append(entry)?;
        }
        let tar = writer.into_inner()?;
        Ok(gzip::compress(&tar, self.level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tar::TarHeader;

    #[test]
    fn test_encode_is_deterministic() {
        let a = TarEntry::new(TarHeader::new_file("a.txt", 0, 0o644), b"alpha".repeat(20));
        let b = TarEntry::new(TarHeader::new_file("b.txt", 0, 0o644), b"beta".repeat(20));
        let codec = TarGzCodec::default();

        let first = codec.encode(&[&a, &b]).unwrap();
        assert_eq!(codec.encode(&[&a, &b]).unwrap(), first);
        assert_eq!(codec.decode(&first).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_level_is_clamped() {
        assert_eq!(TarGzCodec::new(42).level(), 9);
        assert_eq!(TarGzCodec::default().level(), BEST_COMPRESSION);
    }
}
