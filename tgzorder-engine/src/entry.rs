//! In-memory entry model.
//!
//! An [`Entry`] wraps one decoded archive entry together with everything the
//! orderers and the integrity check need, all computed once at load:
//!
//! ```text
//! content  |<------------------------ len ------------------------>|
//! head     |<--- HALF_WINDOW --->|
//! tail                                     |<--- HALF_WINDOW --->|
//! ```
//!
//! Entries shorter than [`HALF_WINDOW`] use the whole content for both
//! slices. Non-regular entries have empty slices.

use crate::config::HALF_WINDOW;
use sha2::{Digest, Sha256};
use std::ops::Range;
use tgzorder_archive::{EntryKind, TarEntry, TarHeader};
use tgzorder_core::error::Result;

/// SHA-256 output.
pub type Sha256Digest = [u8; 32];

/// Identity of an entry for integrity checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// Digest of the serialized header.
    pub header: Sha256Digest,
    /// Digest of the payload.
    pub content: Sha256Digest,
}

impl Fingerprint {
    /// Compute the fingerprint of an archive entry as it currently is.
    ///
    /// The header digest covers the exact bytes the writer emits for the
    /// header, including any PAX record it needs.
    pub fn of(entry: &TarEntry) -> Result<Self> {
        Ok(Self {
            header: sha256(&entry.header.to_bytes()?),
            content: sha256(&entry.data),
        })
    }
}

fn sha256(data: &[u8]) -> Sha256Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// One archive entry plus its window slices and digests.
#[derive(Debug, Clone)]
pub struct Entry {
    index: usize,
    inner: TarEntry,
    kind: EntryKind,
    head: Range<usize>,
    tail: Range<usize>,
    fingerprint: Fingerprint,
}

impl Entry {
    /// Build an entry from the `index`-th decoded archive entry.
    pub fn new(index: usize, inner: TarEntry) -> Result<Self> {
        let kind = inner.kind();
        let len = if kind == EntryKind::Regular {
            inner.data.len()
        } else {
            0
        };
        let fingerprint = Fingerprint::of(&inner)?;

        Ok(Self {
            index,
            kind,
            head: 0..len.min(HALF_WINDOW),
            tail: len.saturating_sub(HALF_WINDOW)..len,
            fingerprint,
            inner,
        })
    }

    /// Position in the input archive.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Entry path.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Entry kind.
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Whether this entry takes part in reordering.
    pub fn is_regular(&self) -> bool {
        self.kind == EntryKind::Regular
    }

    /// Link target, for symbolic links.
    pub fn link_target(&self) -> Option<&str> {
        match self.kind {
            EntryKind::Symlink => Some(&self.inner.header.linkname),
            _ => None,
        }
    }

    /// Content bytes; empty for non-regular entries.
    pub fn content(&self) -> &[u8] {
        match self.kind {
            EntryKind::Regular => &self.inner.data,
            _ => &[],
        }
    }

    /// First `HALF_WINDOW` bytes of the content.
    pub fn head_window(&self) -> &[u8] {
        &self.inner.data[self.head.clone()]
    }

    /// Last `HALF_WINDOW` bytes of the content.
    pub fn tail_window(&self) -> &[u8] {
        &self.inner.data[self.tail.clone()]
    }

    /// Digests captured at load.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Parsed header.
    pub fn header(&self) -> &TarHeader {
        &self.inner.header
    }

    /// The archive entry handed to the writer.
    pub fn tar_entry(&self) -> &TarEntry {
        &self.inner
    }
}

/// Wrap decoded entries, numbering them in input order.
pub fn load_entries(decoded: Vec<TarEntry>) -> Result<Vec<Entry>> {
    decoded
        .into_iter()
        .enumerate()
        .map(|(index, inner)| Entry::new(index, inner))
        .collect()
}
