//! Integrity validation of a reordered entry sequence.
//!
//! The input entries' fingerprints (captured at load) form a multiset keyed
//! by header digest, plus content digest for regular entries. Each candidate
//! entry is fingerprinted again from its current bytes and removed from that
//! multiset; a miss, a duplicate, or anything left over is an error.

use crate::entry::{Entry, Fingerprint, Sha256Digest};
use crate::error::{OptimizeError, Result};
use std::collections::HashMap;
use tgzorder_archive::{EntryKind, TarEntry};

type Key = (Sha256Digest, Option<Sha256Digest>);

fn key(kind: EntryKind, fingerprint: Fingerprint) -> Key {
    let content = (kind == EntryKind::Regular).then_some(fingerprint.content);
    (fingerprint.header, content)
}

/// Check that `candidates` carries exactly the entries of `original`.
///
/// Order is free; count, headers and regular content are not.
pub fn validate<'a, I>(original: &[Entry], candidates: I) -> Result<()>
where
    I: IntoIterator<Item = &'a TarEntry>,
{
    let mut remaining: HashMap<Key, usize> = HashMap::with_capacity(original.len());
    for entry in original {
        *remaining
            .entry(key(entry.kind(), entry.fingerprint()))
            .or_insert(0) += 1;
    }

    let mut seen = 0usize;
    for candidate in candidates {
        seen += 1;
        let fingerprint = Fingerprint::of(candidate)
            .map_err(|e| OptimizeError::integrity(candidate.name(), e.to_string()))?;
        let candidate_key = key(candidate.kind(), fingerprint);

        match remaining.get_mut(&candidate_key) {
            Some(count) if *count > 0 => *count -= 1,
            Some(_) => {
                return Err(OptimizeError::integrity(
                    candidate.name(),
                    "entry appears more often than in the input",
                ));
            }
            None => {
                let header_known = original
                    .iter()
                    .any(|e| e.fingerprint().header == fingerprint.header);
                let reason = if header_known {
                    "content does not match any input entry"
                } else {
                    "header does not match any input entry"
                };
                return Err(OptimizeError::integrity(candidate.name(), reason));
            }
        }
    }

    if seen != original.len() {
        let missing = original
            .iter()
            .find(|e| {
                remaining
                    .get(&key(e.kind(), e.fingerprint()))
                    .is_some_and(|&count| count > 0)
            })
            .map(|e| e.name().to_string())
            .unwrap_or_default();
        return Err(OptimizeError::integrity(
            missing,
            format!("output has {} entries, input has {}", seen, original.len()),
        ));
    }

    Ok(())
}
