//! Compression scorer: how small a byte sequence gets at maximum effort.
//!
//! Each call compresses from scratch with the same settings, so the result
//! depends on the bytes alone.

use crate::config::MAX_EFFORT_LEVEL;
use tgzorder_archive::gzip;

/// Compressed size of `bytes` as a standalone GZIP member at level 9.
///
/// Empty input scores the size of an empty member.
pub fn score(bytes: &[u8]) -> usize {
    gzip::compress(bytes, MAX_EFFORT_LEVEL).len()
}

/// `score(bytes) / len(bytes)`, or `None` for empty input.
pub fn ratio(bytes: &[u8]) -> Option<f64> {
    if bytes.is_empty() {
        return None;
    }
    Some(score(bytes) as f64 / bytes.len() as f64)
}

/// Ratio of `tail` followed by `head`.
///
/// An empty concatenation has ratio 0.0.
pub fn joint_ratio(tail: &[u8], head: &[u8]) -> f64 {
    let mut joined = Vec::with_capacity(tail.len() + head.len());
    joined.extend_from_slice(tail);
    joined.extend_from_slice(head);
    ratio(&joined).unwrap_or(0.0)
}
