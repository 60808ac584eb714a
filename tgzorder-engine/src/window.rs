//! Greedy window chain builder.
//!
//! Builds an ordering one link at a time, using the compression scorer as a
//! proxy for how much the DEFLATE window can reuse across an entry boundary:
//!
//! ```text
//! start:   argmax  score(tail) / len(tail)
//! step:    argmin  score(tail(last) ++ head(c)) / len(tail(last) ++ head(c))
//!
//! order:   [ placed ........ | remaining ............... ]
//!                            ^ next slot; winner swapped in
//! ```
//!
//! Every step scores all remaining candidates against the same tail, so the
//! candidates are evaluated in parallel and reduced serially. Ties go to the
//! lowest input index, keeping the output independent of scheduling.

use crate::entry::Entry;
use crate::scorer;
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::debug;

/// Order `entries` into a chain of strongest adjacent compressibility.
///
/// `entries` is expected in input order; position in the slice is the
/// tie-break key. An empty slice yields an empty chain.
pub fn build_chain<'a>(entries: &[&'a Entry], parallel: bool) -> Vec<&'a Entry> {
    let n = entries.len();
    if n == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..n).collect();

    // Empty tails are excluded; if all are empty, the first entry starts.
    let tail_ratios = evaluate(&order, parallel, |i| scorer::ratio(entries[i].tail_window()));
    let start = tail_ratios
        .iter()
        .min_by(|a, b| b.ratio.total_cmp(&a.ratio).then(a.index.cmp(&b.index)))
        .map(|c| {
            debug!(entry = entries[c.index].name(), ratio = c.ratio, "chain start");
            c.slot
        })
        .unwrap_or(0);
    order.swap(0, start);

    for placed in 1..n {
        let tail = entries[order[placed - 1]].tail_window();
        let candidates = evaluate(&order[placed..], parallel, |i| {
            Some(scorer::joint_ratio(tail, entries[i].head_window()))
        });

        let Some(best) = candidates.iter().min_by(|a, b| by_ratio_then_index(a, b)) else {
            break;
        };
        order.swap(placed, placed + best.slot);

        debug!(
            step = placed,
            after = entries[order[placed - 1]].name(),
            entry = entries[best.index].name(),
            ratio = best.ratio,
            "chain link"
        );
    }

    order.into_iter().map(|i| entries[i]).collect()
}

/// A scored candidate.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    ratio: f64,
    /// Position in the input slice; the tie-break key.
    index: usize,
    /// Offset into the slice of indices that was evaluated.
    slot: usize,
}

fn by_ratio_then_index(a: &Candidate, b: &Candidate) -> Ordering {
    a.ratio.total_cmp(&b.ratio).then(a.index.cmp(&b.index))
}

/// Score each index, keeping a [`Candidate`] for those that have a ratio.
///
/// The result is in the order of `indices` whether or not it runs in
/// parallel.
fn evaluate<F>(indices: &[usize], parallel: bool, f: F) -> Vec<Candidate>
where
    F: Fn(usize) -> Option<f64> + Sync + Send,
{
    let score = |(slot, &index): (usize, &usize)| {
        f(index).map(|ratio| Candidate { ratio, index, slot })
    };
    if parallel {
        indices.par_iter().enumerate().filter_map(score).collect()
    } else {
        indices.iter().enumerate().filter_map(score).collect()
    }
}
