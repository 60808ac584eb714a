//! Exhaustive search over every ordering of a small entry set.
//!
//! Each permutation is serialized and compressed through the real archive
//! codec, so the objective is the final archive size itself. The search
//! space is split by first element:
//!
//! ```text
//! partition 0:  [0, 1, 2, ...] .. [0, n-1, ..., 1]
//! partition 1:  [1, 0, 2, ...] .. [1, n-1, ..., 0]
//! ...
//! ```
//!
//! Each partition walks its permutations lexicographically and keeps a local
//! best; the partitions are then merged in order. The merge keeps the first
//! minimum, which is the lexicographically earliest optimal permutation.

use crate::config::OptimizeOptions;
use crate::entry::Entry;
use crate::error::{OptimizeError, Result};
use crate::permutation::{factorial, next_permutation};
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tgzorder_archive::{ArchiveCodec, TarEntry};
use tracing::{debug, info};

/// Outcome of an exhaustive search.
#[derive(Debug, Clone)]
pub struct SearchResult<'a> {
    /// Optimal ordering of the permuted entries.
    pub order: Vec<&'a Entry>,
    /// Encoded archive size for that ordering.
    pub compressed_size: usize,
    /// Number of permutations measured.
    pub evaluated: u64,
}

/// Local optimum of one partition.
struct Candidate {
    size: usize,
    perm: Vec<usize>,
    evaluated: u64,
}

struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    fn check(&self) -> Result<()> {
        let elapsed = self.started.elapsed();
        if elapsed >= self.budget {
            return Err(OptimizeError::BudgetExhausted {
                elapsed,
                budget: self.budget,
            });
        }
        Ok(())
    }
}

/// Find the ordering of `entries` with the smallest encoded archive.
///
/// `trailing` entries follow every permutation unchanged. Fails with
/// [`OptimizeError::Capacity`] before doing any work when `entries` exceeds
/// `options.max_exhaustive_entries`.
pub fn search<'a, C>(
    entries: &[&'a Entry],
    trailing: &[&Entry],
    codec: &C,
    options: &OptimizeOptions,
) -> Result<SearchResult<'a>>
where
    C: ArchiveCodec + ?Sized,
{
    let n = entries.len();
    if n > options.max_exhaustive_entries {
        return Err(OptimizeError::capacity(n, options.max_exhaustive_entries));
    }

    let deadline = options.time_budget.map(|budget| Deadline {
        started: Instant::now(),
        budget,
    });
    info!(
        entries = n,
        permutations = factorial(n),
        parallel = options.parallel,
        "exhaustive search"
    );

    let explore = |first: usize| explore_partition(first, entries, trailing, codec, deadline.as_ref());
    let partitions: Vec<Result<Candidate>> = if options.parallel {
        (0..n).into_par_iter().map(explore).collect()
    } else {
        (0..n).map(explore).collect()
    };

    let mut best: Option<Candidate> = None;
    let mut evaluated = 0u64;
    for partition in partitions {
        let candidate = partition?;
        evaluated += candidate.evaluated;
        if best.as_ref().is_none_or(|b| candidate.size < b.size) {
            best = Some(candidate);
        }
    }

    let Some(best) = best else {
        // Nothing to permute; the only ordering is the empty one.
        let size = measure(&[], entries, trailing, codec)?;
        return Ok(SearchResult {
            order: Vec::new(),
            compressed_size: size,
            evaluated: 1,
        });
    };
    info!(evaluated, compressed_size = best.size, "exhaustive search finished");

    Ok(SearchResult {
        order: best.perm.iter().map(|&i| entries[i]).collect(),
        compressed_size: best.size,
        evaluated,
    })
}

/// Walk every permutation starting with `first`.
fn explore_partition<C>(
    first: usize,
    entries: &[&Entry],
    trailing: &[&Entry],
    codec: &C,
    deadline: Option<&Deadline>,
) -> Result<Candidate>
where
    C: ArchiveCodec + ?Sized,
{
    let mut perm: Vec<usize> = std::iter::once(first)
        .chain((0..entries.len()).filter(|&i| i != first))
        .collect();
    let mut best: Option<(usize, Vec<usize>)> = None;
    let mut evaluated = 0u64;

    loop {
        if let Some(deadline) = deadline {
            deadline.check()?;
        }

        let size = measure(&perm, entries, trailing, codec)?;
        evaluated += 1;
        if best.as_ref().is_none_or(|(s, _)| size < *s) {
            best = Some((size, perm.clone()));
        }

        if !next_permutation(&mut perm[1..]) {
            break;
        }
    }

    let (size, perm) = best.unwrap_or_default();
    debug!(
        first = entries[first].name(),
        evaluated, size, "partition finished"
    );
    Ok(Candidate {
        size,
        perm,
        evaluated,
    })
}

/// Encoded size of `perm` followed by `trailing`.
fn measure<C>(perm: &[usize], entries: &[&Entry], trailing: &[&Entry], codec: &C) -> Result<usize>
where
    C: ArchiveCodec + ?Sized,
{
    let sequence: Vec<&TarEntry> = perm
        .iter()
        .map(|&i| entries[i].tar_entry())
        .chain(trailing.iter().map(|e| e.tar_entry()))
        .collect();
    let encoded = codec.encode(&sequence).map_err(OptimizeError::encoding)?;
    Ok(encoded.len())
}
