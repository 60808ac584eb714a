//! Error types for optimization runs.

use std::time::Duration;
use tgzorder_core::ArchiveError;
use thiserror::Error;

/// Why an optimization run failed.
///
/// Every failure is fatal for the run; nothing here is retried or
/// downgraded.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The input archive is missing, unreadable or corrupt.
    #[error("Input error: {0}")]
    Input(#[source] ArchiveError),

    /// Exhaustive search requested for more entries than it can enumerate.
    #[error("Exhaustive search is limited to {limit} entries, archive has {entries}")]
    Capacity {
        /// Entries that would have to be permuted.
        entries: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The reordered archive does not carry exactly the input entries.
    #[error("Integrity check failed for '{name}': {reason}")]
    Integrity {
        /// Name of the offending entry.
        name: String,
        /// What did not match.
        reason: String,
    },

    /// The output archive could not be serialized, compressed or stored.
    #[error("Encoding error: {0}")]
    Encoding(#[source] ArchiveError),

    /// The exhaustive search ran past its time budget.
    #[error("Time budget of {budget:?} exhausted after {elapsed:?}")]
    BudgetExhausted {
        /// Time spent when the search gave up.
        elapsed: Duration,
        /// Configured budget.
        budget: Duration,
    },
}

/// Result type alias for optimization runs.
pub type Result<T> = std::result::Result<T, OptimizeError>;

impl OptimizeError {
    /// Create an input error.
    pub fn input(err: impl Into<ArchiveError>) -> Self {
        Self::Input(err.into())
    }

    /// Create an encoding error.
    pub fn encoding(err: impl Into<ArchiveError>) -> Self {
        Self::Encoding(err.into())
    }

    /// Create an integrity error.
    pub fn integrity(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Integrity {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a capacity error.
    pub fn capacity(entries: usize, limit: usize) -> Self {
        Self::Capacity { entries, limit }
    }
}
