//! Run configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Compressor history window, shared with the DEFLATE encoder.
pub const WINDOW_SIZE: usize = tgzorder_deflate::lz77::WINDOW_SIZE;

/// Size of the head and tail slices used for adjacency scoring.
pub const HALF_WINDOW: usize = WINDOW_SIZE / 2;

/// Compression level used for every size measurement.
pub const MAX_EFFORT_LEVEL: u8 = 9;

/// Default capacity of the exhaustive search.
pub const DEFAULT_MAX_EXHAUSTIVE_ENTRIES: usize = 10;

/// Which orderer a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Greedy window-aware chain, O(n²) scorer calls.
    #[default]
    Window,
    /// Every permutation measured end to end, O(n!) encodes.
    Exhaustive,
}

impl Mode {
    /// Get the mode name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Exhaustive => "exhaustive",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "window" | "greedy" => Ok(Self::Window),
            "exhaustive" | "brute" => Ok(Self::Exhaustive),
            other => Err(format!("unknown mode: {}", other)),
        }
    }
}

/// Options for one optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOptions {
    /// Orderer to use.
    pub mode: Mode,
    /// Largest entry count the exhaustive search accepts.
    pub max_exhaustive_entries: usize,
    /// Fan scoring and search out over the rayon pool.
    pub parallel: bool,
    /// Wall-clock limit for the exhaustive search.
    pub time_budget: Option<Duration>,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Window,
            max_exhaustive_entries: DEFAULT_MAX_EXHAUSTIVE_ENTRIES,
            parallel: true,
            time_budget: None,
        }
    }
}

impl OptimizeOptions {
    /// Options for `mode` with everything else at its default.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set the orderer.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the exhaustive search capacity.
    pub fn with_max_exhaustive_entries(mut self, limit: usize) -> Self {
        self.max_exhaustive_entries = limit;
        self
    }

    /// Enable or disable parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Bound the exhaustive search by wall-clock time.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_constants() {
        assert_eq!(WINDOW_SIZE, 32 * 1024);
        assert_eq!(HALF_WINDOW, 16 * 1024);
    }

    #[test]
    fn test_defaults() {
        let options = OptimizeOptions::default();
        assert_eq!(options.mode, Mode::Window);
        assert_eq!(options.max_exhaustive_entries, 10);
        assert!(options.parallel);
        assert!(options.time_budget.is_none());
    }

    #[test]
    fn test_builder() {
        let options = OptimizeOptions::new(Mode::Exhaustive)
            .with_max_exhaustive_entries(4)
            .with_parallel(false)
            .with_time_budget(Duration::from_secs(3));
        assert_eq!(options.mode, Mode::Exhaustive);
        assert_eq!(options.max_exhaustive_entries, 4);
        assert!(!options.parallel);
        assert_eq!(options.time_budget, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("window".parse::<Mode>().unwrap(), Mode::Window);
        assert_eq!("Brute".parse::<Mode>().unwrap(), Mode::Exhaustive);
        assert!("random".parse::<Mode>().is_err());
        assert_eq!(Mode::Exhaustive.to_string(), "exhaustive");
    }
}
