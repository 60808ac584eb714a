//! # tgzorder Engine
//!
//! Reorders the entries of a tar.gz archive so that similar content sits
//! within the compressor's 32 KiB window, then proves the result carries
//! exactly the input entries.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ optimizer: run / optimize                    │
//! ├──────────────────────┬───────────────────────┤
//! │ window (greedy)      │ exhaustive (n ≤ 10)   │
//! ├──────────────────────┼───────────────────────┤
//! │ scorer               │ ArchiveCodec          │
//! ├──────────────────────┴───────────────────────┤
//! │ entry (windows, digests) · integrity         │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Only regular files are reordered. Directories, links and other
//! structural entries keep their relative order and follow the regular
//! files.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tgzorder_engine::{Mode, run};
//!
//! let report = run(Path::new("in.tar.gz"), Path::new("out.tar.gz"), Mode::Window).unwrap();
//! println!("{} -> {} bytes", report.before_size_bytes, report.after_size_bytes);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod entry;
pub mod error;
pub mod exhaustive;
pub mod integrity;
pub mod optimizer;
pub mod permutation;
pub mod scorer;
pub mod window;

// Re-exports
pub use config::{HALF_WINDOW, Mode, OptimizeOptions, WINDOW_SIZE};
pub use entry::{Entry, Fingerprint};
pub use error::{OptimizeError, Result};
pub use optimizer::{OptimizeReport, Optimized, optimize, run, run_with_codec, run_with_options};
