//! The optimization run: load, order, validate, encode, verify, persist.
//!
//! ```text
//! input bytes ──decode──> entries ──split──> regular ──orderer──┐
//!                                        └──> structural ───────┤ (appended)
//!                                                               v
//!        output file <──persist── verify <──decode── encode <── validate
//! ```

use crate::config::{Mode, OptimizeOptions};
use crate::entry::{Entry, load_entries};
use crate::error::{OptimizeError, Result};
use crate::{exhaustive, integrity, window};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tgzorder_archive::{ArchiveCodec, TarEntry, TarGzCodec};
use tracing::{debug, info};

/// Sizes and ordering produced by one run.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeReport {
    /// Orderer used.
    pub mode: Mode,
    /// Entries in the archive.
    pub entry_count: usize,
    /// Regular entries that took part in reordering.
    pub reordered_count: usize,
    /// Size of the input as given.
    pub input_file_bytes: u64,
    /// Total regular content.
    pub uncompressed_bytes: u64,
    /// Input order re-encoded with the output encoder.
    pub before_size_bytes: u64,
    /// Output archive size.
    pub after_size_bytes: u64,
    /// `before_size_bytes / uncompressed_bytes`.
    pub before_ratio: f64,
    /// `after_size_bytes / uncompressed_bytes`.
    pub after_ratio: f64,
    /// Entry names in output order.
    pub order: Vec<String>,
}

impl OptimizeReport {
    /// Bytes saved relative to the re-encoded input order.
    pub fn saved_bytes(&self) -> i64 {
        self.before_size_bytes as i64 - self.after_size_bytes as i64
    }
}

/// An optimized archive held in memory.
#[derive(Debug, Clone)]
pub struct Optimized {
    /// Encoded output archive.
    pub archive: Vec<u8>,
    /// What the run did.
    pub report: OptimizeReport,
}

fn ratio(compressed: u64, uncompressed: u64) -> f64 {
    if uncompressed == 0 {
        0.0
    } else {
        compressed as f64 / uncompressed as f64
    }
}

/// Reorder the archive at `input` and write the result to `output`.
///
/// Uses the default tar.gz codec and options for `mode`.
pub fn run(input: &Path, output: &Path, mode: Mode) -> Result<OptimizeReport> {
    run_with_options(input, output, &OptimizeOptions::new(mode))
}

/// [`run`] with explicit options.
pub fn run_with_options(
    input: &Path,
    output: &Path,
    options: &OptimizeOptions,
) -> Result<OptimizeReport> {
    run_with_codec(input, output, options, &TarGzCodec::default())
}

/// [`run`] with explicit options and archive codec.
///
/// Nothing is written to `output` unless every step succeeds; the file is
/// replaced atomically.
pub fn run_with_codec<C>(
    input: &Path,
    output: &Path,
    options: &OptimizeOptions,
    codec: &C,
) -> Result<OptimizeReport>
where
    C: ArchiveCodec + ?Sized,
{
    let data = std::fs::read(input).map_err(OptimizeError::input)?;
    info!(input = %input.display(), bytes = data.len(), "read archive");

    let Optimized { archive, report } = optimize(&data, options, codec)?;
    persist(output, &archive)?;
    info!(
        output = %output.display(),
        before = report.before_size_bytes,
        after = report.after_size_bytes,
        "wrote archive"
    );
    Ok(report)
}

/// Reorder an in-memory archive.
pub fn optimize<C>(data: &[u8], options: &OptimizeOptions, codec: &C) -> Result<Optimized>
where
    C: ArchiveCodec + ?Sized,
{
    let started = Instant::now();
    let decoded = codec.decode(data).map_err(OptimizeError::Input)?;
    let entries = load_entries(decoded).map_err(OptimizeError::Input)?;

    let (regular, structural): (Vec<&Entry>, Vec<&Entry>) =
        entries.iter().partition(|e| e.is_regular());
    let uncompressed_bytes: u64 = regular.iter().map(|e| e.content().len() as u64).sum();
    info!(
        entries = entries.len(),
        regular = regular.len(),
        uncompressed_bytes,
        mode = %options.mode,
        "loaded entries"
    );

    let original: Vec<&TarEntry> = entries.iter().map(|e| e.tar_entry()).collect();
    let before_size_bytes = codec
        .encode(&original)
        .map_err(OptimizeError::Encoding)?
        .len() as u64;

    let mut ordered = match options.mode {
        Mode::Window => window::build_chain(&regular, options.parallel),
        Mode::Exhaustive => exhaustive::search(&regular, &structural, codec, options)?.order,
    };
    ordered.extend(structural.iter().copied());
    debug!(elapsed = ?started.elapsed(), "ordering chosen");

    integrity::validate(&entries, ordered.iter().map(|e| e.tar_entry()))?;

    let sequence: Vec<&TarEntry> = ordered.iter().map(|e| e.tar_entry()).collect();
    let archive = codec.encode(&sequence).map_err(OptimizeError::Encoding)?;

    // Check the bytes that will be written, not just the in-memory order.
    let reread = codec.decode(&archive).map_err(OptimizeError::Encoding)?;
    integrity::validate(&entries, &reread)?;

    let after_size_bytes = archive.len() as u64;
    let report = OptimizeReport {
        mode: options.mode,
        entry_count: entries.len(),
        reordered_count: regular.len(),
        input_file_bytes: data.len() as u64,
        uncompressed_bytes,
        before_size_bytes,
        after_size_bytes,
        before_ratio: ratio(before_size_bytes, uncompressed_bytes),
        after_ratio: ratio(after_size_bytes, uncompressed_bytes),
        order: ordered.iter().map(|e| e.name().to_string()).collect(),
    };
    info!(
        before = before_size_bytes,
        after = after_size_bytes,
        elapsed = ?started.elapsed(),
        "optimization finished"
    );

    Ok(Optimized { archive, report })
}

/// Write `bytes` to a temporary file beside `output`, then rename it over.
fn persist(output: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(OptimizeError::encoding)?;
    file.write_all(bytes).map_err(OptimizeError::encoding)?;
    file.as_file().sync_all().map_err(OptimizeError::encoding)?;
    file.persist(output)
        .map_err(|e| OptimizeError::encoding(e.error))?;
    Ok(())
}
