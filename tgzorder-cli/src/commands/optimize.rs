//! Optimize command implementation.

use crate::utils::{create_spinner, kib};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tgzorder_engine::{Mode, OptimizeOptions, OptimizeReport, run_with_options};
use tracing::debug;

/// JSON form of a finished run.
#[derive(Debug, Serialize)]
struct ReportJson<'a> {
    input: String,
    output: String,
    mode: &'static str,
    entry_count: usize,
    reordered_count: usize,
    input_file_bytes: u64,
    uncompressed_bytes: u64,
    before_size_bytes: u64,
    after_size_bytes: u64,
    before_ratio: f64,
    after_ratio: f64,
    saved_bytes: i64,
    order: &'a [String],
}

impl<'a> ReportJson<'a> {
    fn new(args: &OptimizeArgs, report: &'a OptimizeReport) -> Self {
        Self {
            input: args.input.display().to_string(),
            output: args.output.display().to_string(),
            mode: report.mode.name(),
            entry_count: report.entry_count,
            reordered_count: report.reordered_count,
            input_file_bytes: report.input_file_bytes,
            uncompressed_bytes: report.uncompressed_bytes,
            before_size_bytes: report.before_size_bytes,
            after_size_bytes: report.after_size_bytes,
            before_ratio: report.before_ratio,
            after_ratio: report.after_ratio,
            saved_bytes: report.saved_bytes(),
            order: &report.order,
        }
    }
}

/// Arguments for the optimize command.
pub struct OptimizeArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: Mode,
    pub max_entries: usize,
    pub time_budget: Option<f64>,
    pub jobs: Option<usize>,
    pub sequential: bool,
    pub json: bool,
    pub quiet: bool,
    pub verbose: u8,
}

pub fn cmd_optimize(args: &OptimizeArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()?;
        debug!(jobs, "configured worker pool");
    }

    let mut options = OptimizeOptions::new(args.mode)
        .with_max_exhaustive_entries(args.max_entries)
        .with_parallel(!args.sequential);
    if let Some(seconds) = args.time_budget {
        options = options.with_time_budget(Duration::try_from_secs_f64(seconds)?);
    }

    let spinner = create_spinner(
        &format!("Reordering {} ({} mode)", args.input.display(), args.mode),
        !args.quiet && !args.json,
    );
    let result = run_with_options(&args.input, &args.output, &options);
    spinner.finish_and_clear();
    let report = result?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ReportJson::new(args, &report))?
        );
        return Ok(());
    }
    if args.quiet {
        return Ok(());
    }

    println!(
        "Before: {} KB {:.2}%",
        kib(report.before_size_bytes),
        report.before_ratio * 100.0
    );
    println!(
        "After: {} KB {:.2}%",
        kib(report.after_size_bytes),
        report.after_ratio * 100.0
    );

    if args.verbose > 0 {
        println!();
        println!(
            "Entries: {} ({} reordered)",
            report.entry_count, report.reordered_count
        );
        println!("Saved: {} bytes", report.saved_bytes());
        println!();
        for (i, name) in report.order.iter().enumerate() {
            println!("{:>5}  {}", i + 1, name);
        }
    }

    Ok(())
}
