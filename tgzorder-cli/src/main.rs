//! tgzorder CLI - reorder tar.gz entries for smaller archives
//!
//! Rewrites a tar.gz with its regular files in an order that lets the
//! compressor reuse similar content, and checks that every entry survives.

mod commands;
mod utils;

use clap::{ArgAction, Parser, Subcommand};
use commands::{ListOptions, OptimizeArgs, cmd_list, cmd_optimize};
use std::path::PathBuf;
use tgzorder_engine::Mode;
use tgzorder_engine::config::DEFAULT_MAX_EXHAUSTIVE_ENTRIES;
use utils::init_logging;

#[derive(Parser)]
#[command(name = "tgzorder")]
#[command(author, version, about = "Reorder tar.gz entries for better compression")]
#[command(long_about = "
tgzorder rewrites a tar.gz archive with its regular files reordered so that
similar files sit inside the same 32 KiB compression window. Contents, headers
and structural entries are preserved and verified before the output is written.

Examples:
  tgzorder optimize release.tar.gz release.opt.tar.gz
  tgzorder optimize --brute small.tar.gz small.opt.tar.gz
  tgzorder optimize -v --jobs 4 data.tgz data.opt.tgz
  tgzorder list release.opt.tar.gz
")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reorder an archive's entries and write the result
    #[command(alias = "o")]
    Optimize {
        /// Input tar.gz archive
        input: PathBuf,

        /// Output tar.gz archive
        output: PathBuf,

        /// Try every ordering (exact, limited to small archives)
        #[arg(short, long, conflicts_with = "window")]
        brute: bool,

        /// Greedy window-aware ordering (default)
        #[arg(short, long)]
        window: bool,

        /// Largest number of files the brute-force search accepts
        #[arg(long, default_value_t = DEFAULT_MAX_EXHAUSTIVE_ENTRIES)]
        max_entries: usize,

        /// Give up the brute-force search after this many seconds
        #[arg(long, value_name = "SECONDS")]
        time_budget: Option<f64>,

        /// Worker threads (defaults to one per core)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Evaluate candidates on the current thread only
        #[arg(long)]
        sequential: bool,

        /// Output the report as JSON (machine-readable)
        #[arg(long)]
        json: bool,
    },

    /// List the entries of a tar.gz in stored order
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Show sizes, kinds and modes
        #[arg(short = 'l', long)]
        long: bool,

        /// Include only entries matching pattern (glob syntax: *.txt, src/**/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Optimize {
            input,
            output,
            brute,
            window: _,
            max_entries,
            time_budget,
            jobs,
            sequential,
            json,
        } => cmd_optimize(&OptimizeArgs {
            input,
            output,
            mode: if brute { Mode::Exhaustive } else { Mode::Window },
            max_entries,
            time_budget,
            jobs,
            sequential,
            json,
            quiet: cli.quiet,
            verbose: cli.verbose,
        }),
        Commands::List {
            archive,
            json,
            long,
            include,
            exclude,
        } => cmd_list(
            &archive,
            &ListOptions {
                verbose: long || cli.verbose > 0,
                json,
                include: &include,
                exclude: &exclude,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
