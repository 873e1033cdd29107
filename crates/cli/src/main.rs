//! Trace-driven microarchitecture simulator CLI.
//!
//! This binary runs one instruction trace through the simulator. It performs:
//! 1. **Configuration:** Built-in reference machine, or a JSON file overriding any subset of it.
//! 2. **Run:** Streams a JSON-lines trace through the branch unit and cache hierarchy.
//! 3. **Report:** Prints the statistics as text, or as JSON with `--json`.
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `warn`).

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use uarchsim_core::sim::JsonLinesTrace;
use uarchsim_core::{Config, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "uarchsim",
    author,
    version,
    about = "Trace-driven BTB, branch predictor, cache and prefetcher simulator",
    long_about = "Replay a recorded instruction trace through a BTB, a branch direction predictor and an L1/L2 cache hierarchy with an L2 prefetcher, and report cycle and hit/miss statistics.\n\nExamples:\n  uarchsim run --trace traces/qsort.jsonl\n  uarchsim run --trace traces/qsort.jsonl --config configs/stride.json --json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a trace to completion and print statistics.
    Run {
        /// JSON-lines instruction trace.
        #[arg(short, long)]
        trace: PathBuf,

        /// JSON configuration overriding the reference machine.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print statistics as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            trace,
            config,
            json,
        } => cmd_run(&trace, config.as_deref(), json),
    }
}

/// Loads the configuration and trace, runs the simulation, and prints the
/// statistics. Exits with status 1 on any error.
fn cmd_run(trace_path: &std::path::Path, config_path: Option<&std::path::Path>, json: bool) {
    let config = match config_path {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            fail(&format!("config {}: {e}", path.display()), &e);
        }),
        None => Config::default(),
    };

    let mut trace = JsonLinesTrace::open(trace_path).unwrap_or_else(|e| {
        fail(&format!("trace {}: {e}", trace_path.display()), &e);
    });

    let mut sim = Simulator::new(&config).unwrap_or_else(|e| fail(&format!("{e}"), &e));

    tracing::info!(trace = %trace_path.display(), "simulation started");
    let stats = match sim.run(&mut trace) {
        Ok(stats) => stats,
        Err(e) => {
            tracing::warn!(line = trace.line(), "trace stopped the run");
            fail(&format!("{e}"), &e);
        }
    };
    tracing::info!(cycles = stats.cycles(), "simulation finished");

    if json {
        match serde_json::to_string_pretty(&stats) {
            Ok(text) => println!("{text}"),
            Err(e) => fail(&format!("{e}"), &e),
        }
    } else {
        stats.print();
    }
}

/// Prints `message` and the error's source chain, then exits with status 1.
fn fail(message: &str, error: &dyn std::error::Error) -> ! {
    eprintln!("Error: {message}");
    let mut source = error.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
    process::exit(1);
}
