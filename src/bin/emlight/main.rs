//! Command-line front end for the fixture-extraction pipeline.

mod cli;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(
    name = "emlight",
    about = "Extract emergency-lighting fixtures from blueprint PDFs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect fixtures in a blueprint PDF and print a report.
    Detect(DetectArgs),
}

#[derive(clap::Args)]
struct DetectArgs {
    /// Blueprint PDF to process.
    file: PathBuf,

    /// Rasterization resolution in dots per inch.
    #[arg(long, default_value_t = 200.0, env = "EMLIGHT_DPI")]
    dpi: f32,

    /// Report output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    output: OutputFormat,

    /// Abort processing after this many milliseconds.
    #[arg(long, env = "EMLIGHT_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Cap on rayon worker threads.
    #[arg(long, env = "EMLIGHT_MAX_THREADS")]
    max_threads: Option<usize>,

    /// Skip lighting-schedule and general-notes extraction.
    #[arg(long)]
    no_schedule: bool,

    /// Write the first page with fixture boxes drawn on it to this PNG.
    #[arg(long)]
    annotate: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary.
    Pretty,
    /// Full report as JSON.
    Json,
    /// One line per fixture.
    Text,
}

fn main() -> ExitCode {
    emlight::utils::init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Detect(args) => cli::run_detect(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
