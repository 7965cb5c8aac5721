//! mmdr CLI - batch-render Mermaid diagrams.
//!
//! Provides commands for:
//! - `render`: Render every `.mmd` file in a directory to `.png`

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::RenderArgs;
use error::CliError;
use output::Output;

/// mmdr - Mermaid batch renderer.
#[derive(Parser)]
#[command(name = "mmdr", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render all Mermaid files in a directory.
    Render(RenderArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => run_async(args.execute()),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Drive a command on a single-threaded runtime.
///
/// Render tasks interleave on this one thread; the heavy lifting happens in
/// renderer subprocesses or on the blocking pool.
fn run_async(
    command: impl std::future::Future<Output = Result<(), CliError>>,
) -> Result<(), CliError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(command)
}
