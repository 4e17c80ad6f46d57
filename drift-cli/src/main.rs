//! Drift: pull a remote tree into a local directory.
//!
//! # Usage
//!
//! ```text
//! drift init <root> --remote <dir> [--jobs N]
//! drift pull [PATH] [--plan FILE] [--no-prompt] [--dry-run] [-j N]
//! drift status
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{init::InitArgs, pull::PullArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "drift",
    version,
    about = "Apply remote changes to a local directory tree",
    long_about = None,
)]
struct Cli {
    /// Log engine activity to stderr (`RUST_LOG` takes precedence).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bind a local root directory to a remote store.
    Init(InitArgs),

    /// Apply the pending change list under a path.
    Pull(PullArgs),

    /// Show the context that governs the current directory.
    Status(StatusArgs),
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Pull(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
