//! # notebox CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use notebox_cli::envelope::{run_open, run_seal, OpenArgs, SealArgs};
use notebox_cli::keygen::{run_keygen, KeygenArgs};
use notebox_cli::preview::{run_preview, PreviewArgs};

/// notebox operator tooling.
#[derive(Parser, Debug)]
#[command(name = "notebox", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a master key (64 hex characters).
    Keygen(KeygenArgs),

    /// Encrypt a PDF into a stored-form envelope.
    Seal(SealArgs),

    /// Decrypt a stored-form envelope.
    Open(OpenArgs),

    /// Derive the public preview of a PDF.
    Preview(PreviewArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Keygen(args) => run_keygen(args),
        Commands::Seal(args) => run_seal(args),
        Commands::Open(args) => run_open(args),
        Commands::Preview(args) => run_preview(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
