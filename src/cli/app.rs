//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use super::convert_cmd;
use super::output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "notepack")]
#[command(author, version, about = "Normalize exported note archives for re-import")]
pub struct Cli {
    /// Path to the exported note archive (zip)
    pub archive: PathBuf,

    /// Output format
    #[arg(long, short = 'f', default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Fail the run when any reference cannot be resolved
    #[arg(long)]
    pub strict: bool,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("Notepack CLI starting");
    convert_cmd::run(&cli.archive, cli.strict, &output)?;
    output.verbose("Conversion completed successfully");

    Ok(())
}
