//! # tablespec command-line entry point
//!
//! ```bash
//! tablespec validate pipeline.json --tables tables.json
//! tablespec detect samples.json
//! tablespec extract model-output.txt
//! ```
//!
//! Results go to stdout, logs to stderr. Any validation error, unreadable input
//! or missing payload exits with a non-zero status.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // results are printed to stdout

mod cli;

use anyhow::Result;
use clap::Parser as _;
use tablespec::config::Settings;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let mut settings = Settings::load_or_default(cli.config.as_deref())?;
    if cli.verbose {
        settings.logging.level = "debug".to_owned();
    }
    if let Some(dir) = cli.log_dir {
        settings.logging.directory = Some(dir);
    }
    tablespec::logging::init(&settings.logging)?;

    cli::run_command(cli.command, &settings)
}
