//! tandem CLI - resolve wheels on top of a conda environment and inspect
//! lock snapshots.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod output;

use clap::Parser;
use commands::{Cli, Commands};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    output::init(cli.no_ansi);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            output::error(&format!("failed to create runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_command(&cli)) {
        Ok(code) => code,
        Err(e) => {
            output::report(e);
            ExitCode::FAILURE
        }
    }
}

async fn run_command(cli: &Cli) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Commands::Resolve(args) => {
            commands::resolve::run(args.clone(), cli.quiet).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Diff(args) => {
            commands::diff::run(args)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::List(args) => {
            commands::list::run(args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
