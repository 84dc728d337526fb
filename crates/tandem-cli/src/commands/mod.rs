//! CLI commands for tandem.

pub mod diff;
pub mod list;
pub mod resolve;

use clap::{Parser, Subcommand};

/// tandem - pip requirements on top of conda environments
///
/// Resolves wheels for a target runtime and platform while leaving every
/// package the conda solve provides to conda.
#[derive(Parser, Debug)]
#[command(name = "tandem")]
#[command(author = "Tandem Contributors")]
#[command(version)]
#[command(about = "Resolve pip requirements on top of conda environments", long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Only print errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_ansi: bool,

    /// Increase the verbosity of messages: -v for info, -vv for debug, -vvv for trace
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve pip requirements into a lock snapshot
    Resolve(resolve::ResolveArgs),

    /// Show what changed between two lock snapshots
    Diff(diff::DiffArgs),

    /// List the packages of a lock snapshot
    #[command(alias = "ls")]
    List(list::ListArgs),
}
