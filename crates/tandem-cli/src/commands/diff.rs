//! Diff command implementation.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tandem_env::{Ecosystem, install_plan};
use tandem_lockfile::{LockSnapshot, diff, environment_diff};

/// Arguments for the diff command.
#[derive(Args, Debug, Clone)]
pub struct DiffArgs {
    /// Previous lock snapshot
    #[arg(value_name = "OLD")]
    pub old: PathBuf,

    /// New lock snapshot
    #[arg(value_name = "NEW")]
    pub new: PathBuf,

    /// Print the installer steps instead of the table
    #[arg(long)]
    pub plan: bool,
}

/// Run the diff command.
pub fn run(args: &DiffArgs) -> Result<()> {
    let old = LockSnapshot::read(&args.old).map_err(tandem_core::Error::from)?;
    let new = LockSnapshot::read(&args.new).map_err(tandem_core::Error::from)?;

    if !args.plan {
        print!(
            "{}",
            environment_diff(&old, &new, crate::output::colors_enabled())
        );
        return Ok(());
    }

    let plan = install_plan(&old, &new);
    let label = |ecosystem: Ecosystem| match ecosystem {
        Ecosystem::Conda => "conda",
        Ecosystem::Pip => "pip",
    };
    for step in &plan.remove {
        println!("remove  {:<6}{}", label(step.ecosystem), step.filename);
    }
    for step in &plan.install {
        println!("install {:<6}{}", label(step.ecosystem), step.filename);
    }
    tracing::info!(summary = %diff(&old, &new).summary(), "diff computed");
    Ok(())
}
