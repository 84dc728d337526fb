//! List command implementation.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tandem_lockfile::{LockSnapshot, packages_list};

/// Arguments for the list command.
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Lock snapshot to list
    #[arg(value_name = "LOCK")]
    pub lock: PathBuf,
}

/// Run the list command.
pub fn run(args: &ListArgs) -> Result<()> {
    let snapshot = LockSnapshot::read(&args.lock).map_err(tandem_core::Error::from)?;
    if snapshot.is_empty() {
        crate::output::success("No packages locked.");
        return Ok(());
    }
    print!("{}", packages_list(&snapshot));
    Ok(())
}
