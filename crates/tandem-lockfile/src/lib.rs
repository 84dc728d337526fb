//! Lock snapshots for tandem environments.
//!
//! A [`LockSnapshot`] records every conda and pip package of an environment,
//! keyed by artifact filename. This crate reads and writes snapshots,
//! reconciles two of them ([`diff`]) and renders package tables for humans.
//!
//! # Example
//!
//! ```rust,ignore
//! use tandem_lockfile::{LockSnapshot, environment_diff};
//!
//! let old = LockSnapshot::read("tandem-lock.json")?;
//! let new = LockSnapshot::read("tandem-lock.new.json")?;
//! print!("{}", environment_diff(&old, &new, true));
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod diff;
mod error;
mod render;
mod types;

pub use diff::{
    ChangeKind, EcosystemDiff, EntryView, LockEntry, PackageChange, SnapshotDiff, diff,
    diff_entries,
};
pub use error::{LockfileError, Result};
pub use render::{COLUMN_WIDTH, NOTHING_CHANGED, environment_diff, packages_list};
pub use types::{CondaPackage, LOCK_VERSION, LockSnapshot, PackageHash, PipPackage};
