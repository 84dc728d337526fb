//! Environment orchestration for tandem.
//!
//! An environment is a set of conda packages produced by an external solver
//! plus the wheels resolved on top of them. This crate sequences the two:
//!
//! - [`solver`]: the conda solving service boundary
//! - [`retry`]: bounded retry of transient solver failures
//! - [`ops`]: create, install, remove, pip install and pip uninstall
//!
//! Operations are pure transformations of a [`tandem_lockfile::LockSnapshot`];
//! persisting the result and running the installer is left to the caller.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod ops;
pub mod retry;
pub mod solver;

pub use ops::{
    Ecosystem, Environment, EnvironmentSettings, EnvironmentSpec, InstallPlan, Outcome,
    PlannedPackage, install_plan,
};
pub use retry::{RetryConfig, solve_with_retry};
pub use solver::{InstalledRef, PrimarySolver, SolveRequest, SolvedRecord, SolverError};
