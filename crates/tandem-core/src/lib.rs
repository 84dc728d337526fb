//! Core types shared across tandem.
//!
//! This crate provides the vocabulary every other crate speaks:
//! - Coded errors with suggestions
//! - Target platform identifiers and runtime version triples
//! - Resolved package records and their origin
//! - Package name canonicalization

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
mod name;
mod package;
mod platform;

pub use error::{Error, ErrorCode, ErrorCodeSource, Result};
pub use name::{canonical_name, package_name_from_spec};
pub use package::{ArtifactRef, Origin, ResolvedPackage};
pub use platform::{Platform, RuntimeVersion};
