//! Requirement resolution for the wheel ecosystem.
//!
//! This crate turns pip-style requirements into a concrete set of wheels for a
//! target Python runtime and platform:
//!
//! - [`version`]: version ordering and constraint evaluation
//! - [`wheel`] and [`tags`]: wheel filename parsing and tag compatibility
//! - [`selector`]: picking one artifact out of a release
//! - [`resolver`]: the transitive walk that arbitrates ownership against
//!   packages already provided by the conda solve
//!
//! Network access is abstracted behind [`PackageFetcher`], [`SourceFetcher`]
//! and [`MappingSource`] so the walk can be exercised without a registry.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod fetcher;
mod name_map;
mod requirement;
pub mod resolver;
pub mod selector;
mod state;
pub mod tags;
pub mod version;
pub mod wheel;

pub use error::ResolveError;
pub use fetcher::{
    Artifact, ArtifactKind, Candidate, FetchError, PackageFetcher, PackageReleases,
    SourceFetcher, SourceMetadata,
};
pub use name_map::{MappingSource, NameMapping};
pub use requirement::{RequirementSource, RequirementSpec, SourceReference, dependency_applies};
pub use resolver::{Resolution, Resolver, ResolverConfig, ResolverStats};
pub use selector::{Selection, select_artifact};
pub use state::{Note, NoteLevel, ResolutionState};
pub use version::{Constraint, ConstraintOptions, Version, compare, select_best};
pub use wheel::{WheelFilename, WheelFilenameError};
