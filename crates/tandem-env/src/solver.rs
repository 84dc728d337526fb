//! Boundary to the conda solving service.
//!
//! The solver itself lives outside this workspace; callers plug it in through
//! [`PrimarySolver`]. Requests carry the already formatted channel list and
//! the packages of the previous snapshot so the solver can keep them stable.

use async_trait::async_trait;
use tandem_core::Error;
use tandem_lockfile::{CondaPackage, PackageHash};
use thiserror::Error;

/// A package the solver should treat as already installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledRef {
    /// Archive filename, the snapshot key.
    pub filename: String,
    /// Package name.
    pub name: String,
    /// Version.
    pub version: String,
    /// Build string.
    pub build: String,
}

impl InstalledRef {
    /// Describe a locked conda package.
    #[must_use]
    pub fn from_locked(filename: &str, package: &CondaPackage) -> Self {
        Self {
            filename: filename.to_string(),
            name: package.name.clone(),
            version: package.version.clone(),
            build: package.build.clone(),
        }
    }
}

/// Input of one conda solve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveRequest {
    /// Match specs, e.g. `numpy>=1.26` or `python=3.13`.
    pub specs: Vec<String>,
    /// Channel URLs, highest priority first.
    pub channels: Vec<String>,
    /// Subdirs to search, `noarch` first.
    pub platforms: Vec<String>,
    /// Packages from the previous snapshot.
    pub installed: Vec<InstalledRef>,
}

/// One record of a solved environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedRecord {
    /// Archive filename.
    pub filename: String,
    /// Package name.
    pub name: String,
    /// Version.
    pub version: String,
    /// Build string.
    pub build: String,
    /// Channel the record came from.
    pub channel: String,
    /// Channel subdir.
    pub subdir: String,
    /// Download URL.
    pub url: String,
    /// Archive hashes.
    pub hash: Option<PackageHash>,
    /// Archive size in bytes.
    pub size: Option<u64>,
}

impl SolvedRecord {
    /// Convert into the locked form, returning the snapshot key alongside.
    #[must_use]
    pub fn into_conda(self) -> (String, CondaPackage) {
        let package = CondaPackage {
            name: self.name,
            version: self.version,
            build: self.build,
            subdir: Some(self.subdir).filter(|s| !s.is_empty()),
            channel: Some(self.channel).filter(|c| !c.is_empty()),
            url: Some(self.url).filter(|u| !u.is_empty()),
            hash: self.hash,
            size: self.size,
        };
        (self.filename, package)
    }
}

/// Failure reported by the solving service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// The service could not be reached or timed out; the request may succeed
    /// when repeated.
    #[error("solver unavailable: {message}")]
    Transient {
        /// Error message.
        message: String,
    },

    /// The request cannot be satisfied.
    #[error("{message}")]
    Fatal {
        /// Error message, usually the solver's explanation of the conflict.
        message: String,
    },
}

impl SolverError {
    /// Create a transient error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Create a fatal error.
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    /// Whether repeating the request may help.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

impl From<SolverError> for Error {
    fn from(err: SolverError) -> Self {
        Self::resolution(err.to_string())
    }
}

/// The conda solving service.
#[async_trait]
pub trait PrimarySolver: Send + Sync {
    /// Solve `request` into the full set of records to install.
    async fn solve(&self, request: &SolveRequest) -> Result<Vec<SolvedRecord>, SolverError>;
}
