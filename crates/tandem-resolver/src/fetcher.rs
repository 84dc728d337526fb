//! Metadata retrieval abstraction.
//!
//! The resolver never talks to the network itself; registry and source-control
//! clients implement these traits.

use crate::requirement::SourceReference;
use crate::wheel::WheelFilename;
use async_trait::async_trait;
use thiserror::Error;

/// Kind of a downloadable artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Built distribution (`.whl`).
    Wheel,
    /// Source distribution (`.tar.gz`, `.zip`).
    Sdist,
}

/// One downloadable file of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name.
    pub filename: String,
    /// Download URL.
    pub url: String,
    /// Kind, inferred from the filename.
    pub kind: ArtifactKind,
    /// Size in bytes.
    pub size: Option<u64>,
    /// SHA-256 hex digest.
    pub sha256: Option<String>,
    /// Parsed wheel tags, when the file is a well-formed wheel.
    pub wheel: Option<WheelFilename>,
}

impl Artifact {
    /// Describe an artifact, inferring its kind from the filename.
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        url: impl Into<String>,
        size: Option<u64>,
        sha256: Option<String>,
    ) -> Self {
        let filename = filename.into();
        let wheel = filename.parse::<WheelFilename>().ok();
        let kind = if filename.ends_with(".whl") {
            ArtifactKind::Wheel
        } else {
            ArtifactKind::Sdist
        };
        Self {
            filename,
            url: url.into(),
            kind,
            size,
            sha256,
            wheel,
        }
    }

    /// Whether this is a source distribution.
    #[must_use]
    pub fn is_sdist(&self) -> bool {
        self.kind == ArtifactKind::Sdist
    }
}

/// One published version and its files, in registry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Version string as published.
    pub version: String,
    /// Files for that version.
    pub artifacts: Vec<Artifact>,
}

impl Candidate {
    /// Create a candidate.
    #[must_use]
    pub fn new(version: impl Into<String>, artifacts: Vec<Artifact>) -> Self {
        Self {
            version: version.into(),
            artifacts,
        }
    }
}

/// Everything a registry knows about a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReleases {
    /// Package name as published.
    pub name: String,
    /// Published versions.
    pub candidates: Vec<Candidate>,
}

impl PackageReleases {
    /// Look up a candidate by version string.
    #[must_use]
    pub fn candidate(&self, version: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.version == version)
    }

    /// Version strings in registry order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.version.as_str())
    }
}

/// Metadata extracted from a source-control repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMetadata {
    /// Declared package name.
    pub name: String,
    /// Declared version, or the reference when none is declared.
    pub version: String,
    /// Raw dependency strings.
    pub requires: Vec<String>,
    /// Archive URL.
    pub url: String,
    /// Archive filename.
    pub filename: String,
}

/// Errors reported by fetchers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The package or repository does not exist.
    #[error("not found: {name}")]
    NotFound {
        /// What was looked up.
        name: String,
    },
    /// The request failed.
    #[error("transport error: {message}")]
    Transport {
        /// Cause.
        message: String,
    },
    /// The response could not be understood.
    #[error("invalid metadata: {message}")]
    Invalid {
        /// Cause.
        message: String,
    },
}

/// Registry metadata source.
#[async_trait]
pub trait PackageFetcher: Send + Sync {
    /// Fetch every published version of a package.
    async fn fetch_releases(&self, name: &str) -> Result<PackageReleases, FetchError>;

    /// Fetch the raw dependency strings of one version.
    async fn fetch_requires(&self, name: &str, version: &str) -> Result<Vec<String>, FetchError>;
}

/// Source-control metadata source.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Resolve a repository reference into package metadata.
    async fn fetch_source(&self, reference: &SourceReference) -> Result<SourceMetadata, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_kind_from_filename() {
        let wheel = Artifact::new("six-1.16.0-py2.py3-none-any.whl", "https://x/six.whl", None, None);
        assert_eq!(wheel.kind, ArtifactKind::Wheel);
        assert!(wheel.wheel.is_some());

        let sdist = Artifact::new("six-1.16.0.tar.gz", "https://x/six.tar.gz", Some(10), None);
        assert!(sdist.is_sdist());
        assert!(sdist.wheel.is_none());
    }
}
