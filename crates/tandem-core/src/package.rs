//! Resolved package records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a resolved package came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Origin {
    /// A package index (PyPI).
    #[default]
    #[serde(rename = "PyPi")]
    Registry,
    /// A source-control repository (GitHub).
    #[serde(rename = "GitHub")]
    SourceControl,
}

impl Origin {
    /// Registry label as written to lock snapshots.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Registry => "PyPi",
            Self::SourceControl => "GitHub",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a downloadable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Download URL.
    pub url: String,
    /// Artifact filename; doubles as the lock key.
    pub filename: String,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// SHA-256 content hash, hex encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// The output unit of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedPackage {
    /// Package name as published.
    pub name: String,
    /// Resolved version.
    pub version: String,
    /// Artifact to install.
    pub artifact: ArtifactRef,
    /// Origin of the package.
    pub origin: Origin,
}

impl ResolvedPackage {
    /// Create a resolved package.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        artifact: ArtifactRef,
        origin: Origin,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            artifact,
            origin,
        }
    }

    /// Artifact filename, used as the snapshot key.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.artifact.filename
    }
}

impl fmt::Display for ResolvedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}
