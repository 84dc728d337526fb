//! Lock snapshot data types.

use crate::error::{LockfileError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tandem_core::{ArtifactRef, Origin, Platform, ResolvedPackage, canonical_name};
use tracing::debug;

/// Lock format version written by this crate.
pub const LOCK_VERSION: &str = "1.0.0";

/// Content hashes of a package archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageHash {
    /// MD5 hex digest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    /// SHA-256 hex digest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// A package installed by the conda solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondaPackage {
    /// Package name.
    pub name: String,
    /// Version.
    pub version: String,
    /// Build string.
    #[serde(default)]
    pub build: String,
    /// Channel subdir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdir: Option<String>,
    /// Channel name or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Download URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Archive hashes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<PackageHash>,
    /// Archive size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl CondaPackage {
    /// Create a package record with only identity fields set.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        build: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            build: build.into(),
            subdir: None,
            channel: None,
            url: None,
            hash: None,
            size: None,
        }
    }

    /// Set the channel.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }
}

/// A package installed by the pip resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipPackage {
    /// Package name.
    pub name: String,
    /// Version.
    pub version: String,
    /// Download URL.
    pub url: String,
    /// Where the package came from.
    pub registry: Origin,
    /// Archive hashes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<PackageHash>,
    /// Archive size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl PipPackage {
    /// Rebuild the resolved record, given the snapshot key.
    #[must_use]
    pub fn to_resolved(&self, filename: &str) -> ResolvedPackage {
        ResolvedPackage::new(
            self.name.clone(),
            self.version.clone(),
            ArtifactRef {
                url: self.url.clone(),
                filename: filename.to_string(),
                size: self.size,
                sha256: self.hash.as_ref().and_then(|h| h.sha256.clone()),
            },
            self.registry,
        )
    }
}

impl From<&ResolvedPackage> for PipPackage {
    fn from(pkg: &ResolvedPackage) -> Self {
        Self {
            name: pkg.name.clone(),
            version: pkg.version.clone(),
            url: pkg.artifact.url.clone(),
            registry: pkg.origin,
            hash: pkg.artifact.sha256.clone().map(|sha256| PackageHash {
                md5: None,
                sha256: Some(sha256),
            }),
            size: pkg.artifact.size,
        }
    }
}

/// A full environment state.
///
/// Both package maps are keyed by artifact filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockSnapshot {
    /// Lock format version.
    pub lock_version: String,
    /// Target platform.
    #[serde(default)]
    pub platform: Platform,
    /// Root conda specs.
    #[serde(default)]
    pub specs: Vec<String>,
    /// Channel URLs.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Conda packages.
    #[serde(default)]
    pub packages: BTreeMap<String, CondaPackage>,
    /// Pip packages.
    #[serde(default)]
    pub pip_packages: BTreeMap<String, PipPackage>,
}

impl Default for LockSnapshot {
    fn default() -> Self {
        Self::new(Platform::default())
    }
}

impl LockSnapshot {
    /// An empty snapshot for a platform.
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            lock_version: LOCK_VERSION.to_string(),
            platform,
            specs: Vec::new(),
            channels: Vec::new(),
            packages: BTreeMap::new(),
            pip_packages: BTreeMap::new(),
        }
    }

    /// Parse and validate a snapshot.
    ///
    /// # Errors
    /// Returns error on malformed JSON, an unknown lock version or a
    /// package locked by both ecosystems.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = sonic_rs::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(sonic_rs::to_string_pretty(self)?)
    }

    /// Read a snapshot file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is invalid.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LockfileError::io(path, e))?;
        let snapshot = Self::from_json(&content)?;
        debug!(
            path = %path.display(),
            conda = snapshot.packages.len(),
            pip = snapshot.pip_packages.len(),
            "read lock snapshot"
        );
        Ok(snapshot)
    }

    /// Write the snapshot atomically.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| LockfileError::io(dir, e))?;
        let written = temp
            .write_all(json.as_bytes())
            .and_then(|()| temp.write_all(b"\n"));
        written
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| LockfileError::io(path, e))?;
        temp.persist(path)
            .map_err(|e| LockfileError::io(path, e.error))?;
        debug!(path = %path.display(), "wrote lock snapshot");
        Ok(())
    }

    /// Check the lock version and exclusive ownership.
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.lock_version != LOCK_VERSION {
            return Err(LockfileError::IncompatibleVersion {
                version: self.lock_version.clone(),
                supported: LOCK_VERSION.to_string(),
            });
        }
        let conda = self.conda_names();
        if let Some(pkg) = self
            .pip_packages
            .values()
            .find(|p| conda.contains(&canonical_name(&p.name)))
        {
            return Err(LockfileError::OwnershipConflict {
                name: pkg.name.clone(),
            });
        }
        Ok(())
    }

    /// Canonical names of every conda package.
    #[must_use]
    pub fn conda_names(&self) -> ahash::AHashSet<String> {
        self.packages
            .values()
            .map(|p| canonical_name(&p.name))
            .collect()
    }

    /// Find a conda package by name.
    #[must_use]
    pub fn conda_package(&self, name: &str) -> Option<(&str, &CondaPackage)> {
        let wanted = canonical_name(name);
        self.packages
            .iter()
            .find(|(_, p)| canonical_name(&p.name) == wanted)
            .map(|(k, p)| (k.as_str(), p))
    }

    /// Find a pip package by name.
    #[must_use]
    pub fn pip_package(&self, name: &str) -> Option<(&str, &PipPackage)> {
        let wanted = canonical_name(name);
        self.pip_packages
            .iter()
            .find(|(_, p)| canonical_name(&p.name) == wanted)
            .map(|(k, p)| (k.as_str(), p))
    }

    /// Pip packages as resolved records.
    #[must_use]
    pub fn pip_resolved(&self) -> Vec<ResolvedPackage> {
        self.pip_packages
            .iter()
            .map(|(filename, pkg)| pkg.to_resolved(filename))
            .collect()
    }

    /// Replace every pip package with `packages`.
    pub fn set_pip_packages<'a>(&mut self, packages: impl IntoIterator<Item = &'a ResolvedPackage>) {
        self.pip_packages = packages
            .into_iter()
            .map(|p| (p.filename().to_string(), PipPackage::from(p)))
            .collect();
    }

    /// Total number of locked packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len() + self.pip_packages.len()
    }

    /// Whether nothing is locked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.pip_packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "lockVersion": "1.0.0",
        "platform": "emscripten-wasm32",
        "specs": ["python", "numpy"],
        "channels": ["https://prefix.dev/emscripten-forge-dev"],
        "packages": {
            "python-3.13.1-h_1_cpython.tar.bz2": {
                "name": "python",
                "version": "3.13.1",
                "build": "h_1_cpython",
                "subdir": "emscripten-wasm32",
                "channel": "emscripten-forge-dev"
            }
        },
        "pipPackages": {
            "six-1.16.0-py2.py3-none-any.whl": {
                "name": "six",
                "version": "1.16.0",
                "url": "https://files.pythonhosted.org/six-1.16.0-py2.py3-none-any.whl",
                "registry": "PyPi",
                "hash": {"sha256": "8abb2f1d86890a2dfb989f9a77cfcfd3e47c2a354b01111771326f8aa26e0254"}
            }
        }
    }"#;

    #[test]
    fn parses_sample() {
        let snapshot = LockSnapshot::from_json(SAMPLE).unwrap();
        assert_eq!(snapshot.platform, Platform::EmscriptenWasm32);
        assert_eq!(snapshot.len(), 2);
        let (filename, six) = snapshot.pip_package("Six").unwrap();
        assert_eq!(filename, "six-1.16.0-py2.py3-none-any.whl");
        assert_eq!(six.registry, Origin::Registry);

        let resolved = snapshot.pip_resolved();
        assert_eq!(resolved[0].filename(), "six-1.16.0-py2.py3-none-any.whl");
        assert!(resolved[0].artifact.sha256.is_some());
    }

    #[test]
    fn missing_maps_are_empty() {
        let snapshot = LockSnapshot::from_json(r#"{"lockVersion": "1.0.0"}"#).unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.platform, Platform::EmscriptenWasm32);
    }

    #[test]
    fn rejects_unknown_version() {
        let err = LockSnapshot::from_json(r#"{"lockVersion": "2.0.0"}"#).unwrap_err();
        assert!(matches!(err, LockfileError::IncompatibleVersion { .. }));
    }

    #[test]
    fn rejects_shared_ownership() {
        let mut snapshot = LockSnapshot::new(Platform::Linux64);
        snapshot
            .packages
            .insert("six-1.16.0-pyhd8ed1ab_0.conda".into(), CondaPackage::new("six", "1.16.0", "pyhd8ed1ab_0"));
        let json = snapshot.to_json().unwrap();
        let mut with_pip = LockSnapshot::from_json(&json).unwrap();
        with_pip.pip_packages.insert(
            "six-1.16.0-py2.py3-none-any.whl".into(),
            PipPackage {
                name: "six".into(),
                version: "1.16.0".into(),
                url: "https://x/six.whl".into(),
                registry: Origin::Registry,
                hash: None,
                size: None,
            },
        );
        assert!(matches!(
            with_pip.validate(),
            Err(LockfileError::OwnershipConflict { name }) if name == "six"
        ));
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tandem-lock.json");
        let snapshot = LockSnapshot::from_json(SAMPLE).unwrap();
        snapshot.write(&path).unwrap();
        assert_eq!(LockSnapshot::read(&path).unwrap(), snapshot);
    }
}
