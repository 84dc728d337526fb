//! In-memory fetchers for resolver scenario tests.

#![allow(dead_code)]

use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::Mutex;
use tandem_resolver::{
    Artifact, Candidate, FetchError, PackageFetcher, PackageReleases, SourceFetcher,
    SourceMetadata, SourceReference,
};

/// A registry held in memory.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    releases: AHashMap<String, PackageReleases>,
    requires: AHashMap<(String, String), Vec<String>>,
    lookups: Mutex<Vec<String>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `version` of `name` with the given files and dependencies.
    pub fn publish(mut self, name: &str, version: &str, files: &[&str], requires: &[&str]) -> Self {
        let artifacts = files
            .iter()
            .map(|f| Artifact::new(*f, format!("https://files.example/{f}"), Some(1024), None))
            .collect();
        self.releases
            .entry(name.to_lowercase())
            .or_insert_with(|| PackageReleases {
                name: name.to_string(),
                candidates: Vec::new(),
            })
            .candidates
            .push(Candidate::new(version, artifacts));
        self.requires.insert(
            (name.to_lowercase(), version.to_string()),
            requires.iter().map(|r| (*r).to_string()).collect(),
        );
        self
    }

    /// Publish a pure Python wheel.
    pub fn pure(self, name: &str, version: &str, requires: &[&str]) -> Self {
        let file = format!("{name}-{version}-py3-none-any.whl");
        self.publish(name, version, &[file.as_str()], requires)
    }

    /// Names looked up so far, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }
}

#[async_trait]
impl PackageFetcher for InMemoryRegistry {
    async fn fetch_releases(&self, name: &str) -> Result<PackageReleases, FetchError> {
        self.lookups.lock().push(name.to_string());
        self.releases
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                name: name.to_string(),
            })
    }

    async fn fetch_requires(&self, name: &str, version: &str) -> Result<Vec<String>, FetchError> {
        Ok(self
            .requires
            .get(&(name.to_lowercase(), version.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// A single repository's metadata.
#[derive(Debug, Clone)]
pub struct StaticSource {
    pub metadata: SourceMetadata,
}

#[async_trait]
impl SourceFetcher for StaticSource {
    async fn fetch_source(&self, reference: &SourceReference) -> Result<SourceMetadata, FetchError> {
        if reference.repo == self.metadata.name {
            Ok(self.metadata.clone())
        } else {
            Err(FetchError::NotFound {
                name: reference.to_string(),
            })
        }
    }
}
