//! PyPI JSON API client.

use crate::client::{HttpClient, HttpClientConfig, join_url};
use crate::error::{RepositoryError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tandem_core::canonical_name;
use tandem_resolver::{Artifact, Candidate, FetchError, PackageFetcher, PackageReleases};
use tracing::{debug, trace};
use url::Url;

/// Default PyPI JSON API base URL.
pub const PYPI_URL: &str = "https://pypi.org/pypi/";

/// PyPI configuration.
#[derive(Debug, Clone)]
pub struct PyPiConfig {
    /// JSON API base URL.
    pub index_url: Url,
    /// HTTP client configuration.
    pub http_config: HttpClientConfig,
}

impl PyPiConfig {
    /// Configuration for an index URL.
    ///
    /// # Errors
    /// Returns error if the URL does not parse.
    pub fn new(index_url: &str) -> Result<Self> {
        Ok(Self {
            index_url: Url::parse(index_url).map_err(|e| RepositoryError::InvalidUrl {
                url: index_url.to_string(),
                message: e.to_string(),
            })?,
            http_config: HttpClientConfig::default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    info: ProjectInfo,
    #[serde(default)]
    releases: HashMap<String, Vec<ReleaseFile>>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    info: ProjectInfo,
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    name: String,
    version: String,
    #[serde(default)]
    requires_dist: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFile {
    filename: String,
    url: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    digests: Digests,
    #[serde(default)]
    yanked: bool,
}

#[derive(Debug, Default, Deserialize)]
struct Digests {
    #[serde(default)]
    sha256: Option<String>,
}

#[derive(Debug)]
struct CachedProject {
    releases: PackageReleases,
    latest: String,
    latest_requires: Vec<String>,
}

/// PyPI JSON API client.
///
/// Project documents are cached for the lifetime of the client.
pub struct PyPiClient {
    config: PyPiConfig,
    http: Arc<HttpClient>,
    projects: DashMap<String, Arc<CachedProject>>,
}

impl std::fmt::Debug for PyPiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PyPiClient")
            .field("index_url", &self.config.index_url)
            .field("cached", &self.projects.len())
            .finish_non_exhaustive()
    }
}

impl PyPiClient {
    /// Create a client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_config(config: PyPiConfig) -> Result<Self> {
        let http = HttpClient::with_config(config.http_config.clone())?;
        Ok(Self {
            config,
            http: Arc::new(http),
            projects: DashMap::new(),
        })
    }

    /// Underlying HTTP client.
    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    async fn project(&self, name: &str) -> Result<Arc<CachedProject>> {
        let key = canonical_name(name);
        if let Some(cached) = self.projects.get(&key) {
            trace!(package = %key, "project cache hit");
            return Ok(Arc::clone(&cached));
        }

        let url = join_url(&self.config.index_url, &format!("{key}/json"))?;
        let response: ProjectResponse = self.http.get_json(&url).await?;

        let mut candidates: Vec<Candidate> = response
            .releases
            .into_iter()
            .map(|(version, files)| {
                let artifacts = files
                    .into_iter()
                    .filter(|f| !f.yanked)
                    .map(|f| Artifact::new(f.filename, f.url, f.size, f.digests.sha256))
                    .collect();
                Candidate::new(version, artifacts)
            })
            .collect();
        // JSON object order is not significant; keep a stable order.
        candidates.sort_by(|a, b| tandem_resolver::compare(&a.version, &b.version));

        debug!(
            package = %response.info.name,
            versions = candidates.len(),
            "fetched project metadata"
        );

        let project = Arc::new(CachedProject {
            releases: PackageReleases {
                name: response.info.name,
                candidates,
            },
            latest: response.info.version,
            latest_requires: response.info.requires_dist.unwrap_or_default(),
        });
        self.projects.insert(key, Arc::clone(&project));
        Ok(project)
    }

    /// Fetch the release list of a project.
    ///
    /// # Errors
    /// Returns error if the project cannot be fetched.
    pub async fn releases(&self, name: &str) -> Result<PackageReleases> {
        Ok(self.project(name).await?.releases.clone())
    }

    /// Fetch `Requires-Dist` of one version.
    ///
    /// # Errors
    /// Returns error if the version cannot be fetched.
    pub async fn requires_dist(&self, name: &str, version: &str) -> Result<Vec<String>> {
        let project = self.project(name).await?;
        if project.latest == version {
            return Ok(project.latest_requires.clone());
        }

        let key = canonical_name(name);
        let url = join_url(&self.config.index_url, &format!("{key}/{version}/json"))?;
        let response: VersionResponse = self.http.get_json(&url).await?;
        Ok(response.info.requires_dist.unwrap_or_default())
    }
}

fn into_fetch_error(name: &str, err: RepositoryError) -> FetchError {
    if err.is_not_found() {
        FetchError::NotFound {
            name: name.to_string(),
        }
    } else {
        err.into()
    }
}

#[async_trait]
impl PackageFetcher for PyPiClient {
    async fn fetch_releases(&self, name: &str) -> std::result::Result<PackageReleases, FetchError> {
        self.releases(name)
            .await
            .map_err(|e| into_fetch_error(name, e))
    }

    async fn fetch_requires(
        &self,
        name: &str,
        version: &str,
    ) -> std::result::Result<Vec<String>, FetchError> {
        self.requires_dist(name, version)
            .await
            .map_err(|e| into_fetch_error(name, e))
    }
}
