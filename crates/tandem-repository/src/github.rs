//! GitHub client for source-control requirements.

use crate::client::{HttpClient, HttpClientConfig, join_url};
use crate::descriptor::{DESCRIPTOR_FILES, ProjectDescriptor, parse_descriptor};
use crate::error::{RepositoryError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::sync::Arc;
use tandem_resolver::{FetchError, SourceFetcher, SourceMetadata, SourceReference};
use tracing::debug;
use url::Url;

/// GitHub REST API base URL.
pub const GITHUB_API_URL: &str = "https://api.github.com/";

/// GitHub web base URL, used for archive downloads.
pub const GITHUB_WEB_URL: &str = "https://github.com/";

/// GitHub configuration.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API base URL.
    pub api_url: Url,
    /// Web base URL archives are served from.
    pub web_url: Url,
    /// Token for authenticated requests.
    pub token: Option<String>,
    /// HTTP client configuration.
    pub http_config: HttpClientConfig,
}

impl GitHubConfig {
    /// Configuration for an API base URL.
    ///
    /// # Errors
    /// Returns error if a URL does not parse.
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self> {
        let parse = |url: &str| {
            Url::parse(url).map_err(|e| RepositoryError::InvalidUrl {
                url: url.to_string(),
                message: e.to_string(),
            })
        };
        Ok(Self {
            api_url: parse(api_url)?,
            web_url: parse(GITHUB_WEB_URL)?,
            http_config: HttpClientConfig {
                // 60 requests per hour unauthenticated
                rate_limit_per_host: if token.is_some() { 50 } else { 10 },
                ..HttpClientConfig::default()
            },
            token,
        })
    }
}

/// Repository information.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepository {
    /// `owner/repo`.
    pub full_name: String,
    /// Default branch name.
    pub default_branch: String,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: String,
    encoding: Option<String>,
}

/// GitHub API client.
pub struct GitHubClient {
    config: GitHubConfig,
    http: Arc<HttpClient>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.config.api_url)
            .finish()
    }
}

impl GitHubClient {
    /// Create a client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_config(config: GitHubConfig) -> Result<Self> {
        let http = HttpClient::with_config(config.http_config.clone())?;
        if let Some(ref token) = config.token
            && let Some(host) = config.api_url.host_str()
        {
            http.set_bearer_token(host, token);
        }
        Ok(Self {
            config,
            http: Arc::new(http),
        })
    }

    fn api_url(&self, owner: &str, repo: &str, endpoint: &str) -> Result<Url> {
        let path = if endpoint.is_empty() {
            format!("repos/{owner}/{repo}")
        } else {
            format!("repos/{owner}/{repo}/{endpoint}")
        };
        join_url(&self.config.api_url, &path)
    }

    /// Fetch repository information.
    ///
    /// # Errors
    /// Returns error if the repository cannot be fetched.
    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<GitHubRepository> {
        let url = self.api_url(owner, repo, "")?;
        self.http.get_json(&url).await
    }

    /// Fetch a file's contents at a reference.
    ///
    /// # Errors
    /// Returns error if the file does not exist or cannot be decoded.
    pub async fn get_file_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: &str,
    ) -> Result<String> {
        let mut url = self.api_url(owner, repo, &format!("contents/{path}"))?;
        url.query_pairs_mut().append_pair("ref", reference);

        let response: ContentResponse = self.http.get_json(&url).await?;
        match response.encoding.as_deref() {
            Some("base64") => {
                let decoded = STANDARD
                    .decode(response.content.replace('\n', ""))
                    .map_err(|e| RepositoryError::parse(url.as_str(), format!("base64 decode failed: {e}")))?;
                String::from_utf8(decoded)
                    .map_err(|e| RepositoryError::parse(url.as_str(), format!("UTF-8 decode failed: {e}")))
            }
            _ => Ok(response.content),
        }
    }

    /// Find the first readable project descriptor at `reference`.
    ///
    /// # Errors
    /// Returns [`RepositoryError::NoDescriptor`] when none parses, or the
    /// first transport error that is not a 404.
    pub async fn find_descriptor(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
    ) -> Result<ProjectDescriptor> {
        for file in DESCRIPTOR_FILES {
            match self.get_file_contents(owner, repo, file, reference).await {
                Ok(content) => {
                    if let Some(descriptor) = parse_descriptor(file, &content) {
                        debug!(owner, repo, reference, file, "descriptor found");
                        return Ok(descriptor);
                    }
                    debug!(owner, repo, reference, file, "descriptor did not parse");
                }
                Err(e) if e.is_not_found() => {
                    debug!(owner, repo, reference, file, "descriptor missing");
                }
                Err(e) => return Err(e),
            }
        }
        Err(RepositoryError::NoDescriptor {
            repository: format!("{owner}/{repo}"),
            reference: reference.to_string(),
            tried: DESCRIPTOR_FILES.join(", "),
        })
    }

    /// Archive URL of a repository at a reference.
    ///
    /// # Errors
    /// Returns error if the URL cannot be built.
    pub fn archive_url(&self, owner: &str, repo: &str, reference: &str) -> Result<Url> {
        join_url(
            &self.config.web_url,
            &format!("{owner}/{repo}/archive/{reference}.tar.gz"),
        )
    }

    /// Resolve a reference into package metadata.
    ///
    /// # Errors
    /// Returns error if the repository or its descriptor cannot be read.
    pub async fn resolve_source(&self, reference: &SourceReference) -> Result<SourceMetadata> {
        let SourceReference { owner, repo, .. } = reference;
        let git_ref = match &reference.reference {
            Some(r) => r.clone(),
            None => self.get_repository(owner, repo).await?.default_branch,
        };

        let descriptor = self.find_descriptor(owner, repo, &git_ref).await?;
        let url = self.archive_url(owner, repo, &git_ref)?;
        Ok(SourceMetadata {
            filename: format!("{}-{git_ref}.tar.gz", descriptor.name),
            version: descriptor.version.unwrap_or_else(|| git_ref.clone()),
            name: descriptor.name,
            requires: descriptor.requires,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl SourceFetcher for GitHubClient {
    async fn fetch_source(&self, reference: &SourceReference) -> std::result::Result<SourceMetadata, FetchError> {
        self.resolve_source(reference).await.map_err(FetchError::from)
    }
}
