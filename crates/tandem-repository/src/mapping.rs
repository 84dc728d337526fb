//! Conda to PyPI name mapping client.

use crate::client::{HttpClient, HttpClientConfig};
use crate::error::{RepositoryError, Result};
use ahash::AHashMap;
use async_trait::async_trait;
use std::collections::HashMap;
use tandem_resolver::{FetchError, MappingSource};
use tracing::debug;
use url::Url;

/// Published compressed mapping table.
pub const MAPPING_URL: &str =
    "https://raw.githubusercontent.com/prefix-dev/parselmouth/main/files/compressed_mapping.json";

/// Fetches the conda to PyPI name table.
#[derive(Debug)]
pub struct MappingClient {
    url: Url,
    http: HttpClient,
}

impl MappingClient {
    /// Create a client for a mapping URL.
    ///
    /// # Errors
    /// Returns error if the URL does not parse or the HTTP client cannot be created.
    pub fn new(url: &str, http_config: HttpClientConfig) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| RepositoryError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            url,
            http: HttpClient::with_config(http_config)?,
        })
    }

    /// Download the table. Entries without a PyPI name are dropped.
    ///
    /// # Errors
    /// Returns error if the table cannot be fetched or decoded.
    pub async fn fetch(&self) -> Result<AHashMap<String, String>> {
        let raw: HashMap<String, Option<String>> = self.http.get_json(&self.url).await?;
        let table: AHashMap<String, String> = raw
            .into_iter()
            .filter_map(|(conda, pypi)| pypi.map(|p| (conda, p)))
            .collect();
        debug!(entries = table.len(), url = %self.url, "mapping table downloaded");
        Ok(table)
    }
}

#[async_trait]
impl MappingSource for MappingClient {
    async fn fetch_mapping(&self) -> std::result::Result<AHashMap<String, String>, FetchError> {
        self.fetch().await.map_err(FetchError::from)
    }
}
