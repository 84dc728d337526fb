//! Conda to PyPI package name mapping.

use crate::fetcher::FetchError;
use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tandem_core::canonical_name;
use tracing::{debug, warn};

/// Source of the mapping table.
#[async_trait]
pub trait MappingSource: Send + Sync {
    /// Fetch the full conda name to PyPI name table.
    async fn fetch_mapping(&self) -> Result<AHashMap<String, String>, FetchError>;
}

/// Mapping from conda package names to PyPI package names.
///
/// Unknown names, and every name while the table is unpopulated, map to
/// themselves.
#[derive(Debug, Default)]
pub struct NameMapping {
    table: RwLock<Option<Arc<AHashMap<String, String>>>>,
}

impl NameMapping {
    /// Create an empty (identity) mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a populated mapping from explicit entries.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let table = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            table: RwLock::new(Some(Arc::new(table))),
        }
    }

    /// Whether a table has been loaded.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.table.read().is_some()
    }

    /// Load the table once; later calls are no-ops.
    ///
    /// A failed fetch leaves the mapping as it was.
    pub async fn populate(&self, source: &dyn MappingSource) {
        if self.is_populated() {
            return;
        }
        self.refresh(source).await;
    }

    /// Reload the table, keeping the previous one if the fetch fails.
    pub async fn refresh(&self, source: &dyn MappingSource) {
        match source.fetch_mapping().await {
            Ok(table) => {
                debug!(entries = table.len(), "name mapping loaded");
                *self.table.write() = Some(Arc::new(table));
            }
            Err(e) => warn!(error = %e, "failed to load name mapping, keeping previous table"),
        }
    }

    /// PyPI name of a conda package.
    #[must_use]
    pub fn secondary_name(&self, primary: &str) -> String {
        let table = self.table.read().clone();
        table
            .as_deref()
            .and_then(|t| t.get(primary).or_else(|| t.get(&canonical_name(primary))))
            .cloned()
            .unwrap_or_else(|| primary.to_string())
    }
}
