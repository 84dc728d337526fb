//! Network metadata sources for tandem.
//!
//! - [`PyPiClient`]: release lists and `Requires-Dist` from the PyPI JSON API
//! - [`GitHubClient`]: package metadata from GitHub repositories
//! - [`MappingClient`]: the conda to PyPI name table
//!
//! All three share [`HttpClient`], which rate limits per host and retries
//! transient failures.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod client;
pub mod descriptor;
mod error;
mod github;
mod mapping;
mod pypi;

pub use client::{HttpClient, HttpClientConfig, HttpClientStats, HttpResponse};
pub use descriptor::{DESCRIPTOR_FILES, ProjectDescriptor, parse_descriptor};
pub use error::{RepositoryError, Result};
pub use github::{GITHUB_API_URL, GITHUB_WEB_URL, GitHubClient, GitHubConfig, GitHubRepository};
pub use mapping::{MAPPING_URL, MappingClient};
pub use pypi::{PYPI_URL, PyPiClient, PyPiConfig};
