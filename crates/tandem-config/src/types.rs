//! Configuration types.

use crate::channels::{DEFAULT_CHANNELS, format_channels};
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use tandem_core::Platform;

/// Default PyPI JSON API base.
pub const DEFAULT_PYPI_URL: &str = "https://pypi.org/pypi/";

/// Default GitHub REST API base.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com/";

/// Default conda to PyPI name mapping table.
pub const DEFAULT_MAPPING_URL: &str =
    "https://raw.githubusercontent.com/prefix-dev/parselmouth/main/files/compressed_mapping.json";

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpSettings {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Retries for transient HTTP failures.
    pub max_retries: u32,
    /// Requests per second allowed per host.
    pub rate_limit_per_host: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 3,
            rate_limit_per_host: 20,
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TandemConfig {
    /// Target platform.
    pub platform: Platform,
    /// Channel URLs for the primary solve, normalized.
    pub channels: Vec<String>,
    /// PyPI JSON API base URL.
    pub pypi_url: String,
    /// GitHub REST API base URL.
    pub github_api_url: String,
    /// GitHub token for API requests.
    pub github_token: Option<String>,
    /// Name mapping table URL.
    pub mapping_url: String,
    /// Allow source distributions when no wheel fits.
    pub allow_source_fallback: bool,
    /// Accept the `!=` constraint operator.
    pub allow_not_equal: bool,
    /// Retries for transient primary solve failures.
    pub solve_retries: u32,
    /// HTTP client settings.
    pub http: HttpSettings,
}

impl Default for TandemConfig {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            channels: DEFAULT_CHANNELS.iter().map(|c| (*c).to_string()).collect(),
            pypi_url: DEFAULT_PYPI_URL.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            github_token: None,
            mapping_url: DEFAULT_MAPPING_URL.to_string(),
            allow_source_fallback: false,
            allow_not_equal: true,
            solve_retries: 3,
            http: HttpSettings::default(),
        }
    }
}

impl TandemConfig {
    /// Upper bound on `solve_retries`.
    pub const MAX_SOLVE_RETRIES: u32 = 10;

    /// Overlay the values present in a configuration file.
    pub fn merge_file(&mut self, file: &ConfigFile) {
        if let Some(platform) = file.platform {
            self.platform = platform;
        }
        if let Some(ref channels) = file.channels {
            self.channels = format_channels(channels);
        }
        if let Some(ref url) = file.pypi_url {
            self.pypi_url = url.clone();
        }
        if let Some(ref url) = file.github_api_url {
            self.github_api_url = url.clone();
        }
        if let Some(ref token) = file.github_token {
            self.github_token = Some(token.clone());
        }
        if let Some(ref url) = file.mapping_url {
            self.mapping_url = url.clone();
        }
        if let Some(allow) = file.allow_source_fallback {
            self.allow_source_fallback = allow;
        }
        if let Some(allow) = file.allow_not_equal {
            self.allow_not_equal = allow;
        }
        if let Some(retries) = file.solve_retries {
            self.solve_retries = retries;
        }
        if let Some(ref http) = file.http {
            self.http = http.clone();
        }
    }

    /// Check URLs and numeric ranges.
    ///
    /// # Errors
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("pypiUrl", &self.pypi_url),
            ("githubApiUrl", &self.github_api_url),
            ("mappingUrl", &self.mapping_url),
        ] {
            validate_url(field, value)?;
        }
        for channel in &self.channels {
            validate_url("channels", channel)?;
        }
        if self.solve_retries > Self::MAX_SOLVE_RETRIES {
            return Err(ConfigError::out_of_range(
                "solveRetries",
                self.solve_retries,
                0,
                Self::MAX_SOLVE_RETRIES,
            ));
        }
        if self.http.rate_limit_per_host == 0 {
            return Err(ConfigError::invalid_value(
                "http.rateLimitPerHost",
                "must be greater than zero",
                "use at least 1 request per second",
            ));
        }
        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            field: field.to_string(),
            url: value.to_string(),
        }),
    }
}

/// On-disk configuration (`config.json` / `tandem.json`). Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// Target platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Channels (names or URLs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<String>>,
    /// PyPI JSON API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pypi_url: Option<String>,
    /// GitHub REST API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_api_url: Option<String>,
    /// GitHub token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    /// Name mapping table URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_url: Option<String>,
    /// Allow source distributions when no wheel fits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_source_fallback: Option<bool>,
    /// Accept the `!=` operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_not_equal: Option<bool>,
    /// Primary solve retries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solve_retries: Option<u32>,
    /// HTTP settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpSettings>,
}
