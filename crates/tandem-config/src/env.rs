//! Environment variable configuration support.

use crate::channels::format_channels;
use crate::error::{ConfigError, Result};
use crate::types::TandemConfig;
use std::path::PathBuf;
use tandem_core::Platform;

/// Environment variables understood by tandem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TandemEnvVar {
    /// `TANDEM_HOME` - global configuration directory.
    Home,
    /// `TANDEM_PLATFORM` - target platform.
    Platform,
    /// `TANDEM_CHANNELS` - comma separated channel list.
    Channels,
    /// `TANDEM_PYPI_URL` - PyPI JSON API base.
    PypiUrl,
    /// `TANDEM_GITHUB_API_URL` - GitHub REST API base.
    GithubApiUrl,
    /// `TANDEM_GITHUB_TOKEN` - GitHub token.
    GithubToken,
    /// `GITHUB_TOKEN` - GitHub token fallback.
    GithubTokenFallback,
    /// `TANDEM_MAPPING_URL` - conda to PyPI name mapping table.
    MappingUrl,
    /// `TANDEM_ALLOW_SOURCE_FALLBACK` - allow sdists when no wheel fits.
    AllowSourceFallback,
    /// `TANDEM_ALLOW_NOT_EQUAL` - accept the `!=` operator.
    AllowNotEqual,
    /// `TANDEM_SOLVE_RETRIES` - primary solve retries.
    SolveRetries,
    /// `TANDEM_HTTP_TIMEOUT` - HTTP request timeout in seconds.
    HttpTimeout,
}

impl TandemEnvVar {
    /// Get the environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "TANDEM_HOME",
            Self::Platform => "TANDEM_PLATFORM",
            Self::Channels => "TANDEM_CHANNELS",
            Self::PypiUrl => "TANDEM_PYPI_URL",
            Self::GithubApiUrl => "TANDEM_GITHUB_API_URL",
            Self::GithubToken => "TANDEM_GITHUB_TOKEN",
            Self::GithubTokenFallback => "GITHUB_TOKEN",
            Self::MappingUrl => "TANDEM_MAPPING_URL",
            Self::AllowSourceFallback => "TANDEM_ALLOW_SOURCE_FALLBACK",
            Self::AllowNotEqual => "TANDEM_ALLOW_NOT_EQUAL",
            Self::SolveRetries => "TANDEM_SOLVE_RETRIES",
            Self::HttpTimeout => "TANDEM_HTTP_TIMEOUT",
        }
    }
}

fn parse_bool(var: TandemEnvVar, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::EnvError {
            var: var.as_str().to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(var: TandemEnvVar, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::EnvError {
        var: var.as_str().to_string(),
        message: format!("expected a number, got '{value}'"),
    })
}

/// Configuration read from environment variables.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// Global configuration directory.
    pub home: Option<PathBuf>,
    /// Target platform.
    pub platform: Option<Platform>,
    /// Channels.
    pub channels: Option<Vec<String>>,
    /// PyPI JSON API base.
    pub pypi_url: Option<String>,
    /// GitHub REST API base.
    pub github_api_url: Option<String>,
    /// GitHub token.
    pub github_token: Option<String>,
    /// Name mapping URL.
    pub mapping_url: Option<String>,
    /// Allow sdists.
    pub allow_source_fallback: Option<bool>,
    /// Accept `!=`.
    pub allow_not_equal: Option<bool>,
    /// Primary solve retries.
    pub solve_retries: Option<u32>,
    /// HTTP timeout in seconds.
    pub http_timeout: Option<u64>,
}

impl EnvConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns error if a variable holds a value of the wrong type.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through a variable lookup function.
    ///
    /// # Errors
    /// Returns error if a variable holds a value of the wrong type.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: TandemEnvVar| lookup(var.as_str()).filter(|v| !v.trim().is_empty());

        let platform = match get(TandemEnvVar::Platform) {
            Some(value) => Some(value.parse::<Platform>().map_err(|e| ConfigError::EnvError {
                var: TandemEnvVar::Platform.as_str().to_string(),
                message: e.to_string(),
            })?),
            None => None,
        };

        Ok(Self {
            home: get(TandemEnvVar::Home).map(PathBuf::from),
            platform,
            channels: get(TandemEnvVar::Channels).map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            }),
            pypi_url: get(TandemEnvVar::PypiUrl),
            github_api_url: get(TandemEnvVar::GithubApiUrl),
            github_token: get(TandemEnvVar::GithubToken)
                .or_else(|| get(TandemEnvVar::GithubTokenFallback)),
            mapping_url: get(TandemEnvVar::MappingUrl),
            allow_source_fallback: get(TandemEnvVar::AllowSourceFallback)
                .map(|v| parse_bool(TandemEnvVar::AllowSourceFallback, &v))
                .transpose()?,
            allow_not_equal: get(TandemEnvVar::AllowNotEqual)
                .map(|v| parse_bool(TandemEnvVar::AllowNotEqual, &v))
                .transpose()?,
            solve_retries: get(TandemEnvVar::SolveRetries)
                .map(|v| parse_number(TandemEnvVar::SolveRetries, &v))
                .transpose()?,
            http_timeout: get(TandemEnvVar::HttpTimeout)
                .map(|v| parse_number(TandemEnvVar::HttpTimeout, &v))
                .transpose()?,
        })
    }

    /// Apply environment overrides to a configuration.
    pub fn apply_to(&self, config: &mut TandemConfig) {
        if let Some(platform) = self.platform {
            config.platform = platform;
        }
        if let Some(ref channels) = self.channels {
            config.channels = format_channels(channels);
        }
        if let Some(ref url) = self.pypi_url {
            config.pypi_url = url.clone();
        }
        if let Some(ref url) = self.github_api_url {
            config.github_api_url = url.clone();
        }
        if let Some(ref token) = self.github_token {
            config.github_token = Some(token.clone());
        }
        if let Some(ref url) = self.mapping_url {
            config.mapping_url = url.clone();
        }
        if let Some(allow) = self.allow_source_fallback {
            config.allow_source_fallback = allow;
        }
        if let Some(allow) = self.allow_not_equal {
            config.allow_not_equal = allow;
        }
        if let Some(retries) = self.solve_retries {
            config.solve_retries = retries;
        }
        if let Some(timeout) = self.http_timeout {
            config.http.timeout_secs = timeout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn reads_typed_values() {
        let env = EnvConfig::from_lookup(lookup(&[
            ("TANDEM_PLATFORM", "linux-64"),
            ("TANDEM_CHANNELS", "conda-forge, https://example.org/ch/"),
            ("TANDEM_ALLOW_SOURCE_FALLBACK", "yes"),
            ("TANDEM_SOLVE_RETRIES", "5"),
            ("GITHUB_TOKEN", "ghp_fallback"),
        ]))
        .unwrap();

        assert_eq!(env.platform, Some(Platform::Linux64));
        assert_eq!(env.allow_source_fallback, Some(true));
        assert_eq!(env.solve_retries, Some(5));
        assert_eq!(env.github_token.as_deref(), Some("ghp_fallback"));

        let mut config = TandemConfig::default();
        env.apply_to(&mut config);
        assert_eq!(config.platform, Platform::Linux64);
        assert_eq!(config.channels[0], "https://example.org/ch");
        assert_eq!(config.solve_retries, 5);
    }

    #[test]
    fn explicit_token_wins_over_fallback() {
        let env = EnvConfig::from_lookup(lookup(&[
            ("TANDEM_GITHUB_TOKEN", "ghp_explicit"),
            ("GITHUB_TOKEN", "ghp_fallback"),
        ]))
        .unwrap();
        assert_eq!(env.github_token.as_deref(), Some("ghp_explicit"));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = EnvConfig::from_lookup(lookup(&[("TANDEM_SOLVE_RETRIES", "many")])).unwrap_err();
        assert_eq!(err.key(), Some("TANDEM_SOLVE_RETRIES"));

        let err = EnvConfig::from_lookup(lookup(&[("TANDEM_PLATFORM", "amiga")])).unwrap_err();
        assert_eq!(err.key(), Some("TANDEM_PLATFORM"));

        let err =
            EnvConfig::from_lookup(lookup(&[("TANDEM_ALLOW_NOT_EQUAL", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("maybe"));
    }
}
