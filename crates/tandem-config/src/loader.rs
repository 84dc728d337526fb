//! Configuration loader with hierarchical merging.

use crate::env::EnvConfig;
use crate::error::{ConfigError, Result};
use crate::types::{ConfigFile, TandemConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project configuration file name.
const PROJECT_FILE: &str = "tandem.json";

/// Global configuration file name.
const GLOBAL_FILE: &str = "config.json";

/// Configuration source in hierarchy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in defaults.
    Defaults = 0,
    /// User global configuration.
    Global = 1,
    /// Project-local configuration.
    Project = 2,
    /// Environment variables.
    Environment = 3,
}

impl ConfigSource {
    /// Get description for display.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Defaults => "built-in defaults",
            Self::Global => "global configuration",
            Self::Project => "project configuration",
            Self::Environment => "environment variables",
        }
    }
}

/// Configuration loader.
#[derive(Debug)]
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_config: EnvConfig,
}

impl ConfigLoader {
    /// Create a loader reading the process environment.
    ///
    /// # Errors
    /// Returns error if an environment variable is malformed.
    pub fn new(project_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::with_env(project_dir, EnvConfig::from_env()?))
    }

    /// Create a loader with explicit environment overrides.
    #[must_use]
    pub fn with_env(project_dir: impl Into<PathBuf>, env_config: EnvConfig) -> Self {
        Self {
            project_dir: project_dir.into(),
            env_config,
        }
    }

    /// Global configuration directory (`TANDEM_HOME` or the user config dir).
    #[must_use]
    pub fn global_config_dir(&self) -> Option<PathBuf> {
        self.env_config.home.clone().or_else(|| {
            directories::ProjectDirs::from("dev", "tandem", "tandem")
                .map(|dirs| dirs.config_dir().to_path_buf())
        })
    }

    /// Global configuration file path.
    #[must_use]
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir().map(|dir| dir.join(GLOBAL_FILE))
    }

    /// Project configuration file path.
    #[must_use]
    pub fn project_config_path(&self) -> PathBuf {
        self.project_dir.join(PROJECT_FILE)
    }

    /// Environment overrides in use.
    #[must_use]
    pub const fn env(&self) -> &EnvConfig {
        &self.env_config
    }

    fn load_file(path: &Path) -> Result<Option<ConfigFile>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                let err = ConfigError::io(path, e);
                return if err.is_not_found() { Ok(None) } else { Err(err) };
            }
        };
        sonic_rs::from_str(&content)
            .map(Some)
            .map_err(|e| ConfigError::json(path, &e))
    }

    /// Build the resolved configuration by merging all sources.
    ///
    /// Missing files are skipped; unreadable or malformed ones are errors.
    ///
    /// # Errors
    /// Returns error if a file is malformed or the merged result is invalid.
    pub fn resolve(&self) -> Result<TandemConfig> {
        let mut config = TandemConfig::default();
        debug!(source = ConfigSource::Defaults.description(), "config layer applied");

        if let Some(path) = self.global_config_path()
            && let Some(file) = Self::load_file(&path)?
        {
            config.merge_file(&file);
            debug!(
                source = ConfigSource::Global.description(),
                path = %path.display(),
                "config layer applied"
            );
        }

        let project_path = self.project_config_path();
        if let Some(file) = Self::load_file(&project_path)? {
            config.merge_file(&file);
            debug!(
                source = ConfigSource::Project.description(),
                path = %project_path.display(),
                "config layer applied"
            );
        }

        self.env_config.apply_to(&mut config);
        debug!(source = ConfigSource::Environment.description(), "config layer applied");

        config.validate()?;
        Ok(config)
    }
}
