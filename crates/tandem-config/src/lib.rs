//! Configuration for tandem.
//!
//! Settings are merged in order of increasing priority:
//! 1. Built-in defaults
//! 2. Global `config.json` in the user configuration directory
//! 3. Project `tandem.json`
//! 4. `TANDEM_*` environment variables
//!
//! The crate also owns channel list normalization shared by every command
//! that talks to the primary solver.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod channels;
mod env;
mod error;
mod loader;
mod types;

pub use channels::{CHANNEL_ALIASES, DEFAULT_CHANNELS, format_channels, normalize_channel};
pub use env::{EnvConfig, TandemEnvVar};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, ConfigSource};
pub use types::{
    ConfigFile, DEFAULT_GITHUB_API_URL, DEFAULT_MAPPING_URL, DEFAULT_PYPI_URL, HttpSettings,
    TandemConfig,
};
