//! Error types for lock snapshot operations.

use std::path::PathBuf;
use thiserror::Error;

/// Lock snapshot errors.
#[derive(Error, Debug)]
pub enum LockfileError {
    /// IO error with path context.
    #[error("IO error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] sonic_rs::Error),

    /// The snapshot was written by an unknown format version.
    #[error("Incompatible lock version: {version} (supported: {supported})")]
    IncompatibleVersion {
        /// Found version.
        version: String,
        /// Supported version.
        supported: String,
    },

    /// A package is claimed by both ecosystems.
    #[error("Package '{name}' is locked as both a conda and a pip package")]
    OwnershipConflict {
        /// Package name.
        name: String,
    },
}

impl LockfileError {
    /// Create an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether the snapshot file does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { message, .. } if message.contains("No such file") || message.contains("not found"))
    }
}

impl From<LockfileError> for tandem_core::Error {
    fn from(err: LockfileError) -> Self {
        match err {
            LockfileError::Io { path, message } => {
                Self::io(path, std::io::Error::other(message))
            }
            other => Self::lockfile(other.to_string()),
        }
    }
}

/// Result type for lock snapshot operations.
pub type Result<T> = std::result::Result<T, LockfileError>;
