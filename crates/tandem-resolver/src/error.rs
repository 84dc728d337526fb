//! Errors that can occur during requirement resolution.

use tandem_core::Error;
use thiserror::Error;

/// Errors that can occur during requirement resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The package exists but no release satisfies the constraint.
    #[error(
        "Could not find a version that satisfies the requirement {requirement} (from versions: {})",
        .available.join(", ")
    )]
    ConstraintUnsatisfiable {
        /// Package name.
        name: String,
        /// The constraint that could not be met.
        constraint: String,
        /// Requirement as written by the user (`name` plus constraint).
        requirement: String,
        /// Every published version, ascending.
        available: Vec<String>,
    },

    /// A release was chosen but none of its artifacts fits the target.
    #[error("{message}")]
    ArtifactUnavailable {
        /// Package name.
        name: String,
        /// Target platform.
        platform: String,
        /// User-facing explanation.
        message: String,
    },

    /// The registry does not know the package.
    #[error("Could not find a version that satisfies the requirement {requirement}")]
    PackageNotFound {
        /// Package name.
        name: String,
        /// Requirement as written.
        requirement: String,
    },

    /// A constraint expression could not be parsed.
    #[error("{message}")]
    InvalidConstraintSyntax {
        /// The offending clause.
        constraint: String,
        /// User-facing explanation, including any hint.
        message: String,
    },

    /// A source-control reference could not be resolved.
    #[error("Failed to resolve GitHub package {reference}: {message}")]
    SourceControl {
        /// The reference, as `owner/repo[@ref]`.
        reference: String,
        /// Cause.
        message: String,
    },

    /// A requirement string could not be parsed.
    #[error("Invalid requirement: '{requirement}': {message}")]
    InvalidRequirement {
        /// The requirement as written.
        requirement: String,
        /// Cause.
        message: String,
    },

    /// Metadata could not be retrieved.
    #[error("failed to fetch metadata for {name}: {message}")]
    Fetch {
        /// Package name.
        name: String,
        /// Cause.
        message: String,
    },
}

impl ResolveError {
    /// Second line printed after the main message, when there is one.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ConstraintUnsatisfiable { requirement, .. }
            | Self::PackageNotFound { requirement, .. } => {
                Some(format!("No matching distribution found for {requirement}"))
            }
            _ => None,
        }
    }

    /// Name of the package the error is about, if any.
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        match self {
            Self::ConstraintUnsatisfiable { name, .. }
            | Self::ArtifactUnavailable { name, .. }
            | Self::PackageNotFound { name, .. }
            | Self::Fetch { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl From<ResolveError> for Error {
    fn from(err: ResolveError) -> Self {
        let message = err.to_string();
        match err {
            ResolveError::ConstraintUnsatisfiable {
                name,
                constraint,
                available,
                ..
            } => Self::version_not_found(name, constraint, available),
            ResolveError::ArtifactUnavailable { name, platform, message } => {
                Self::artifact_unavailable(name, platform, message)
            }
            ResolveError::PackageNotFound { name, .. } => Self::package_not_found(name),
            ResolveError::InvalidConstraintSyntax { constraint, message } => {
                Self::invalid_constraint(constraint, message)
            }
            ResolveError::SourceControl { reference, .. } => Self::vcs(message, Some(reference)),
            ResolveError::InvalidRequirement { requirement, message } => {
                Self::invalid_requirement(requirement, message)
            }
            ResolveError::Fetch { .. } => Self::network(message, None),
        }
    }
}
