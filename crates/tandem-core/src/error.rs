//! Error types for tandem operations.
//!
//! Each error has:
//! - A unique error code (e.g., E0101) for easy reference and searching
//! - A message naming the offending package, constraint or file
//! - Suggestions for how to fix the issue

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for tandem errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Package errors (E01xx)
    /// Package not found in the registry
    E0101,
    /// No version satisfies the constraint
    E0102,
    /// Requirement text could not be parsed
    E0103,
    /// No artifact matches the target runtime and platform
    E0105,

    // Resolution errors (E02xx)
    /// Primary solve failed
    E0201,

    // Network errors (E03xx)
    /// Network request failed
    E0301,
    /// Service unreachable
    E0302,
    /// Authentication failed
    E0303,
    /// Rate limited by server
    E0304,

    // Constraint errors (E04xx)
    /// Invalid JSON syntax
    E0403,
    /// Invalid version constraint format
    E0404,

    // IO errors (E05xx)
    /// File not found
    E0501,
    /// Permission denied
    E0502,

    // Lock errors (E06xx)
    /// Lock snapshot invalid
    E0601,

    // Source control errors (E09xx)
    /// Source-control resolution failed
    E0901,

    // Configuration errors (E11xx)
    /// Invalid configuration
    E1101,

    // Platform errors (E12xx)
    /// Unsupported platform
    E1201,

    // Environment errors (E13xx)
    /// Package not installed
    E1301,
    /// Package owned by the other ecosystem
    E1302,
    /// Python runtime missing from the environment
    E1303,
    /// Package is a dependency of another installed package
    E1304,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::E0101 => "E0101",
            Self::E0102 => "E0102",
            Self::E0103 => "E0103",
            Self::E0105 => "E0105",
            Self::E0201 => "E0201",
            Self::E0301 => "E0301",
            Self::E0302 => "E0302",
            Self::E0303 => "E0303",
            Self::E0304 => "E0304",
            Self::E0403 => "E0403",
            Self::E0404 => "E0404",
            Self::E0501 => "E0501",
            Self::E0502 => "E0502",
            Self::E0601 => "E0601",
            Self::E0901 => "E0901",
            Self::E1101 => "E1101",
            Self::E1201 => "E1201",
            Self::E1301 => "E1301",
            Self::E1302 => "E1302",
            Self::E1303 => "E1303",
            Self::E1304 => "E1304",
        }
    }

    /// Get a brief title for this error code.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::E0101 => "Package not found",
            Self::E0102 => "Version not satisfiable",
            Self::E0103 => "Invalid requirement",
            Self::E0105 => "No compatible artifact",
            Self::E0201 => "Solve failed",
            Self::E0301 => "Network error",
            Self::E0302 => "Service unreachable",
            Self::E0303 => "Authentication failed",
            Self::E0304 => "Rate limited",
            Self::E0403 => "JSON syntax error",
            Self::E0404 => "Invalid version constraint",
            Self::E0501 => "File not found",
            Self::E0502 => "Permission denied",
            Self::E0601 => "Invalid lock snapshot",
            Self::E0901 => "Source control error",
            Self::E1101 => "Invalid configuration",
            Self::E1201 => "Unsupported platform",
            Self::E1301 => "Not installed",
            Self::E1302 => "Owned by other ecosystem",
            Self::E1303 => "Python missing",
            Self::E1304 => "Required dependency",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for tandem.
#[derive(Error, Debug)]
pub enum Error {
    /// Package not found.
    #[error("[{code}] package '{name}' not found")]
    PackageNotFound {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Package name.
        name: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Version not satisfiable.
    #[error("[{code}] no version of '{name}' satisfies '{constraint}'")]
    VersionNotFound {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Package name.
        name: String,
        /// Version constraint.
        constraint: String,
        /// Available versions, ascending.
        available_versions: Vec<String>,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// No artifact for the target.
    #[error("[{code}] {message}")]
    ArtifactUnavailable {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Package name.
        name: String,
        /// Target platform.
        platform: String,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Requirement or constraint could not be parsed.
    #[error("[{code}] invalid requirement '{requirement}': {message}")]
    InvalidRequirement {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// The requirement as written.
        requirement: String,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Primary solve failed.
    #[error("[{code}] solve failed: {message}")]
    Resolution {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Network error.
    #[error("[{code}] network error: {message}")]
    Network {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Error message.
        message: String,
        /// URL that failed (if applicable).
        url: Option<String>,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Source-control resolution error.
    #[error("[{code}] source control error: {message}")]
    Vcs {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Error message.
        message: String,
        /// Repository reference.
        repository: Option<String>,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// JSON error.
    #[error("[E0403] json error: {0}")]
    Json(#[from] sonic_rs::Error),

    /// IO error.
    #[error("[{code}] io error at {path}: {message}")]
    Io {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Lock snapshot error.
    #[error("[{code}] lock error: {message}")]
    Lockfile {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Configuration error.
    #[error("[{code}] config error: {message}")]
    Config {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Error message.
        message: String,
        /// Configuration key.
        key: Option<String>,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Platform not supported.
    #[error("[{code}] unsupported platform: {message}")]
    UnsupportedPlatform {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Environment operation refused.
    #[error("[{code}] {message}")]
    Environment {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Package the operation was about, if any.
        package: Option<String>,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },
}

/// Wrapper to make `ErrorCode` usable as a source.
#[derive(Debug)]
pub struct ErrorCodeSource(pub ErrorCode);

impl fmt::Display for ErrorCodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_str())
    }
}

impl std::error::Error for ErrorCodeSource {}

impl Error {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::PackageNotFound { code, .. }
            | Self::VersionNotFound { code, .. }
            | Self::ArtifactUnavailable { code, .. }
            | Self::InvalidRequirement { code, .. }
            | Self::Resolution { code, .. }
            | Self::Network { code, .. }
            | Self::Vcs { code, .. }
            | Self::Io { code, .. }
            | Self::Lockfile { code, .. }
            | Self::Config { code, .. }
            | Self::UnsupportedPlatform { code, .. }
            | Self::Environment { code, .. } => code.0,
            Self::Json(_) => ErrorCode::E0403,
        }
    }

    /// Get suggestions for fixing this error.
    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::PackageNotFound { suggestions, .. }
            | Self::VersionNotFound { suggestions, .. }
            | Self::ArtifactUnavailable { suggestions, .. }
            | Self::InvalidRequirement { suggestions, .. }
            | Self::Resolution { suggestions, .. }
            | Self::Network { suggestions, .. }
            | Self::Vcs { suggestions, .. }
            | Self::Io { suggestions, .. }
            | Self::Lockfile { suggestions, .. }
            | Self::Config { suggestions, .. }
            | Self::UnsupportedPlatform { suggestions, .. }
            | Self::Environment { suggestions, .. } => suggestions,
            Self::Json(_) => &[],
        }
    }

    /// Create an IO error with context.
    #[must_use]
    #[allow(clippy::needless_pass_by_value)]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let (code, suggestions) = match err.kind() {
            std::io::ErrorKind::PermissionDenied => (
                ErrorCode::E0502,
                vec![format!("Check permissions on: {}", path.display())],
            ),
            _ => (
                ErrorCode::E0501,
                vec![format!("Check if the path exists: {}", path.display())],
            ),
        };
        Self::Io {
            code: ErrorCodeSource(code),
            path,
            message: err.to_string(),
            suggestions,
        }
    }

    /// Create a package not found error with suggestions.
    #[must_use]
    pub fn package_not_found(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::PackageNotFound {
            code: ErrorCodeSource(ErrorCode::E0101),
            suggestions: vec![
                "Check the package name for typos".to_string(),
                format!("Verify the package exists: https://pypi.org/project/{name}/"),
            ],
            name,
        }
    }

    /// Create a version not found error with suggestions.
    ///
    /// `available` is expected in ascending version order.
    #[must_use]
    pub fn version_not_found(
        name: impl Into<String>,
        constraint: impl Into<String>,
        available: Vec<String>,
    ) -> Self {
        let name = name.into();
        let constraint = constraint.into();
        let mut suggestions = vec![
            format!("Try a less restrictive constraint (current: {constraint})"),
            format!("Available versions: {}", available.join(", ")),
        ];
        if let Some(latest) = available.last() {
            suggestions.insert(0, format!("Latest available version: {latest}"));
        }
        Self::VersionNotFound {
            code: ErrorCodeSource(ErrorCode::E0102),
            name,
            constraint,
            available_versions: available,
            suggestions,
        }
    }

    /// Create an artifact unavailable error.
    #[must_use]
    pub fn artifact_unavailable(
        name: impl Into<String>,
        platform: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let platform = platform.into();
        Self::ArtifactUnavailable {
            code: ErrorCodeSource(ErrorCode::E0105),
            name: name.into(),
            message: message.into(),
            suggestions: vec![
                format!("Check which wheels are published for platform '{platform}'"),
                "Pin an older version that ships a compatible wheel".to_string(),
            ],
            platform,
        }
    }

    /// Create an invalid requirement error.
    #[must_use]
    pub fn invalid_requirement(requirement: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequirement {
            code: ErrorCodeSource(ErrorCode::E0103),
            requirement: requirement.into(),
            message: message.into(),
            suggestions: vec!["Requirements look like 'name[extra]>=1.0,<2.0'".to_string()],
        }
    }

    /// Create an invalid constraint error.
    #[must_use]
    pub fn invalid_constraint(constraint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequirement {
            code: ErrorCodeSource(ErrorCode::E0404),
            requirement: constraint.into(),
            message: message.into(),
            suggestions: vec![
                "Supported operators: ==, ===, !=, ~=, >=, <=, >, <".to_string(),
            ],
        }
    }

    /// Create a solve error.
    #[must_use]
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::Resolution {
            code: ErrorCodeSource(ErrorCode::E0201),
            message: message.into(),
            suggestions: vec![
                "Check the requested specs for conflicting pins".to_string(),
                "Verify the configured channels carry the requested packages".to_string(),
            ],
        }
    }

    /// Create a network error with suggestions.
    #[must_use]
    pub fn network(message: impl Into<String>, url: Option<String>) -> Self {
        let message = message.into();
        let mut suggestions = vec!["Check your internet connection".to_string()];
        if let Some(ref u) = url {
            suggestions.push(format!("Try accessing {u} in a browser"));
        }
        if message.contains("timeout") {
            suggestions.push("Try increasing the HTTP timeout in tandem.json".to_string());
        }
        let code = if message.contains("auth") {
            ErrorCode::E0303
        } else if message.contains("rate") {
            ErrorCode::E0304
        } else if message.contains("unreachable") || message.contains("unavailable") {
            ErrorCode::E0302
        } else {
            ErrorCode::E0301
        };
        Self::Network {
            code: ErrorCodeSource(code),
            message,
            url,
            suggestions,
        }
    }

    /// Create a source-control error.
    #[must_use]
    pub fn vcs(message: impl Into<String>, repository: Option<String>) -> Self {
        let mut suggestions = vec!["Verify the repository and reference exist".to_string()];
        if repository.is_some() {
            suggestions.push(
                "Set TANDEM_GITHUB_TOKEN if the repository is private or rate limited".to_string(),
            );
        }
        Self::Vcs {
            code: ErrorCodeSource(ErrorCode::E0901),
            message: message.into(),
            repository,
            suggestions,
        }
    }

    /// Create a lock snapshot error.
    #[must_use]
    pub fn lockfile(message: impl Into<String>) -> Self {
        Self::Lockfile {
            code: ErrorCodeSource(ErrorCode::E0601),
            message: message.into(),
            suggestions: vec!["Recreate the environment to regenerate its lock".to_string()],
        }
    }

    /// Create a config error.
    #[must_use]
    pub fn config(message: impl Into<String>, key: Option<String>) -> Self {
        Self::Config {
            code: ErrorCodeSource(ErrorCode::E1101),
            message: message.into(),
            key,
            suggestions: vec!["Check tandem.json and TANDEM_* variables".to_string()],
        }
    }

    /// Create an unsupported platform error.
    #[must_use]
    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            code: ErrorCodeSource(ErrorCode::E1201),
            message: message.into(),
            suggestions: vec![
                "Supported platforms include linux-64, osx-arm64, win-64 and emscripten-wasm32"
                    .to_string(),
            ],
        }
    }

    /// Create an environment error for a package that is not installed.
    #[must_use]
    pub fn not_installed(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Environment {
            code: ErrorCodeSource(ErrorCode::E1301),
            package: Some(package.into()),
            message: message.into(),
            suggestions: vec!["List installed packages to check the name".to_string()],
        }
    }

    /// Create an environment error for a package owned by the other ecosystem.
    #[must_use]
    pub fn owned_elsewhere(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Environment {
            code: ErrorCodeSource(ErrorCode::E1302),
            package: Some(package.into()),
            message: message.into(),
            suggestions: vec![
                "Remove it with the tool that installed it".to_string(),
            ],
        }
    }

    /// Create an environment error for a package other packages depend on.
    #[must_use]
    pub fn required_dependency(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Environment {
            code: ErrorCodeSource(ErrorCode::E1304),
            package: Some(package.into()),
            message: message.into(),
            suggestions: vec!["Remove the packages that depend on it first".to_string()],
        }
    }

    /// Create an environment error for a missing Python runtime.
    #[must_use]
    pub fn missing_python(message: impl Into<String>) -> Self {
        Self::Environment {
            code: ErrorCodeSource(ErrorCode::E1303),
            package: Some("python".to_string()),
            message: message.into(),
            suggestions: vec!["Add 'python' to the environment specs".to_string()],
        }
    }

    /// Format the error with suggestions for display.
    #[must_use]
    pub fn display_with_suggestions(&self) -> String {
        let mut output = format!("{self}");
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\n\nSuggestions:");
            for suggestion in suggestions {
                output.push_str(&format!("\n  • {suggestion}"));
            }
        }
        output
    }
}

/// Result type for tandem operations.
pub type Result<T> = std::result::Result<T, Error>;
