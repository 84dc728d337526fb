//! Repository error types.

use tandem_resolver::FetchError;
use thiserror::Error;

/// Errors raised by the metadata clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// HTTP request failed.
    #[error("request to {url} failed: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
        /// HTTP status, when a response was received.
        status: Option<u16>,
    },

    /// The server asked us to slow down.
    #[error("rate limited by {url}")]
    RateLimited {
        /// Requested URL.
        url: String,
        /// `Retry-After` in seconds.
        retry_after: Option<u64>,
    },

    /// Authentication is required.
    #[error("authentication required for {url}")]
    AuthRequired {
        /// Requested URL.
        url: String,
    },

    /// Credentials were rejected.
    #[error("authentication failed for {url}: {message}")]
    AuthFailed {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The request timed out.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// The host could not be reached.
    #[error("{url} is unavailable: {message}")]
    Unavailable {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// A URL could not be built.
    #[error("invalid URL {url}: {message}")]
    InvalidUrl {
        /// The URL or fragment.
        url: String,
        /// Error message.
        message: String,
    },

    /// Client construction failed.
    #[error("invalid client configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    /// A response could not be decoded.
    #[error("failed to parse response from {location}: {message}")]
    ParseError {
        /// URL or file the data came from.
        location: String,
        /// Error message.
        message: String,
    },

    /// No project descriptor could be read from a repository.
    #[error("no readable project descriptor in {repository} at {reference} (tried {tried})")]
    NoDescriptor {
        /// `owner/repo`.
        repository: String,
        /// Reference probed.
        reference: String,
        /// Descriptor files tried, comma separated.
        tried: String,
    },
}

impl RepositoryError {
    /// Whether retrying the request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { status: Some(code), .. } if *code >= 500)
            || matches!(
                self,
                Self::RateLimited { .. } | Self::Timeout { .. } | Self::Unavailable { .. }
            )
    }

    /// Whether the server answered 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Network { status: Some(404), .. })
    }

    pub(crate) fn parse(location: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::ParseError {
            location: location.into(),
            message: err.to_string(),
        }
    }
}

impl From<RepositoryError> for FetchError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Network {
                url,
                status: Some(404),
                ..
            } => Self::NotFound { name: url },
            RepositoryError::ParseError { .. } | RepositoryError::NoDescriptor { .. } => {
                Self::Invalid {
                    message: err.to_string(),
                }
            }
            other => Self::Transport {
                message: other.to_string(),
            },
        }
    }
}

impl From<RepositoryError> for tandem_core::Error {
    fn from(err: RepositoryError) -> Self {
        let url = match &err {
            RepositoryError::Network { url, .. }
            | RepositoryError::RateLimited { url, .. }
            | RepositoryError::AuthRequired { url }
            | RepositoryError::AuthFailed { url, .. }
            | RepositoryError::Timeout { url, .. }
            | RepositoryError::Unavailable { url, .. }
            | RepositoryError::InvalidUrl { url, .. } => Some(url.clone()),
            _ => None,
        };
        match &err {
            RepositoryError::NoDescriptor { repository, .. } => {
                Self::vcs(err.to_string(), Some(repository.clone()))
            }
            RepositoryError::AuthRequired { .. } | RepositoryError::AuthFailed { .. } => {
                Self::network(format!("auth: {err}"), url)
            }
            RepositoryError::RateLimited { .. } => Self::network(format!("rate limit: {err}"), url),
            _ => Self::network(err.to_string(), url),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::ErrorCode;

    #[test]
    fn retryable_classification() {
        let server = RepositoryError::Network {
            url: "https://pypi.org/pypi/six/json".into(),
            message: "Server error".into(),
            status: Some(503),
        };
        assert!(server.is_retryable());

        let missing = RepositoryError::Network {
            url: "https://pypi.org/pypi/nope/json".into(),
            message: "Not found".into(),
            status: Some(404),
        };
        assert!(!missing.is_retryable());
        assert!(missing.is_not_found());
        assert!(matches!(FetchError::from(missing), FetchError::NotFound { .. }));
    }

    #[test]
    fn core_error_codes() {
        let limited = RepositoryError::RateLimited {
            url: "https://api.github.com/".into(),
            retry_after: Some(60),
        };
        assert_eq!(tandem_core::Error::from(limited).code(), ErrorCode::E0304);

        let auth = RepositoryError::AuthRequired {
            url: "https://api.github.com/".into(),
        };
        assert_eq!(tandem_core::Error::from(auth).code(), ErrorCode::E0303);
    }
}
