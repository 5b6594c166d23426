//! Error types for ambient-id

use crate::credential::Provider;
use thiserror::Error;

/// Errors that can occur while detecting an ambient credential
///
/// The variants form a small hierarchy: every error is an identity error,
/// [`Error::AmbientCredential`] and [`Error::GitHubPermission`] are ambient
/// credential errors, and [`Error::GitHubPermission`] refines the ambient case
/// for GitHub Actions jobs that lack the `id-token: write` permission.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed identity input or token content
    #[error("Identity error: {0}")]
    Identity(String),

    /// A provider was recognized but the credential could not be retrieved
    #[error("{provider}: {message}")]
    AmbientCredential {
        /// Provider whose environment was recognized
        provider: Provider,
        /// What went wrong
        message: String,
    },

    /// GitHub Actions is missing the OIDC request token or URL
    #[error("GitHub: {message}")]
    GitHubPermission {
        /// What went wrong
        message: String,
    },
}

impl Error {
    /// Create an ambient credential error for `provider`
    pub fn ambient(provider: Provider, message: impl Into<String>) -> Self {
        Error::AmbientCredential {
            provider,
            message: message.into(),
        }
    }

    /// Whether this error reports a recognized-but-broken environment
    pub fn is_ambient_credential(&self) -> bool {
        matches!(
            self,
            Error::AmbientCredential { .. } | Error::GitHubPermission { .. }
        )
    }

    /// Whether this error is the GitHub permissions refinement
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Error::GitHubPermission { .. })
    }

    /// The provider that raised this error, if any
    pub fn provider(&self) -> Option<Provider> {
        match self {
            Error::Identity(_) => None,
            Error::AmbientCredential { provider, .. } => Some(*provider),
            Error::GitHubPermission { .. } => Some(Provider::GitHubActions),
        }
    }
}

/// Result type for ambient credential operations
pub type Result<T> = std::result::Result<T, Error>;
