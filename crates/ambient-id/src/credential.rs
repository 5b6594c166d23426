//! Credential and provider types

use std::fmt;

use crate::error::{Error, Result};

/// An ambient credential provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// GitHub Actions
    GitHubActions,
    /// Google Cloud Platform (metadata service or impersonation)
    Gcp,
    /// Buildkite
    Buildkite,
    /// GitLab CI/CD
    GitLab,
    /// CircleCI
    CircleCi,
}

impl Provider {
    /// Every provider, in detection order
    pub const ALL: [Provider; 5] = [
        Provider::GitHubActions,
        Provider::Gcp,
        Provider::Buildkite,
        Provider::GitLab,
        Provider::CircleCi,
    ];

    /// Human readable name, used as the prefix of log lines and errors
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::GitHubActions => "GitHub",
            Provider::Gcp => "GCP",
            Provider::Buildkite => "Buildkite",
            Provider::GitLab => "GitLab",
            Provider::CircleCi => "CircleCI",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw OIDC token obtained from the environment
///
/// The token is opaque and never parsed or verified here. A credential is
/// never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    provider: Provider,
}

impl Credential {
    /// Wrap a token returned by `provider`
    ///
    /// Surrounding whitespace is trimmed; an empty token is reported as an
    /// ambient credential error for that provider.
    pub fn new(provider: Provider, token: impl AsRef<str>) -> Result<Self> {
        let token = token.as_ref().trim();
        if token.is_empty() {
            return Err(Error::ambient(provider, "empty OIDC token returned"));
        }
        Ok(Self {
            token: token.to_string(),
            provider,
        })
    }

    /// The raw token string
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// The provider that produced this token
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Consume the credential, returning the raw token
    pub fn into_inner(self) -> String {
        self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl AsRef<str> for Credential {
    fn as_ref(&self) -> &str {
        &self.token
    }
}
