//! Provider-specific detectors

mod buildkite;
mod circleci;
mod gcp;
mod github;
mod gitlab;

pub use buildkite::Buildkite;
pub use circleci::CircleCi;
pub use gcp::Gcp;
pub use github::GitHubActions;
pub use gitlab::{audience_variable, GitLab};

use std::io;

use crate::ambient::Context;
use crate::credential::{Credential, Provider};
use crate::error::{Error, Result};

/// Send `request` and return the response if it has a success status
///
/// `what` names the request in error messages, e.g. `"OIDC token"`.
pub(crate) async fn send(
    provider: Provider,
    what: &str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response> {
    let response = request
        .send()
        .await
        .map_err(|e| request_error(provider, what, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::ambient(
            provider,
            format!(
                "{} request failed (code={}, body='{}')",
                what,
                status.as_u16(),
                body
            ),
        ));
    }

    Ok(response)
}

/// Read a response body, keeping timeouts distinguishable
pub(crate) async fn body_text(
    provider: Provider,
    what: &str,
    response: reqwest::Response,
) -> Result<String> {
    response
        .text()
        .await
        .map_err(|e| request_error(provider, what, e))
}

fn request_error(provider: Provider, what: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::ambient(provider, format!("{} request timed out", what))
    } else {
        Error::ambient(provider, format!("{} request failed: {}", what, err))
    }
}

/// A CI agent CLI that prints an OIDC token on stdout
pub(crate) struct Agent {
    pub provider: Provider,
    /// Executable looked up on `PATH`
    pub program: &'static str,
    /// How the tool is named in error messages
    pub label: &'static str,
    /// Error message when the executable is missing
    pub not_found: &'static str,
}

impl Agent {
    /// Run the agent with `args` and turn its output into a credential
    pub(crate) async fn request_token(&self, ctx: &Context<'_>, args: Vec<String>) -> Result<Credential> {
        let path = ctx
            .env
            .which(self.program)
            .ok_or_else(|| Error::ambient(self.provider, self.not_found))?;

        tracing::debug!("{}: requesting OIDC token from {}", self.provider, path.display());

        let output = ctx
            .runner
            .run(&path, &args, ctx.config.timeout)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::TimedOut => Error::ambient(
                    self.provider,
                    format!("{} timed out after {:?}", self.label, ctx.config.timeout),
                ),
                _ => Error::ambient(self.provider, format!("failed to run {}: {}", self.label, e)),
            })?;

        if !output.success {
            return Err(Error::ambient(
                self.provider,
                format!(
                    "{} encountered an error: {}",
                    self.label,
                    output.stdout.trim_end()
                ),
            ));
        }

        Credential::new(self.provider, &output.stdout)
    }
}
