//! GitLab CI/CD
//!
//! GitLab injects ID tokens declared under a job's `id_tokens:` key as
//! environment variables. By convention the variable for an audience is the
//! audience upper-cased, with anything outside `[A-Z0-9_]` replaced by `_`
//! and suffixed with `_ID_TOKEN`.

use crate::ambient::{Context, DetectFuture, Detector};
use crate::config::vars;
use crate::credential::{Credential, Provider};
use crate::error::Error;

/// Reads a token from the job's `<AUDIENCE>_ID_TOKEN` variable
#[derive(Debug, Clone, Copy, Default)]
pub struct GitLab;

impl Detector for GitLab {
    fn provider(&self) -> Provider {
        Provider::GitLab
    }

    fn detect<'a>(&'a self, ctx: &'a Context<'a>, audience: &'a str) -> DetectFuture<'a> {
        Box::pin(async move {
            tracing::debug!("GitLab: looking for OIDC credentials");

            if ctx.env.non_empty_var(vars::GITLAB_CI).is_none() {
                tracing::debug!("GitLab: environment doesn't look like GitLab CI/CD; giving up");
                return Ok(None);
            }

            let name = audience_variable(audience);
            let token = ctx.env.non_empty_var(&name).ok_or_else(|| {
                Error::ambient(
                    Provider::GitLab,
                    format!("Environment variable {} not found", name),
                )
            })?;

            tracing::debug!("GitLab: Found token in environment variable {}", name);
            Credential::new(Provider::GitLab, token).map(Some)
        })
    }
}

/// Name of the environment variable holding the ID token for `audience`
///
/// ```
/// use ambient_id::audience_variable;
///
/// assert_eq!(audience_variable("sigstore"), "SIGSTORE_ID_TOKEN");
/// assert_eq!(audience_variable("11 other audience"), "_1_OTHER_AUDIENCE_ID_TOKEN");
/// ```
pub fn audience_variable(audience: &str) -> String {
    let mut name: String = audience
        .to_uppercase()
        .chars()
        .enumerate()
        .map(|(i, c)| match c {
            'A'..='Z' | '_' => c,
            // identifiers can't start with a digit
            '0'..='9' if i > 0 => c,
            _ => '_',
        })
        .collect();
    name.push_str("_ID_TOKEN");
    name
}
