//! GitHub Actions

use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use super::{body_text, send};
use crate::ambient::{Context, DetectFuture, Detector};
use crate::config::vars;
use crate::credential::{Credential, Provider};
use crate::error::{Error, Result};

/// Requests a token from the GitHub Actions OIDC endpoint
///
/// Requires the job to have the `id-token: write` permission, which is what
/// makes GitHub populate `ACTIONS_ID_TOKEN_REQUEST_TOKEN` and
/// `ACTIONS_ID_TOKEN_REQUEST_URL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubActions;

#[derive(Deserialize)]
struct TokenResponse {
    value: String,
}

impl Detector for GitHubActions {
    fn provider(&self) -> Provider {
        Provider::GitHubActions
    }

    fn detect<'a>(&'a self, ctx: &'a Context<'a>, audience: &'a str) -> DetectFuture<'a> {
        Box::pin(detect(ctx, audience))
    }
}

fn missing_permissions(var: &str) -> Error {
    Error::GitHubPermission {
        message: format!(
            "missing or insufficient OIDC token permissions, the {} environment variable was unset",
            var
        ),
    }
}

async fn detect(ctx: &Context<'_>, audience: &str) -> Result<Option<Credential>> {
    tracing::debug!("GitHub: looking for OIDC credentials");

    if ctx.env.non_empty_var(vars::GITHUB_ACTIONS).is_none() {
        tracing::debug!("GitHub: environment doesn't look like a GH action; giving up");
        return Ok(None);
    }

    let request_token = ctx
        .env
        .non_empty_var(vars::ACTIONS_ID_TOKEN_REQUEST_TOKEN)
        .ok_or_else(|| missing_permissions(vars::ACTIONS_ID_TOKEN_REQUEST_TOKEN))?;
    let request_url = ctx
        .env
        .non_empty_var(vars::ACTIONS_ID_TOKEN_REQUEST_URL)
        .ok_or_else(|| missing_permissions(vars::ACTIONS_ID_TOKEN_REQUEST_URL))?;

    tracing::debug!("GitHub: requesting OIDC token");
    let request = ctx
        .client
        .get(&request_url)
        .query(&[("audience", audience)])
        .header(AUTHORIZATION, format!("bearer {}", request_token))
        .timeout(ctx.config.timeout);

    let response = send(Provider::GitHubActions, "OIDC token", request).await?;
    let body = body_text(Provider::GitHubActions, "OIDC token", response).await?;

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|_| Error::ambient(Provider::GitHubActions, "malformed or incomplete JSON"))?;

    tracing::debug!("GitHub: successfully requested OIDC token");
    Credential::new(Provider::GitHubActions, token.value).map(Some)
}
