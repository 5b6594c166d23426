//! Google Cloud Platform
//!
//! Two flows are supported:
//!
//! - **Impersonation**, when `GOOGLE_SERVICE_ACCOUNT_NAME` is set: an access
//!   token for the instance's own service account is exchanged at the IAM
//!   credentials service for an ID token of the named account.
//! - **Metadata identity**, otherwise: on a GCE machine the metadata service
//!   issues an ID token for the instance's service account directly.

use serde::{Deserialize, Serialize};

use super::{body_text, send};
use crate::ambient::{Context, DetectFuture, Detector};
use crate::config::vars;
use crate::credential::{Credential, Provider};
use crate::error::{Error, Result};

const PROVIDER: Provider = Provider::Gcp;

/// Scope requested for the impersonation access token
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Product names reported by GCE machines
const GCP_PRODUCT_NAMES: &[&str] = &["Google Compute Engine", "Google"];

const METADATA_FLAVOR: &str = "Metadata-Flavor";

/// Detects tokens on GCP compute or through service account impersonation
#[derive(Debug, Clone, Copy, Default)]
pub struct Gcp;

impl Detector for Gcp {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn detect<'a>(&'a self, ctx: &'a Context<'a>, audience: &'a str) -> DetectFuture<'a> {
        Box::pin(detect(ctx, audience))
    }
}

/// OAuth access token for the instance's default service account
///
/// Only exists between the two impersonation requests.
struct AccessToken(String);

#[derive(Deserialize)]
struct AccessTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateIdTokenRequest<'a> {
    audience: &'a str,
    include_email: bool,
}

#[derive(Deserialize)]
struct GenerateIdTokenResponse {
    #[serde(default)]
    token: Option<String>,
}

async fn detect(ctx: &Context<'_>, audience: &str) -> Result<Option<Credential>> {
    tracing::debug!("GCP: looking for OIDC credentials");

    if let Some(service_account) = ctx.env.non_empty_var(vars::GOOGLE_SERVICE_ACCOUNT_NAME) {
        tracing::debug!("GCP: GOOGLE_SERVICE_ACCOUNT_NAME set; attempting impersonation");

        let access_token = request_access_token(ctx).await?;
        let credential = generate_id_token(ctx, &access_token, &service_account, audience).await?;

        tracing::debug!("GCP: successfully requested OIDC token");
        return Ok(Some(credential));
    }

    tracing::debug!("GCP: GOOGLE_SERVICE_ACCOUNT_NAME not set; skipping impersonation");

    let product_name = match ctx.env.read_to_string(&ctx.config.gcp_product_name_path) {
        Ok(name) => name,
        Err(_) => {
            tracing::debug!("GCP: environment doesn't have GCP product name file; giving up");
            return Ok(None);
        }
    };
    let product_name = product_name.trim();

    if !is_gcp_product(product_name) {
        tracing::debug!(
            "GCP: product name file exists, but product name is '{}'; giving up",
            product_name
        );
        return Ok(None);
    }

    tracing::debug!("GCP: requesting OIDC token");
    let url = format!(
        "{}/instance/service-accounts/default/identity",
        ctx.config.gcp_metadata_url
    );
    let request = ctx
        .client
        .get(&url)
        .query(&[("audience", audience), ("format", "full")])
        .header(METADATA_FLAVOR, "Google")
        .timeout(ctx.config.timeout);

    let response = send(PROVIDER, "OIDC token", request).await?;
    let token = body_text(PROVIDER, "OIDC token", response).await?;

    tracing::debug!("GCP: successfully requested OIDC token");
    Credential::new(PROVIDER, token).map(Some)
}

fn is_gcp_product(name: &str) -> bool {
    GCP_PRODUCT_NAMES
        .iter()
        .any(|known| name.starts_with(known))
}

/// First impersonation step: an access token from the metadata service
async fn request_access_token(ctx: &Context<'_>) -> Result<AccessToken> {
    tracing::debug!("GCP: requesting access token");

    let url = format!(
        "{}/instance/service-accounts/default/token",
        ctx.config.gcp_metadata_url
    );
    let request = ctx
        .client
        .get(&url)
        .query(&[("scopes", CLOUD_PLATFORM_SCOPE)])
        .header(METADATA_FLAVOR, "Google")
        .timeout(ctx.config.timeout);

    let response = send(PROVIDER, "access token", request).await?;
    let body = body_text(PROVIDER, "access token", response).await?;

    serde_json::from_str::<AccessTokenResponse>(&body)
        .ok()
        .and_then(|r| r.access_token)
        .filter(|token| !token.is_empty())
        .map(AccessToken)
        .ok_or_else(|| Error::ambient(PROVIDER, "access token missing from response"))
}

/// Second impersonation step: exchange the access token for an ID token
async fn generate_id_token(
    ctx: &Context<'_>,
    access_token: &AccessToken,
    service_account: &str,
    audience: &str,
) -> Result<Credential> {
    tracing::debug!("GCP: requesting OIDC token");

    let url = format!(
        "{}/v1/projects/-/serviceAccounts/{}:generateIdToken",
        ctx.config.gcp_iam_credentials_url, service_account
    );
    let request = ctx
        .client
        .post(&url)
        .bearer_auth(&access_token.0)
        .json(&GenerateIdTokenRequest {
            audience,
            include_email: true,
        })
        .timeout(ctx.config.timeout);

    let response = send(PROVIDER, "OIDC token", request).await?;
    let body = body_text(PROVIDER, "OIDC token", response).await?;

    let token = serde_json::from_str::<GenerateIdTokenResponse>(&body)
        .ok()
        .and_then(|r| r.token)
        .ok_or_else(|| Error::ambient(PROVIDER, "OIDC token missing from response"))?;

    Credential::new(PROVIDER, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_gcp_product() {
        assert!(is_gcp_product("Google"));
        assert!(is_gcp_product("Google Compute Engine"));
        assert!(!is_gcp_product("Unsupported Product"));
        assert!(!is_gcp_product("google"));
        assert!(!is_gcp_product(""));
    }

    #[test]
    fn test_generate_id_token_request_body() {
        let body = serde_json::to_value(GenerateIdTokenRequest {
            audience: "some-audience",
            include_email: true,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"audience": "some-audience", "includeEmail": true})
        );
    }
}
