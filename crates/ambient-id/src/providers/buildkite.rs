//! Buildkite

use super::Agent;
use crate::ambient::{Context, DetectFuture, Detector};
use crate::config::vars;
use crate::credential::Provider;

const AGENT: Agent = Agent {
    provider: Provider::Buildkite,
    program: "buildkite-agent",
    label: "the Buildkite agent",
    not_found: "could not find Buildkite agent in Buildkite environment",
};

/// Requests a token with `buildkite-agent oidc request-token`
#[derive(Debug, Clone, Copy, Default)]
pub struct Buildkite;

impl Detector for Buildkite {
    fn provider(&self) -> Provider {
        Provider::Buildkite
    }

    fn detect<'a>(&'a self, ctx: &'a Context<'a>, audience: &'a str) -> DetectFuture<'a> {
        Box::pin(async move {
            tracing::debug!("Buildkite: looking for OIDC credentials");

            if ctx.env.non_empty_var(vars::BUILDKITE).is_none() {
                tracing::debug!("Buildkite: environment doesn't look like BuildKite; giving up");
                return Ok(None);
            }

            let args = vec![
                "oidc".to_string(),
                "request-token".to_string(),
                "--audience".to_string(),
                audience.to_string(),
            ];
            AGENT.request_token(ctx, args).await.map(Some)
        })
    }
}
