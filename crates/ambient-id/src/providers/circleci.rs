//! CircleCI

use super::Agent;
use crate::ambient::{Context, DetectFuture, Detector};
use crate::config::vars;
use crate::credential::Provider;

const AGENT: Agent = Agent {
    provider: Provider::CircleCi,
    program: "circleci",
    label: "the `circleci` tool",
    not_found: "could not find `circleci` in the environment",
};

/// Requests a token with `circleci run oidc get`
#[derive(Debug, Clone, Copy, Default)]
pub struct CircleCi;

impl Detector for CircleCi {
    fn provider(&self) -> Provider {
        Provider::CircleCi
    }

    fn detect<'a>(&'a self, ctx: &'a Context<'a>, audience: &'a str) -> DetectFuture<'a> {
        Box::pin(async move {
            tracing::debug!("CircleCI: looking for OIDC credentials");

            if ctx.env.non_empty_var(vars::CIRCLECI).is_none() {
                tracing::debug!("CircleCI: environment doesn't look like CircleCI; giving up");
                return Ok(None);
            }

            let claims = serde_json::json!({ "aud": audience }).to_string();
            let args = vec![
                "run".to_string(),
                "oidc".to_string(),
                "get".to_string(),
                "--claims".to_string(),
                claims,
            ];
            AGENT.request_token(ctx, args).await.map(Some)
        })
    }
}
