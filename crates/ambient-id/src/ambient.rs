//! Ambient credential detection
//!
//! An [`AmbientDetector`] holds an ordered list of [`Detector`]s, one per
//! provider, and asks each in turn for a token. Every detector reports one of
//! three outcomes:
//!
//! - `Ok(Some(credential))`: the environment matched and a token was issued.
//! - `Ok(None)`: the environment does not belong to this provider.
//! - `Err(error)`: the environment matched but the token could not be
//!   retrieved.
//!
//! The first credential wins. An error stops detection immediately, since a
//! recognized but broken environment is a configuration problem the caller
//! must see rather than a reason to try the next provider.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DetectConfig;
use crate::credential::{Credential, Provider};
use crate::environment::{Environment, SystemEnvironment};
use crate::error::Result;
use crate::process::{CommandRunner, TokioCommandRunner};
use crate::providers::{Buildkite, CircleCi, Gcp, GitHubActions, GitLab};

/// Future returned by [`Detector::detect`]
pub type DetectFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<Credential>>> + Send + 'a>>;

/// Collaborators available to a detector during one detection attempt
#[derive(Clone, Copy)]
pub struct Context<'a> {
    /// Environment variables, files and `PATH` lookups
    pub env: &'a dyn Environment,
    /// Subprocess execution
    pub runner: &'a dyn CommandRunner,
    /// HTTP client
    pub client: &'a reqwest::Client,
    /// Timeouts and endpoints
    pub config: &'a DetectConfig,
}

/// A provider-specific ambient credential probe
pub trait Detector: Send + Sync {
    /// The provider this detector recognizes
    fn provider(&self) -> Provider;

    /// Try to obtain a token for `audience`
    ///
    /// Returns `Ok(None)` when the environment does not belong to this
    /// provider and `Err(..)` when it does but retrieval failed.
    fn detect<'a>(&'a self, ctx: &'a Context<'a>, audience: &'a str) -> DetectFuture<'a>;
}

/// The built-in detectors, in detection order
pub fn default_detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(GitHubActions),
        Box::new(Gcp),
        Box::new(Buildkite),
        Box::new(GitLab),
        Box::new(CircleCi),
    ]
}

/// Detects an OIDC token from the ambient environment
///
/// # Example
///
/// ```no_run
/// use ambient_id::{AmbientDetector, DetectConfig};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), ambient_id::Error> {
/// let detector = AmbientDetector::with_config(
///     DetectConfig::default().with_timeout(Duration::from_secs(10)),
/// );
///
/// match detector.detect("sigstore").await? {
///     Some(credential) => println!("got a token from {}", credential.provider()),
///     None => println!("no ambient credential available"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct AmbientDetector {
    env: Arc<dyn Environment>,
    runner: Arc<dyn CommandRunner>,
    client: reqwest::Client,
    config: DetectConfig,
    detectors: Vec<Box<dyn Detector>>,
}

impl Default for AmbientDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl AmbientDetector {
    /// Create a detector for the current process with default settings
    pub fn new() -> Self {
        Self::with_config(DetectConfig::default())
    }

    /// Create a detector for the current process with `config`
    pub fn with_config(config: DetectConfig) -> Self {
        Self {
            env: Arc::new(SystemEnvironment),
            runner: Arc::new(TokioCommandRunner),
            client: reqwest::Client::new(),
            config,
            detectors: default_detectors(),
        }
    }

    /// Use a different environment
    pub fn environment(mut self, env: impl Environment + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Use a different subprocess runner
    pub fn command_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    /// Use a preconfigured HTTP client
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Replace the detector list
    pub fn detectors(mut self, detectors: Vec<Box<dyn Detector>>) -> Self {
        self.detectors = detectors;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    /// Try each detector in order, returning the first credential found
    ///
    /// Returns `Ok(None)` when no detector recognizes the environment. An
    /// error from any detector is returned as-is and no later detector runs.
    pub async fn detect(&self, audience: &str) -> Result<Option<Credential>> {
        let ctx = Context {
            env: self.env.as_ref(),
            runner: self.runner.as_ref(),
            client: &self.client,
            config: &self.config,
        };

        for detector in &self.detectors {
            if let Some(credential) = detector.detect(&ctx, audience).await? {
                tracing::debug!("{}: found ambient OIDC credential", detector.provider());
                return Ok(Some(credential));
            }
        }

        tracing::debug!("no ambient OIDC credential found");
        Ok(None)
    }
}

/// Detect an ambient OIDC token for `audience` with the default timeout
///
/// Returns `Ok(None)` if no supported environment was recognized.
pub async fn detect_credential(audience: &str) -> Result<Option<String>> {
    detect_with(AmbientDetector::new(), audience).await
}

/// Detect an ambient OIDC token for `audience`, bounding each request by `timeout`
pub async fn detect_credential_with_timeout(
    audience: &str,
    timeout: Duration,
) -> Result<Option<String>> {
    let config = DetectConfig::default().with_timeout(timeout);
    detect_with(AmbientDetector::with_config(config), audience).await
}

async fn detect_with(detector: AmbientDetector, audience: &str) -> Result<Option<String>> {
    Ok(detector
        .detect(audience)
        .await?
        .map(Credential::into_inner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::FixedEnvironment;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Outcome {
        Found,
        Absent,
        Failed,
    }

    struct Scripted {
        provider: Provider,
        outcome: Outcome,
        calls: Arc<AtomicUsize>,
    }

    impl Detector for Scripted {
        fn provider(&self) -> Provider {
            self.provider
        }

        fn detect<'a>(&'a self, _ctx: &'a Context<'a>, audience: &'a str) -> DetectFuture<'a> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                match self.outcome {
                    Outcome::Found => Credential::new(self.provider, format!("jwt-for-{}", audience))
                        .map(Some),
                    Outcome::Absent => Ok(None),
                    Outcome::Failed => Err(Error::ambient(self.provider, "broken")),
                }
            })
        }
    }

    fn scripted(outcomes: &[Outcome]) -> (Vec<Box<dyn Detector>>, Vec<Arc<AtomicUsize>>) {
        let counters: Vec<_> = outcomes.iter().map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let detectors = outcomes
            .iter()
            .zip(Provider::ALL)
            .zip(&counters)
            .map(|((outcome, provider), calls)| {
                Box::new(Scripted {
                    provider,
                    outcome: *outcome,
                    calls: calls.clone(),
                }) as Box<dyn Detector>
            })
            .collect();
        (detectors, counters)
    }

    fn calls(counters: &[Arc<AtomicUsize>]) -> Vec<usize> {
        counters.iter().map(|c| c.load(Ordering::SeqCst)).collect()
    }

    fn detector(detectors: Vec<Box<dyn Detector>>) -> AmbientDetector {
        AmbientDetector::new()
            .environment(FixedEnvironment::new())
            .detectors(detectors)
    }

    #[tokio::test]
    async fn test_all_absent_yields_none() {
        let (detectors, counters) = scripted(&[Outcome::Absent; 5]);
        let result = detector(detectors).detect("some-audience").await.unwrap();
        assert!(result.is_none());
        assert_eq!(calls(&counters), vec![1, 1, 1, 1, 1]);
    }

    #[tokio::test]
    async fn test_first_found_stops_detection() {
        let (detectors, counters) = scripted(&[
            Outcome::Absent,
            Outcome::Absent,
            Outcome::Found,
            Outcome::Found,
            Outcome::Failed,
        ]);
        let credential = detector(detectors)
            .detect("some-audience")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credential.as_str(), "jwt-for-some-audience");
        assert_eq!(credential.provider(), Provider::Buildkite);
        assert_eq!(calls(&counters), vec![1, 1, 1, 0, 0]);
    }

    #[tokio::test]
    async fn test_failure_propagates_without_fallthrough() {
        let (detectors, counters) = scripted(&[
            Outcome::Absent,
            Outcome::Failed,
            Outcome::Found,
            Outcome::Absent,
            Outcome::Absent,
        ]);
        let err = detector(detectors)
            .detect("some-audience")
            .await
            .unwrap_err();
        assert!(err.is_ambient_credential());
        assert_eq!(err.provider(), Some(Provider::Gcp));
        assert_eq!(calls(&counters), vec![1, 1, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_empty_environment_yields_none() {
        let detector = AmbientDetector::new().environment(FixedEnvironment::new());
        assert!(detector.detect("some-audience").await.unwrap().is_none());
    }

    #[test]
    fn test_default_detector_order() {
        let providers: Vec<_> = default_detectors().iter().map(|d| d.provider()).collect();
        assert_eq!(providers, Provider::ALL.to_vec());
    }
}
