//! Ambient OIDC credential detection
//!
//! This crate discovers a short-lived OIDC identity token from the
//! environment a process runs in, such as a CI/CD job or a cloud compute
//! instance, without the caller managing long-lived credentials.
//!
//! Supported providers, in detection order:
//!
//! - GitHub Actions (OIDC token endpoint)
//! - Google Cloud Platform (metadata service, or service account impersonation)
//! - Buildkite (`buildkite-agent`)
//! - GitLab CI/CD (`<AUDIENCE>_ID_TOKEN` variables)
//! - CircleCI (`circleci`)
//!
//! Tokens are returned as opaque strings; nothing here parses or verifies them.
//!
//! # Example
//!
//! ```no_run
//! # async fn example() -> Result<(), ambient_id::Error> {
//! if let Some(token) = ambient_id::detect_credential("sigstore").await? {
//!     println!("{}", token);
//! }
//! # Ok(())
//! # }
//! ```

pub mod ambient;
pub mod config;
pub mod credential;
pub mod environment;
pub mod error;
pub mod process;
pub mod providers;

pub use ambient::{
    default_detectors, detect_credential, detect_credential_with_timeout, AmbientDetector,
    Context, DetectFuture, Detector,
};
pub use config::{vars, DetectConfig, DEFAULT_TIMEOUT};
pub use credential::{Credential, Provider};
pub use environment::{Environment, FixedEnvironment, SystemEnvironment};
pub use error::{Error, Result};
pub use process::{CommandFuture, CommandOutput, CommandRunner, TokioCommandRunner};
pub use providers::{audience_variable, Buildkite, CircleCi, Gcp, GitHubActions, GitLab};
