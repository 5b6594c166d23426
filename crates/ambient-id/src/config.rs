//! Detection configuration

use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for every network request and CLI-agent invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Well-known environment variables consulted by the providers
pub mod vars {
    /// Set to `true` inside a GitHub Actions job
    pub const GITHUB_ACTIONS: &str = "GITHUB_ACTIONS";
    /// Bearer token for the GitHub Actions OIDC endpoint
    pub const ACTIONS_ID_TOKEN_REQUEST_TOKEN: &str = "ACTIONS_ID_TOKEN_REQUEST_TOKEN";
    /// URL of the GitHub Actions OIDC endpoint
    pub const ACTIONS_ID_TOKEN_REQUEST_URL: &str = "ACTIONS_ID_TOKEN_REQUEST_URL";
    /// Service account to impersonate on GCP
    pub const GOOGLE_SERVICE_ACCOUNT_NAME: &str = "GOOGLE_SERVICE_ACCOUNT_NAME";
    /// Set inside a Buildkite job
    pub const BUILDKITE: &str = "BUILDKITE";
    /// Set inside a GitLab CI/CD job
    pub const GITLAB_CI: &str = "GITLAB_CI";
    /// Set inside a CircleCI job
    pub const CIRCLECI: &str = "CIRCLECI";
}

/// Configuration shared by every provider
#[derive(Debug, Clone)]
pub struct DetectConfig {
    /// Timeout applied to each HTTP request and subprocess
    pub timeout: Duration,
    /// Base URL of the GCP instance metadata service
    pub gcp_metadata_url: String,
    /// Base URL of the GCP IAM credentials service
    pub gcp_iam_credentials_url: String,
    /// File identifying the machine's product name
    pub gcp_product_name_path: PathBuf,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            gcp_metadata_url: "http://metadata/computeMetadata/v1".to_string(),
            gcp_iam_credentials_url: "https://iamcredentials.googleapis.com".to_string(),
            gcp_product_name_path: PathBuf::from("/sys/class/dmi/id/product_name"),
        }
    }
}

impl DetectConfig {
    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the GCP metadata service base URL
    pub fn with_gcp_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.gcp_metadata_url = url.into();
        self
    }

    /// Override the GCP IAM credentials base URL
    pub fn with_gcp_iam_credentials_url(mut self, url: impl Into<String>) -> Self {
        self.gcp_iam_credentials_url = url.into();
        self
    }

    /// Override the path of the product name file
    pub fn with_gcp_product_name_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.gcp_product_name_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DetectConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(
            config.gcp_product_name_path,
            PathBuf::from("/sys/class/dmi/id/product_name")
        );
    }

    #[test]
    fn test_builders() {
        let config = DetectConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_gcp_metadata_url("http://127.0.0.1:1234")
            .with_gcp_iam_credentials_url("http://127.0.0.1:5678")
            .with_gcp_product_name_path("/tmp/product_name");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.gcp_metadata_url, "http://127.0.0.1:1234");
        assert_eq!(config.gcp_iam_credentials_url, "http://127.0.0.1:5678");
        assert_eq!(config.gcp_product_name_path, PathBuf::from("/tmp/product_name"));
    }
}
