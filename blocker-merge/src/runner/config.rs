//! Runner configuration.

use crate::github::{DEFAULT_API_URL, DEFAULT_WEB_URL};
use crate::retry::RetryPolicy;
use std::path::{Path, PathBuf};

/// Which pull requests a run looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every open pull request in every configured repository.
    OpenPulls {
        /// Only pull requests targeting this base branch.
        base: Option<String>,
    },
    /// One pull request number, searched for in the configured repositories.
    Single {
        /// Pull request number.
        number: u64,
        /// Only look in this repository.
        repo: Option<String>,
    },
}

impl Target {
    /// Returns the base branch the run is restricted to, if any.
    #[must_use]
    pub fn base(&self) -> Option<&str> {
        match self {
            Self::OpenPulls { base } => base.as_deref(),
            Self::Single { .. } => None,
        }
    }
}

/// Secrets for GitHub and JIRA.
#[derive(Clone, Default)]
pub struct Credentials {
    /// JIRA personal access token.
    pub jira_token: String,
    /// GitHub personal access token.
    pub github_token: Option<String>,
    /// GitHub App ID.
    pub app_id: Option<String>,
    /// GitHub App private key (PEM).
    pub app_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &self.github_token.as_ref().map(|_| ".."))
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

/// Configuration for a merge run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Path to the run configuration file.
    config_path: PathBuf,
    /// Pull requests to process.
    target: Target,
    /// Whether to evaluate the gates without merging or commenting.
    dry_run: bool,
    /// Priority that overrides the one in the configuration file.
    priority: Option<String>,
    /// Retry policy for every outbound call.
    retry: RetryPolicy,
    /// GitHub REST API base URL.
    github_api_url: String,
    /// GitHub web host, for links the API did not supply.
    github_web_url: String,
    /// Secrets.
    credentials: Credentials,
}

impl RunnerConfig {
    /// Creates a new configuration for a run.
    pub fn new(config_path: PathBuf, target: Target, credentials: Credentials) -> Self {
        Self {
            config_path,
            target,
            dry_run: false,
            priority: None,
            retry: RetryPolicy::default(),
            github_api_url: DEFAULT_API_URL.to_string(),
            github_web_url: DEFAULT_WEB_URL.to_string(),
            credentials,
        }
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Overrides the target priority from the configuration file.
    #[must_use]
    pub fn with_priority(mut self, priority: Option<String>) -> Self {
        self.priority = priority.filter(|p| !p.trim().is_empty());
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets a custom GitHub API URL (GitHub Enterprise or a test server).
    #[must_use]
    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into();
        self
    }

    /// Sets a custom GitHub web URL.
    #[must_use]
    pub fn with_github_web_url(mut self, url: impl Into<String>) -> Self {
        self.github_web_url = url.into();
        self
    }

    /// Returns the run configuration file path.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Returns the pull requests to process.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Returns whether dry-run mode is enabled.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns the priority override.
    pub fn priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }

    /// Returns the retry policy.
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Returns the GitHub API URL.
    pub fn github_api_url(&self) -> &str {
        &self.github_api_url
    }

    /// Returns the GitHub web URL.
    pub fn github_web_url(&self) -> &str {
        &self.github_web_url
    }

    /// Returns the secrets.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_priority_override_is_ignored() {
        let config = RunnerConfig::new(
            PathBuf::from("repos.json"),
            Target::OpenPulls { base: None },
            Credentials::default(),
        )
        .with_priority(Some("  ".to_string()));
        assert_eq!(config.priority(), None);
    }

    #[test]
    fn debug_hides_secrets() {
        let credentials = Credentials {
            jira_token: "jira-secret".to_string(),
            github_token: Some("ghp_secret".to_string()),
            ..Credentials::default()
        };
        let printed = format!("{credentials:?}");
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn single_target_has_no_base() {
        let target = Target::Single {
            number: 4,
            repo: None,
        };
        assert_eq!(target.base(), None);
        assert_eq!(
            Target::OpenPulls {
                base: Some("main".to_string())
            }
            .base(),
            Some("main")
        );
    }
}
