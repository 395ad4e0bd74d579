//! Run configuration file (`repos.json` and friends).

use crate::config::ConfigError;
use crate::messages::MessageRenderer;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;
use url::Url;

/// A group of repositories that ship together.
#[derive(Debug, Clone, Deserialize)]
pub struct Component {
    /// Display name of the component (optional).
    #[serde(default)]
    pub name: Option<String>,

    /// Repository names within the organization.
    #[serde(alias = "rhds_repos")]
    pub repos: Vec<String>,
}

/// Handlebars formats for the texts sent on merge.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessageFormats {
    /// Merge commit title.
    pub commit_title: String,

    /// Merge commit message.
    pub commit_message: String,

    /// Comment posted on the JIRA issue after a merge.
    pub comment: String,
}

impl Default for MessageFormats {
    fn default() -> Self {
        Self {
            commit_title: default_commit_title_format(),
            commit_message: default_commit_message_format(),
            comment: default_comment_format(),
        }
    }
}

pub(crate) fn default_commit_title_format() -> String {
    "Merge PR #{{number}}".to_string()
}

pub(crate) fn default_commit_message_format() -> String {
    "Merged automatically because the linked JIRA issue has {{priority}} priority.".to_string()
}

pub(crate) fn default_comment_format() -> String {
    "The associated pull request has been merged.\n\n{{link}}".to_string()
}

/// Parsed run configuration.
///
/// Loaded once at startup and passed by reference to every stage.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// GitHub organization that owns the repositories.
    pub org: String,

    /// Repository groups to scan.
    pub components: Vec<Component>,

    /// Base URL of the JIRA server.
    pub jira_server: String,

    /// Priority name an issue must have for its PR to be merged.
    pub jira_priority: String,

    /// Base branches the tool may be run against. Empty means any.
    #[serde(default)]
    pub allowed_branches: Vec<String>,

    /// Merge commit and comment formats.
    #[serde(default)]
    pub messages: MessageFormats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            Some("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

impl RunConfig {
    /// Loads and validates a configuration file.
    ///
    /// The format follows the extension: `.yaml`/`.yml`, `.toml`, anything
    /// else is read as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing, unparsable, lacks a
    /// required key, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading run configuration");

        if !path.exists() {
            return Err(ConfigError::MissingFile {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let config = Self::parse(&content, Format::from_path(path), path)?;
        config.validate(path)?;
        Ok(config)
    }

    fn parse(content: &str, format: Format, path: &Path) -> Result<Self, ConfigError> {
        let path_str = || path.display().to_string();
        match format {
            Format::Json => serde_json::from_str(content).map_err(|e| ConfigError::JsonError {
                path: path_str(),
                source: e,
            }),
            Format::Yaml => serde_yaml::from_str(content).map_err(|e| ConfigError::YamlError {
                path: path_str(),
                source: e,
            }),
            Format::Toml => toml::from_str(content).map_err(|e| ConfigError::TomlError {
                path: path_str(),
                source: e,
            }),
        }
    }

    /// Validates the parsed configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem.
    pub fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let fail = |message: String| ConfigError::ValidationError {
            path: path.display().to_string(),
            message,
        };

        if self.org.trim().is_empty() {
            return Err(fail("org cannot be empty".to_string()));
        }

        if self.components.is_empty() {
            return Err(fail("components cannot be empty".to_string()));
        }

        if self.repositories().next().is_none() {
            return Err(fail("components list no repositories".to_string()));
        }

        if let Some(repo) = self.repositories().find(|r| r.trim().is_empty()) {
            return Err(fail(format!("invalid repository name '{repo}'")));
        }

        match Url::parse(&self.jira_server) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(fail(format!(
                    "jira_server must use http or https, got '{}'",
                    url.scheme()
                )))
            }
            Err(e) => return Err(fail(format!("jira_server is not a valid URL: {e}"))),
        }

        if self.jira_priority.trim().is_empty() {
            return Err(fail("jira_priority cannot be empty".to_string()));
        }

        MessageRenderer::new()
            .check_formats(&self.messages)
            .map_err(|e| fail(format!("invalid message format: {e}")))?;

        Ok(())
    }

    /// Repository names in component order.
    pub fn repositories(&self) -> impl Iterator<Item = &str> {
        self.components
            .iter()
            .flat_map(|c| c.repos.iter().map(String::as_str))
    }

    /// Returns true if `repo` is listed in any component.
    #[must_use]
    pub fn contains_repository(&self, repo: &str) -> bool {
        self.repositories().any(|r| r == repo)
    }

    /// Returns true if runs against `branch` are permitted.
    #[must_use]
    pub fn branch_allowed(&self, branch: &str) -> bool {
        self.allowed_branches.is_empty() || self.allowed_branches.iter().any(|b| b == branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const JSON_CONFIG: &str = r#"{
        "org": "redhat-developer",
        "components": [
            { "name": "core", "rhds_repos": ["rhdh", "rhdh-operator"] },
            { "repos": ["rhdh-chart"] }
        ],
        "jira_server": "https://issues.redhat.com",
        "jira_project": "RHIDP",
        "jira_priority": "Blocker"
    }"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_repos_json_layout() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "repos.json", JSON_CONFIG);

        let config = RunConfig::load(&path).unwrap();

        assert_eq!(config.org, "redhat-developer");
        assert_eq!(config.jira_priority, "Blocker");
        assert_eq!(
            config.repositories().collect::<Vec<_>>(),
            vec!["rhdh", "rhdh-operator", "rhdh-chart"]
        );
        assert_eq!(config.components[0].name.as_deref(), Some("core"));
        assert!(config.allowed_branches.is_empty());
        assert_eq!(config.messages.commit_title, "Merge PR #{{number}}");
    }

    #[test]
    fn loads_yaml() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "repos.yaml",
            r#"
org: acme
components:
  - repos: [widgets]
jira_server: https://jira.example.com
jira_priority: Critical
allowed_branches: [main, release-1.4]
"#,
        );

        let config = RunConfig::load(&path).unwrap();

        assert_eq!(config.org, "acme");
        assert_eq!(config.jira_priority, "Critical");
        assert!(config.branch_allowed("release-1.4"));
        assert!(!config.branch_allowed("feature-x"));
    }

    #[test]
    fn loads_toml_with_custom_messages() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "repos.toml",
            r#"
org = "acme"
jira_server = "https://jira.example.com"
jira_priority = "Blocker"

[[components]]
repos = ["widgets"]

[messages]
commit_title = "Auto-merge #{{number}} ({{key}})"
"#,
        );

        let config = RunConfig::load(&path).unwrap();

        assert_eq!(config.messages.commit_title, "Auto-merge #{{number}} ({{key}})");
        assert_eq!(config.messages.comment, default_comment_format());
    }

    #[test]
    fn missing_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let result = RunConfig::load(&temp.path().join("repos.json"));
        assert!(matches!(result, Err(ConfigError::MissingFile { .. })));
    }

    #[test]
    fn invalid_json_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "repos.json", "{ not json");
        assert!(matches!(
            RunConfig::load(&path),
            Err(ConfigError::JsonError { .. })
        ));
    }

    #[test]
    fn missing_required_key_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "repos.json",
            r#"{ "org": "acme", "components": [], "jira_server": "https://j" }"#,
        );

        let err = RunConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::JsonError { .. }));
        assert!(err.to_string().contains("jira_priority"));
    }

    #[test]
    fn empty_components_fail_validation() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "repos.json",
            r#"{ "org": "acme", "components": [], "jira_server": "https://j.example.com", "jira_priority": "Blocker" }"#,
        );

        assert!(matches!(
            RunConfig::load(&path),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn components_without_repositories_fail_validation() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "repos.json",
            r#"{ "org": "acme", "components": [{"name": "core", "repos": []}, {"repos": []}], "jira_server": "https://j.example.com", "jira_priority": "Blocker" }"#,
        );

        let err = RunConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
        assert!(err.to_string().contains("no repositories"));
    }

    #[test]
    fn bad_jira_url_fails_validation() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "repos.json",
            r#"{ "org": "acme", "components": [{"repos": ["a"]}], "jira_server": "issues.example.com", "jira_priority": "Blocker" }"#,
        );

        let err = RunConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("jira_server"));
    }

    #[test]
    fn broken_message_format_fails_validation() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "repos.json",
            r#"{ "org": "acme", "components": [{"repos": ["a"]}], "jira_server": "https://j.example.com",
                 "jira_priority": "Blocker", "messages": { "comment": "{{#if link}}unterminated" } }"#,
        );

        let err = RunConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid message format"));
    }

    #[test]
    fn contains_repository_checks_all_components() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "repos.json", JSON_CONFIG);
        let config = RunConfig::load(&path).unwrap();

        assert!(config.contains_repository("rhdh-chart"));
        assert!(!config.contains_repository("unknown"));
    }
}
