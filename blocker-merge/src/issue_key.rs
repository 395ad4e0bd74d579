//! Extraction of JIRA issue keys from pull request text.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

static ISSUE_KEY_RE: OnceLock<Regex> = OnceLock::new();

fn issue_key_re() -> &'static Regex {
    ISSUE_KEY_RE.get_or_init(|| Regex::new(r"[A-Z]+-[0-9]+").unwrap())
}

/// A JIRA issue key such as `PROJ-42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IssueKey(String);

impl IssueKey {
    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Finds the first issue key in `text`.
#[must_use]
pub fn find_issue_key(text: &str) -> Option<IssueKey> {
    issue_key_re()
        .find(text)
        .map(|m| IssueKey(m.as_str().to_string()))
}

/// Extracts the issue key linked from a pull request.
///
/// The title wins over the body; within a field the first match wins.
#[must_use]
pub fn extract_issue_key(title: &str, body: &str) -> Option<IssueKey> {
    find_issue_key(title).or_else(|| find_issue_key(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(title: &str, body: &str) -> Option<String> {
        extract_issue_key(title, body).map(|k| k.to_string())
    }

    #[test]
    fn finds_key_in_title() {
        assert_eq!(key("Fix crash [PROJ-42]", ""), Some("PROJ-42".to_string()));
    }

    #[test]
    fn title_takes_precedence_over_body() {
        assert_eq!(
            key("OCPBUGS-7: fix", "Relates to RHDS-100"),
            Some("OCPBUGS-7".to_string())
        );
    }

    #[test]
    fn falls_back_to_body() {
        assert_eq!(
            key("Fix the crash", "See https://issues.redhat.com/browse/RHDS-1234"),
            Some("RHDS-1234".to_string())
        );
    }

    #[test]
    fn first_match_in_field_wins() {
        assert_eq!(key("ABC-1 and DEF-2", ""), Some("ABC-1".to_string()));
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(key("fix typo", "lowercase abc-12 and ABC- and -12"), None);
    }

    #[test]
    fn embedded_key_is_found() {
        // The pattern is unanchored, so uppercase runs inside words still match.
        assert_eq!(key("xFOO-9y", ""), Some("FOO-9".to_string()));
    }
}
