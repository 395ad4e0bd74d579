//! Message renderer.

use super::MessageError;
use crate::config::MessageFormats;
use handlebars::{no_escape, Handlebars};
use serde::Serialize;

/// Creates a Handlebars registry for plain-text messages.
///
/// The registry is configured with:
/// - No HTML escaping (commit messages and JIRA comments are plain text)
/// - Strict mode (catches misspelled variables)
#[must_use]
pub fn create_handlebars_registry() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(no_escape);
    hbs.set_strict_mode(true);
    hbs
}

/// Values available to message formats.
#[derive(Debug, Clone, Serialize)]
pub struct MessageContext<'a> {
    /// Pull request number.
    pub number: u64,
    /// Repository name.
    pub repo: &'a str,
    /// Organization name.
    pub org: &'a str,
    /// Linked JIRA issue key.
    pub key: &'a str,
    /// Priority that qualified the merge.
    pub priority: &'a str,
    /// Web link to the pull request.
    pub link: &'a str,
}

/// Rendered texts for one merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeMessages {
    /// Merge commit title.
    pub commit_title: String,
    /// Merge commit message.
    pub commit_message: String,
    /// JIRA comment body.
    pub comment: String,
}

/// Renders [`MessageFormats`] for a merge.
pub struct MessageRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRenderer {
    /// Creates a new renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlebars: create_handlebars_registry(),
        }
    }

    /// Renders all three messages.
    ///
    /// # Errors
    ///
    /// Returns an error if a format is malformed or references an unknown
    /// variable.
    pub fn render(
        &self,
        formats: &MessageFormats,
        context: &MessageContext<'_>,
    ) -> Result<MergeMessages, MessageError> {
        Ok(MergeMessages {
            commit_title: self
                .handlebars
                .render_template(&formats.commit_title, context)?,
            commit_message: self
                .handlebars
                .render_template(&formats.commit_message, context)?,
            comment: self.handlebars.render_template(&formats.comment, context)?,
        })
    }

    /// Renders the formats against sample values to reject broken ones early.
    ///
    /// # Errors
    ///
    /// Returns the first rendering error.
    pub fn check_formats(&self, formats: &MessageFormats) -> Result<(), MessageError> {
        let sample = MessageContext {
            number: 1,
            repo: "repo",
            org: "org",
            key: "PROJ-1",
            priority: "Blocker",
            link: "https://github.com/org/repo/pull/1",
        };
        self.render(formats, &sample).map(|_| ())
    }
}
