//! JIRA access: issue lookup and comments.
//!
//! Lookups treat HTTP 403 and 404 as final answers and retry everything else.
//! Comments retry on any failure and are dropped silently once the attempts
//! run out, so a flaky tracker never affects a merge.

mod error;
mod outcome;

pub use error::TrackerError;
pub use outcome::{CommentOutcome, IssueDetails, LookupOutcome};

use crate::issue_key::IssueKey;
use crate::retry::{retry, Failure, RetryError, RetryPolicy};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Operations the pipeline needs from the issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Looks up an issue.
    async fn lookup(&self, key: &IssueKey) -> LookupOutcome;

    /// Adds a comment to an issue.
    async fn comment(&self, key: &IssueKey, body: &str) -> CommentOutcome;
}

#[derive(Deserialize)]
struct IssueResponse {
    key: String,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Default, Deserialize)]
struct IssueFields {
    #[serde(default)]
    priority: Option<Named>,
    #[serde(default)]
    issuetype: Option<Named>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

impl From<IssueResponse> for IssueDetails {
    fn from(issue: IssueResponse) -> Self {
        Self {
            key: issue.key,
            priority: issue.fields.priority.map(|p| p.name),
            issue_type: issue.fields.issuetype.map(|t| t.name),
            summary: issue.fields.summary,
        }
    }
}

#[derive(Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

/// [`IssueTracker`] backed by the JIRA REST API v2 with bearer auth.
pub struct JiraClient {
    server: String,
    token: String,
    http: Client,
    retry: RetryPolicy,
}

impl JiraClient {
    /// Creates a client for the JIRA server at `server`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        server: &str,
        token: impl Into<String>,
        retry: RetryPolicy,
    ) -> Result<Self, TrackerError> {
        let http = Client::builder()
            .user_agent(concat!("blocker-merge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            server: server.trim_end_matches('/').to_string(),
            token: token.into(),
            http,
            retry,
        })
    }

    fn issue_url(&self, key: &IssueKey) -> String {
        format!("{}/rest/api/2/issue/{key}", self.server)
    }

    async fn fetch_issue(&self, key: &IssueKey) -> Result<IssueDetails, Failure<TrackerError>> {
        let response = self
            .http
            .get(self.issue_url(key))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Failure::Transient(e.into()))?;

        match response.status() {
            StatusCode::FORBIDDEN => Err(Failure::Terminal(TrackerError::Forbidden {
                key: key.to_string(),
            })),
            StatusCode::NOT_FOUND => Err(Failure::Terminal(TrackerError::NotFound {
                key: key.to_string(),
            })),
            status if status.is_success() => response
                .json::<IssueResponse>()
                .await
                .map(IssueDetails::from)
                .map_err(|e| Failure::Transient(e.into())),
            status => Err(Failure::Transient(TrackerError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })),
        }
    }

    async fn post_comment(&self, key: &IssueKey, body: &str) -> Result<(), Failure<TrackerError>> {
        let response = self
            .http
            .post(format!("{}/comment", self.issue_url(key)))
            .bearer_auth(&self.token)
            .json(&CommentRequest { body })
            .send()
            .await
            .map_err(|e| Failure::Transient(e.into()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Failure::Transient(TrackerError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }))
        }
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn lookup(&self, key: &IssueKey) -> LookupOutcome {
        let result = retry(&self.retry, "look up JIRA issue", move || async move {
            self.fetch_issue(key).await
        })
        .await;

        match result {
            Ok(issue) => {
                debug!(
                    key = %key,
                    priority = issue.priority.as_deref().unwrap_or(""),
                    issue_type = issue.issue_type.as_deref().unwrap_or(""),
                    "Retrieved JIRA issue"
                );
                LookupOutcome::Found(issue)
            }
            Err(RetryError::Terminal(TrackerError::NotFound { .. })) => {
                warn!(key = %key, "JIRA issue not found");
                LookupOutcome::NotFound
            }
            Err(RetryError::Terminal(TrackerError::Forbidden { .. })) => {
                warn!(key = %key, "Access to JIRA issue forbidden");
                LookupOutcome::Forbidden
            }
            Err(RetryError::Terminal(e)) => LookupOutcome::Unavailable {
                attempts: 1,
                error: e.to_string(),
            },
            Err(RetryError::Exhausted { attempts, last }) => {
                warn!(key = %key, attempts, error = %last, "Failed to retrieve JIRA issue");
                LookupOutcome::Unavailable {
                    attempts,
                    error: last.to_string(),
                }
            }
        }
    }

    async fn comment(&self, key: &IssueKey, body: &str) -> CommentOutcome {
        let result = retry(&self.retry, "comment on JIRA issue", move || async move {
            self.post_comment(key, body).await
        })
        .await;

        match result {
            Ok(()) => {
                info!(key = %key, "Comment added to JIRA issue");
                CommentOutcome::Posted
            }
            Err(e) => {
                let attempts = match &e {
                    RetryError::Exhausted { attempts, .. } => *attempts,
                    RetryError::Terminal(_) => 1,
                };
                warn!(key = %key, attempts, error = %e, "Giving up on JIRA comment");
                CommentOutcome::Abandoned {
                    attempts,
                    error: e.into_inner().to_string(),
                }
            }
        }
    }
}
