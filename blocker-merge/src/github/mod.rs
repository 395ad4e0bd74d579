//! GitHub access: pull requests, organization membership and merging.
//!
//! [`CodeHost`] is the seam the pipeline talks to; [`GitHubClient`] implements
//! it with octocrab. Pull requests are read through the typed pulls handler;
//! membership and merge go out as raw requests because their answer is the
//! status code itself. Every request goes through the shared
//! [`RetryPolicy`](crate::retry::RetryPolicy).

mod error;
mod types;

pub use error::GitHubError;
pub use types::{Author, MergeOutcome, PullRequest, PullState};

use crate::auth::TokenProvider;
use crate::retry::{retry, Failure, RetryError, RetryPolicy};
use async_trait::async_trait;
use octocrab::params::State;
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info_span, Instrument};

/// Public GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Public GitHub web host, used for links GitHub did not supply.
pub const DEFAULT_WEB_URL: &str = "https://github.com";

/// Page size for pull request listings.
const PULLS_PER_PAGE: u8 = 100;

/// Operations the pipeline needs from the code host.
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Lists open pull requests, optionally only those targeting `base`.
    async fn list_open_pulls(
        &self,
        org: &str,
        repo: &str,
        base: Option<&str>,
    ) -> Result<Vec<PullRequest>, GitHubError>;

    /// Fetches one pull request; `None` if it does not exist (HTTP 404).
    async fn get_pull(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Option<PullRequest>, GitHubError>;

    /// Returns true if `login` is a member of `org` (HTTP 204).
    ///
    /// Any other status means "not a member".
    async fn is_org_member(&self, org: &str, login: &str) -> Result<bool, GitHubError>;

    /// Reads the current mergeable flag; unknown reads as `false`.
    async fn is_mergeable(&self, org: &str, repo: &str, number: u64) -> Result<bool, GitHubError>;

    /// Requests a merge. A response other than 200 is a rejection, not an error.
    async fn merge(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        commit_title: &str,
        commit_message: &str,
    ) -> Result<MergeOutcome, GitHubError>;
}

/// Status and body of a GitHub response.
#[derive(Debug)]
struct Reply {
    status: u16,
    body: String,
}

#[derive(Serialize)]
struct MergeRequest<'a> {
    commit_title: &'a str,
    commit_message: &'a str,
}

#[derive(Deserialize)]
struct MergeResponse {
    #[serde(default)]
    sha: Option<String>,
}

/// [`CodeHost`] backed by the GitHub REST API.
pub struct GitHubClient {
    api_url: String,
    tokens: Arc<dyn TokenProvider>,
    retry: RetryPolicy,
    client: Mutex<Option<(String, Octocrab)>>,
}

impl GitHubClient {
    /// Creates a client for `api_url` using tokens from `tokens`.
    pub fn new(
        api_url: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            tokens,
            retry,
            client: Mutex::new(None),
        }
    }

    /// Returns an octocrab client authenticated with the current token.
    ///
    /// The client is rebuilt whenever the provider hands out a new token, so an
    /// expired app token is never reused.
    fn octocrab(&self) -> Result<Octocrab, GitHubError> {
        let token = self.tokens.current_token()?;
        let mut cached = self.client.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some((cached_token, client)) = cached.as_ref() {
            if *cached_token == token {
                return Ok(client.clone());
            }
        }

        debug!(api_url = %self.api_url, "Building GitHub client");
        let client = Octocrab::builder()
            .base_uri(self.api_url.as_str())?
            .personal_token(token.clone())
            .add_retry_config(RetryConfig::None)
            .build()?;
        *cached = Some((token, client.clone()));
        Ok(client)
    }

    async fn get_raw(&self, route: &str) -> Result<Reply, Failure<GitHubError>> {
        let octocrab = self.octocrab().map_err(Failure::Terminal)?;
        let response = octocrab
            ._get(route)
            .await
            .map_err(|e| Failure::Transient(e.into()))?;
        let status = response.status().as_u16();
        let body = octocrab
            .body_to_string(response)
            .await
            .map_err(|e| Failure::Transient(e.into()))?;
        Ok(Reply { status, body })
    }

    async fn put_raw<B: Serialize + Sync>(
        &self,
        route: &str,
        payload: &B,
    ) -> Result<Reply, Failure<GitHubError>> {
        let octocrab = self.octocrab().map_err(Failure::Terminal)?;
        let response = octocrab
            ._put(route, Some(payload))
            .await
            .map_err(|e| Failure::Transient(e.into()))?;
        let status = response.status().as_u16();
        let body = octocrab
            .body_to_string(response)
            .await
            .map_err(|e| Failure::Transient(e.into()))?;
        Ok(Reply { status, body })
    }
}

/// HTTP status of an error GitHub answered with, if it was an answer.
fn api_status(error: &octocrab::Error) -> Option<u16> {
    match error {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}

/// Classifies a failed typed request: throttling, server errors and transport
/// failures are worth retrying; client errors and undecodable bodies are not.
fn classify(error: octocrab::Error) -> Failure<GitHubError> {
    match error {
        octocrab::Error::GitHub { source, .. } => {
            let status = source.status_code.as_u16();
            let error = GitHubError::Status {
                status,
                body: source.message,
            };
            if status == 429 || status >= 500 {
                Failure::Transient(error)
            } else {
                Failure::Terminal(error)
            }
        }
        error @ (octocrab::Error::Hyper { .. }
        | octocrab::Error::Service { .. }
        | octocrab::Error::Http { .. }) => Failure::Transient(error.into()),
        error => Failure::Terminal(error.into()),
    }
}

impl From<RetryError<GitHubError>> for GitHubError {
    fn from(error: RetryError<GitHubError>) -> Self {
        error.into_inner()
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn list_open_pulls(
        &self,
        org: &str,
        repo: &str,
        base: Option<&str>,
    ) -> Result<Vec<PullRequest>, GitHubError> {
        let span = info_span!("list_open_pulls", org, repo, base = base.unwrap_or("*"));

        async {
            let pulls = retry(&self.retry, "list pull requests", move || async move {
                let octocrab = self.octocrab().map_err(Failure::Terminal)?;
                let handler = octocrab.pulls(org, repo);
                let mut request = handler
                    .list()
                    .state(State::Open)
                    .per_page(PULLS_PER_PAGE);
                if let Some(branch) = base {
                    request = request.base(branch);
                }

                let first = request.send().await.map_err(classify)?;
                octocrab.all_pages(first).await.map_err(classify)
            })
            .await?;

            debug!(count = pulls.len(), "Fetched open pull requests");
            Ok(pulls.into_iter().map(PullRequest::from).collect())
        }
        .instrument(span)
        .await
    }

    async fn get_pull(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Option<PullRequest>, GitHubError> {
        let pull = retry(&self.retry, "fetch pull request", move || async move {
            let octocrab = self.octocrab().map_err(Failure::Terminal)?;
            match octocrab.pulls(org, repo).get(number).await {
                Ok(pull) => Ok(Some(pull)),
                Err(e) if api_status(&e) == Some(404) => Ok(None),
                Err(e) => Err(classify(e)),
            }
        })
        .await?;
        Ok(pull.map(PullRequest::from))
    }

    async fn is_org_member(&self, org: &str, login: &str) -> Result<bool, GitHubError> {
        let route = format!("/orgs/{org}/members/{login}");
        let route = route.as_str();
        let status = retry(&self.retry, "check organization membership", move || async move {
            self.get_raw(route).await.map(|reply| reply.status)
        })
        .await?;
        debug!(org, login, status, "Membership check");
        Ok(status == 204)
    }

    async fn is_mergeable(&self, org: &str, repo: &str, number: u64) -> Result<bool, GitHubError> {
        let pull = self.get_pull(org, repo, number).await?.ok_or_else(|| {
            GitHubError::Status {
                status: 404,
                body: format!("pull request #{number} not found in {org}/{repo}"),
            }
        })?;
        Ok(pull.mergeable.unwrap_or(false))
    }

    async fn merge(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        commit_title: &str,
        commit_message: &str,
    ) -> Result<MergeOutcome, GitHubError> {
        let route = format!("/repos/{org}/{repo}/pulls/{number}/merge");
        let route = route.as_str();
        let payload = &MergeRequest {
            commit_title,
            commit_message,
        };

        let reply = retry(&self.retry, "merge pull request", move || async move {
            self.put_raw(route, payload).await
        })
        .await?;

        if reply.status == 200 {
            let sha = serde_json::from_str::<MergeResponse>(&reply.body)
                .ok()
                .and_then(|r| r.sha);
            Ok(MergeOutcome::Merged { sha })
        } else {
            Ok(MergeOutcome::Rejected {
                status: reply.status,
                body: reply.body,
            })
        }
    }
}
