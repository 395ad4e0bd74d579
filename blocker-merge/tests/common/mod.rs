//! In-memory GitHub and JIRA doubles for pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use blocker_merge::github::Author;
use blocker_merge::{
    CodeHost, CommentOutcome, Component, GitHubError, IssueDetails, IssueKey, IssueTracker,
    LookupOutcome, MergeOutcome, MessageFormats, PullRequest, PullState, RunConfig,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub const ORG: &str = "acme";

/// Picks the rustls provider; both may be compiled in across the workspace.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// A run configuration with one component holding `repos`.
pub fn run_config(repos: &[&str]) -> RunConfig {
    RunConfig {
        org: ORG.to_string(),
        components: vec![Component {
            name: Some("core".to_string()),
            repos: repos.iter().map(|r| r.to_string()).collect(),
        }],
        jira_server: "https://issues.example.com".to_string(),
        jira_priority: "Blocker".to_string(),
        allowed_branches: Vec::new(),
        messages: MessageFormats::default(),
    }
}

/// An open pull request by `login`.
pub fn pull(number: u64, title: &str, body: &str, login: &str) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        body: body.to_string(),
        user: Some(Author {
            login: login.to_string(),
        }),
        state: PullState::Open,
        mergeable: Some(true),
        html_url: None,
    }
}

/// A merge request received by [`MockHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCall {
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub message: String,
}

/// Code host that serves pull requests from memory and records every call.
pub struct MockHost {
    pulls: HashMap<String, Vec<PullRequest>>,
    members: HashSet<String>,
    broken_members: HashSet<String>,
    unmergeable: HashSet<u64>,
    merge_status: u16,
    pub calls: Mutex<Vec<String>>,
    pub merges: Mutex<Vec<MergeCall>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            pulls: HashMap::new(),
            members: HashSet::new(),
            broken_members: HashSet::new(),
            unmergeable: HashSet::new(),
            merge_status: 200,
            calls: Mutex::new(Vec::new()),
            merges: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pull(mut self, repo: &str, pull: PullRequest) -> Self {
        self.pulls.entry(repo.to_string()).or_default().push(pull);
        self
    }

    pub fn with_member(mut self, login: &str) -> Self {
        self.members.insert(login.to_string());
        self
    }

    /// Membership checks for `login` fail with a server error.
    pub fn with_broken_member(mut self, login: &str) -> Self {
        self.broken_members.insert(login.to_string());
        self
    }

    pub fn with_unmergeable(mut self, number: u64) -> Self {
        self.unmergeable.insert(number);
        self
    }

    pub fn with_merge_status(mut self, status: u16) -> Self {
        self.merge_status = status;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn merges(&self) -> Vec<MergeCall> {
        self.merges.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CodeHost for MockHost {
    async fn list_open_pulls(
        &self,
        _org: &str,
        repo: &str,
        base: Option<&str>,
    ) -> Result<Vec<PullRequest>, GitHubError> {
        self.record(format!("list {repo} {}", base.unwrap_or("*")));
        Ok(self.pulls.get(repo).cloned().unwrap_or_default())
    }

    async fn get_pull(
        &self,
        _org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Option<PullRequest>, GitHubError> {
        self.record(format!("get {repo}#{number}"));
        Ok(self
            .pulls
            .get(repo)
            .and_then(|pulls| pulls.iter().find(|p| p.number == number))
            .cloned())
    }

    async fn is_org_member(&self, _org: &str, login: &str) -> Result<bool, GitHubError> {
        self.record(format!("member {login}"));
        if self.broken_members.contains(login) {
            return Err(GitHubError::Status {
                status: 502,
                body: "Bad Gateway".to_string(),
            });
        }
        Ok(self.members.contains(login))
    }

    async fn is_mergeable(&self, _org: &str, repo: &str, number: u64) -> Result<bool, GitHubError> {
        self.record(format!("mergeable {repo}#{number}"));
        Ok(!self.unmergeable.contains(&number))
    }

    async fn merge(
        &self,
        _org: &str,
        repo: &str,
        number: u64,
        commit_title: &str,
        commit_message: &str,
    ) -> Result<MergeOutcome, GitHubError> {
        self.record(format!("merge {repo}#{number}"));
        self.merges.lock().unwrap().push(MergeCall {
            repo: repo.to_string(),
            number,
            title: commit_title.to_string(),
            message: commit_message.to_string(),
        });
        if self.merge_status == 200 {
            Ok(MergeOutcome::Merged {
                sha: Some("6dcb09b5b57875f334f61aebed695e2e4193db5e".to_string()),
            })
        } else {
            Ok(MergeOutcome::Rejected {
                status: self.merge_status,
                body: r#"{"message":"Pull Request is not mergeable"}"#.to_string(),
            })
        }
    }
}

/// Issue tracker that answers from memory and records lookups and comments.
pub struct MockTracker {
    issues: HashMap<String, LookupOutcome>,
    comment_outcome: CommentOutcome,
    pub lookups: Mutex<Vec<String>>,
    pub comments: Mutex<Vec<(String, String)>>,
}

impl MockTracker {
    pub fn new() -> Self {
        Self {
            issues: HashMap::new(),
            comment_outcome: CommentOutcome::Posted,
            lookups: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
        }
    }

    pub fn with_issue(mut self, key: &str, priority: &str) -> Self {
        self.issues.insert(
            key.to_string(),
            LookupOutcome::Found(IssueDetails {
                key: key.to_string(),
                priority: Some(priority.to_string()),
                issue_type: Some("Bug".to_string()),
                summary: None,
            }),
        );
        self
    }

    pub fn with_outcome(mut self, key: &str, outcome: LookupOutcome) -> Self {
        self.issues.insert(key.to_string(), outcome);
        self
    }

    pub fn with_comment_outcome(mut self, outcome: CommentOutcome) -> Self {
        self.comment_outcome = outcome;
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn comments(&self) -> Vec<(String, String)> {
        self.comments.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    async fn lookup(&self, key: &IssueKey) -> LookupOutcome {
        self.lookups.lock().unwrap().push(key.to_string());
        self.issues
            .get(key.as_str())
            .cloned()
            .unwrap_or(LookupOutcome::NotFound)
    }

    async fn comment(&self, key: &IssueKey, body: &str) -> CommentOutcome {
        self.comments
            .lock()
            .unwrap()
            .push((key.to_string(), body.to_string()));
        self.comment_outcome.clone()
    }
}
