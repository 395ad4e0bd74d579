//! Pull request data the pipeline reads, taken from octocrab's models.

use octocrab::models::pulls::PullRequest as ApiPullRequest;
use octocrab::models::IssueState;

/// State of a pull request as reported by GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullState {
    /// Open for review.
    Open,
    /// Closed, merged or not.
    Closed,
    /// Missing, or a state this client does not know.
    Unknown,
}

impl PullState {
    /// Returns the state as GitHub spells it.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }
}

impl From<Option<&IssueState>> for PullState {
    fn from(state: Option<&IssueState>) -> Self {
        match state {
            Some(IssueState::Open) => Self::Open,
            Some(IssueState::Closed) => Self::Closed,
            _ => Self::Unknown,
        }
    }
}

/// Author of a pull request.
#[derive(Debug, Clone)]
pub struct Author {
    /// GitHub login.
    pub login: String,
}

/// The subset of a GitHub pull request the pipeline reads.
#[derive(Debug, Clone)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,

    /// Title; empty when GitHub sent none.
    pub title: String,

    /// Description; empty when GitHub sent none.
    pub body: String,

    /// Author, missing for deleted accounts.
    pub user: Option<Author>,

    /// Open or closed.
    pub state: PullState,

    /// Merge-conflict-free flag; `None` while GitHub is still computing it.
    pub mergeable: Option<bool>,

    /// Web link to the pull request.
    pub html_url: Option<String>,
}

impl PullRequest {
    /// Returns the author login, if known.
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.login.as_str())
    }

    /// Returns the web link, building one from `web_base` if GitHub sent none.
    #[must_use]
    pub fn link(&self, web_base: &str, org: &str, repo: &str) -> String {
        self.html_url.clone().unwrap_or_else(|| {
            format!(
                "{}/{org}/{repo}/pull/{}",
                web_base.trim_end_matches('/'),
                self.number
            )
        })
    }
}

impl From<ApiPullRequest> for PullRequest {
    fn from(pull: ApiPullRequest) -> Self {
        Self {
            number: pull.number,
            state: PullState::from(pull.state.as_ref()),
            title: pull.title.unwrap_or_default(),
            body: pull.body.unwrap_or_default(),
            user: pull.user.map(|user| Author { login: user.login }),
            mergeable: pull.mergeable,
            html_url: pull.html_url.map(String::from),
        }
    }
}

/// Result of a merge request that reached GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// HTTP 200: the pull request was merged.
    Merged {
        /// Merge commit SHA, if reported.
        sha: Option<String>,
    },
    /// Any other status: the pull request stays unmerged.
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, usually GitHub's reason.
        body: String,
    },
}
