#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod auth;
pub mod config;
pub mod github;
pub mod issue_key;
pub mod jira;
pub mod messages;
pub mod retry;
pub mod runner;
pub mod summary;

pub use auth::{token_provider, AppToken, AuthError, PersonalToken, TokenProvider};
pub use config::{Component, ConfigError, MessageFormats, RunConfig};
pub use github::{CodeHost, GitHubClient, GitHubError, MergeOutcome, PullRequest, PullState};
pub use issue_key::{extract_issue_key, find_issue_key, IssueKey};
pub use jira::{CommentOutcome, IssueDetails, IssueTracker, JiraClient, LookupOutcome, TrackerError};
pub use messages::{MergeMessages, MessageContext, MessageError, MessageRenderer};
pub use retry::{retry, Failure, RetryError, RetryPolicy};
pub use runner::{Credentials, Runner, RunnerConfig, RunnerError, SkipReason, Stage, Target};
pub use summary::{PrOutcome, ProcessingResult, RunSummary};
