//! Orchestrates merge runs.
//!
//! Each pull request moves through the [`Stage`]s in order. A gate that says
//! "no" ends the walk with a [`SkipReason`]; a GitHub error that survives the
//! retries ends it with [`PrOutcome::Failed`]. Neither stops the run.

mod config;
mod error;
mod stage;

pub use config::{Credentials, RunnerConfig, Target};
pub use error::RunnerError;
pub use stage::{SkipReason, Stage};

use crate::auth::token_provider;
use crate::config::RunConfig;
use crate::github::{CodeHost, GitHubClient, GitHubError, MergeOutcome, PullRequest, PullState};
use crate::issue_key::extract_issue_key;
use crate::jira::{IssueTracker, JiraClient, LookupOutcome};
use crate::messages::{MessageContext, MessageError, MessageRenderer};
use crate::summary::{PrOutcome, ProcessingResult, RunSummary};
use error::PullError;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Why a pull request left the pipeline early.
enum Halt {
    Skip(SkipReason),
    Fail(PullError),
}

impl From<SkipReason> for Halt {
    fn from(reason: SkipReason) -> Self {
        Self::Skip(reason)
    }
}

impl From<GitHubError> for Halt {
    fn from(error: GitHubError) -> Self {
        Self::Fail(error.into())
    }
}

impl From<MessageError> for Halt {
    fn from(error: MessageError) -> Self {
        Self::Fail(error.into())
    }
}

fn reached(stage: Stage) {
    debug!(stage = %stage, "Stage reached");
}

/// Orchestrates a full merge run.
pub struct Runner {
    config: RunnerConfig,
    run_config: RunConfig,
    host: Arc<dyn CodeHost>,
    tracker: Arc<dyn IssueTracker>,
    renderer: MessageRenderer,
}

impl Runner {
    /// Builds a runner from the provided configuration.
    ///
    /// Loads the run configuration file, checks the target against it and
    /// sets up the GitHub and JIRA clients. Nothing is sent over the network.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] for an unreadable or invalid configuration
    /// file, a disallowed branch, an unknown repository or missing
    /// credentials.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        info!(path = %config.config_path().display(), "Loading run configuration");
        let run_config = RunConfig::load(config.config_path())?;
        check_target(config.target(), &run_config)?;

        let credentials = config.credentials();
        if credentials.jira_token.trim().is_empty() {
            return Err(RunnerError::MissingJiraToken);
        }
        let tokens = token_provider(
            credentials.github_token.as_deref(),
            credentials.app_id.as_deref(),
            credentials.app_key.as_deref(),
        )?;

        let host = Arc::new(GitHubClient::new(
            config.github_api_url(),
            tokens,
            config.retry(),
        ));
        let tracker = Arc::new(JiraClient::new(
            &run_config.jira_server,
            credentials.jira_token.clone(),
            config.retry(),
        )?);

        Ok(Self::assemble(config, run_config, host, tracker))
    }

    /// Builds a runner around already constructed clients.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the target is not permitted by `run_config`.
    pub fn with_clients(
        config: RunnerConfig,
        run_config: RunConfig,
        host: Arc<dyn CodeHost>,
        tracker: Arc<dyn IssueTracker>,
    ) -> Result<Self, RunnerError> {
        check_target(config.target(), &run_config)?;
        Ok(Self::assemble(config, run_config, host, tracker))
    }

    fn assemble(
        config: RunnerConfig,
        run_config: RunConfig,
        host: Arc<dyn CodeHost>,
        tracker: Arc<dyn IssueTracker>,
    ) -> Self {
        Self {
            config,
            run_config,
            host,
            tracker,
            renderer: MessageRenderer::new(),
        }
    }

    /// Returns the loaded run configuration.
    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    /// Returns the priority an issue must have: the override, else the file's.
    pub fn target_priority(&self) -> &str {
        self.config
            .priority()
            .unwrap_or(&self.run_config.jira_priority)
    }

    /// Executes the full orchestration flow.
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::new(self.config.dry_run());
        info!(
            org = %self.run_config.org,
            priority = self.target_priority(),
            dry_run = self.config.dry_run(),
            "Starting merge run"
        );

        match self.config.target() {
            Target::OpenPulls { base } => {
                for repo in self.run_config.repositories() {
                    self.process_repository(repo, base.as_deref(), &mut summary)
                        .await;
                }
            }
            Target::Single { number, repo } => {
                self.process_single(*number, repo.as_deref(), &mut summary)
                    .await;
            }
        }

        summary
    }

    async fn process_repository(&self, repo: &str, base: Option<&str>, summary: &mut RunSummary) {
        info!(repo, "Scanning repository");
        summary.repositories_scanned += 1;

        let pulls = match self
            .host
            .list_open_pulls(&self.run_config.org, repo, base)
            .await
        {
            Ok(pulls) => pulls,
            Err(e) => {
                error!(repo, error = %e, "Failed to list pull requests");
                summary.record_repository_failure();
                return;
            }
        };

        if pulls.is_empty() {
            info!(repo, "No open pull requests");
            return;
        }

        info!(repo, count = pulls.len(), "Found open pull requests");
        for pull in &pulls {
            let outcome = self.process_pull(repo, pull).await;
            summary.record_result(ProcessingResult {
                repository: repo.to_string(),
                number: pull.number,
                outcome,
            });
        }
    }

    async fn process_single(&self, number: u64, repo: Option<&str>, summary: &mut RunSummary) {
        let repos: Vec<&str> = match repo {
            Some(repo) => vec![repo],
            None => self.run_config.repositories().collect(),
        };

        for repo in repos {
            summary.repositories_scanned += 1;
            let pull = match self.host.get_pull(&self.run_config.org, repo, number).await {
                Ok(Some(pull)) => pull,
                Ok(None) => {
                    debug!(repo, number, "Pull request not in repository");
                    continue;
                }
                Err(e) => {
                    error!(repo, number, error = %e, "Failed to fetch pull request");
                    summary.record_repository_failure();
                    continue;
                }
            };

            let outcome = self.process_pull(repo, &pull).await;
            let done = outcome.is_merge();
            summary.record_result(ProcessingResult {
                repository: repo.to_string(),
                number,
                outcome,
            });
            if done {
                break;
            }
        }

        if summary.pulls_examined == 0 {
            warn!(number, "Pull request not found in any configured repository");
        }
    }

    /// Runs one pull request through every gate and, if all pass, merges it.
    pub async fn process_pull(&self, repo: &str, pull: &PullRequest) -> PrOutcome {
        let span = info_span!("pull", repo, number = pull.number);

        async {
            match self.advance(repo, pull).await {
                Ok(outcome) => outcome,
                Err(Halt::Skip(reason)) => {
                    info!(stage = %reason.stage(), reason = %reason, "Skipping pull request");
                    PrOutcome::Skipped(reason)
                }
                Err(Halt::Fail(e)) => {
                    error!(error = %e, "Failed to process pull request");
                    PrOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn advance(&self, repo: &str, pull: &PullRequest) -> Result<PrOutcome, Halt> {
        let org = self.run_config.org.as_str();
        reached(Stage::Fetched);

        if pull.state != PullState::Open {
            return Err(SkipReason::NotOpen {
                state: pull.state.as_str().to_string(),
            }
            .into());
        }
        let login = pull.author().ok_or(SkipReason::AuthorUnknown)?;
        if !self.host.is_org_member(org, login).await? {
            return Err(SkipReason::AuthorNotMember {
                login: login.to_string(),
            }
            .into());
        }
        reached(Stage::AuthorChecked);

        let key =
            extract_issue_key(&pull.title, &pull.body).ok_or(SkipReason::NoIssueReference)?;
        reached(Stage::IdentifierExtracted);

        let issue = match self.tracker.lookup(&key).await {
            LookupOutcome::Found(issue) => issue,
            LookupOutcome::NotFound => {
                return Err(SkipReason::IssueNotFound {
                    key: key.to_string(),
                }
                .into())
            }
            LookupOutcome::Forbidden => {
                return Err(SkipReason::IssueForbidden {
                    key: key.to_string(),
                }
                .into())
            }
            LookupOutcome::Unavailable { error, .. } => {
                return Err(SkipReason::TrackerUnavailable {
                    key: key.to_string(),
                    error,
                }
                .into())
            }
        };
        reached(Stage::IssueLookedUp);

        let required = self.target_priority();
        if issue.priority.as_deref() != Some(required) {
            return Err(SkipReason::PriorityMismatch {
                key: key.to_string(),
                found: issue.priority,
                required: required.to_string(),
            }
            .into());
        }
        reached(Stage::PriorityGated);

        if !self.host.is_mergeable(org, repo, pull.number).await? {
            return Err(SkipReason::NotMergeable {
                key: key.to_string(),
            }
            .into());
        }
        reached(Stage::MergeabilityChecked);

        let link = pull.link(self.config.github_web_url(), org, repo);
        let messages = self.renderer.render(
            &self.run_config.messages,
            &MessageContext {
                number: pull.number,
                repo,
                org,
                key: key.as_str(),
                priority: required,
                link: &link,
            },
        )?;

        if self.config.dry_run() {
            info!(key = %key, link = %link, "Dry run: would merge pull request");
            return Ok(PrOutcome::WouldMerge {
                key: key.to_string(),
                link,
            });
        }

        let merge = self
            .host
            .merge(
                org,
                repo,
                pull.number,
                &messages.commit_title,
                &messages.commit_message,
            )
            .await?;
        let sha = match merge {
            MergeOutcome::Merged { sha } => sha,
            MergeOutcome::Rejected { status, body } => {
                warn!(key = %key, status, message = %body, "GitHub refused the merge");
                return Ok(PrOutcome::MergeRejected {
                    key: key.to_string(),
                    status,
                    message: body,
                });
            }
        };
        info!(key = %key, link = %link, sha = sha.as_deref().unwrap_or(""), "Merged pull request");
        reached(Stage::Merged);

        let comment = self.tracker.comment(&key, &messages.comment).await;
        reached(Stage::Commented);

        Ok(PrOutcome::Merged {
            key: key.to_string(),
            link,
            sha,
            comment,
        })
    }
}

/// Rejects a base branch outside `allowed_branches` and unconfigured repositories.
fn check_target(target: &Target, run_config: &RunConfig) -> Result<(), RunnerError> {
    if let Some(branch) = target.base() {
        if !run_config.branch_allowed(branch) {
            return Err(RunnerError::BranchNotAllowed {
                branch: branch.to_string(),
                allowed: run_config.allowed_branches.join(", "),
            });
        }
    }

    if let Target::Single {
        repo: Some(repo), ..
    } = target
    {
        if !run_config.contains_repository(repo) {
            return Err(RunnerError::UnknownRepository { repo: repo.clone() });
        }
    }

    Ok(())
}
