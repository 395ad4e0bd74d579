//! Run summary types.

use super::result::{PrOutcome, ProcessingResult};
use crate::jira::CommentOutcome;

/// Summary of a complete run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of repositories queried.
    pub repositories_scanned: usize,

    /// Number of repositories whose pull requests could not be listed.
    pub repositories_failed: usize,

    /// Number of pull requests run through the pipeline.
    pub pulls_examined: usize,

    /// Number of pull requests whose issue had the target priority.
    pub qualified: usize,

    /// Number of pull requests merged.
    pub merged: usize,

    /// Number of pull requests that would have been merged (dry run).
    pub would_merge: usize,

    /// Number of merge requests GitHub refused.
    pub merge_rejected: usize,

    /// Number of pull requests stopped by a gate.
    pub skipped: usize,

    /// Number of pull requests that failed with an error.
    pub failed: usize,

    /// Number of JIRA comments posted.
    pub comments_posted: usize,

    /// Number of JIRA comments given up on.
    pub comments_abandoned: usize,

    /// Whether this was a dry run.
    pub dry_run: bool,

    /// Per pull request results, in processing order.
    pub results: Vec<ProcessingResult>,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Updates the summary with a processing result.
    pub fn record_result(&mut self, result: ProcessingResult) {
        self.pulls_examined += 1;
        if result.outcome.qualified() {
            self.qualified += 1;
        }

        match &result.outcome {
            PrOutcome::Merged { comment, .. } => {
                self.merged += 1;
                match comment {
                    CommentOutcome::Posted => self.comments_posted += 1,
                    CommentOutcome::Abandoned { .. } => self.comments_abandoned += 1,
                }
            }
            PrOutcome::WouldMerge { .. } => self.would_merge += 1,
            PrOutcome::MergeRejected { .. } => self.merge_rejected += 1,
            PrOutcome::Skipped(_) => self.skipped += 1,
            PrOutcome::Failed { .. } => self.failed += 1,
        }

        self.results.push(result);
    }

    /// Records a repository whose pull requests could not be read.
    pub fn record_repository_failure(&mut self) {
        self.repositories_failed += 1;
    }

    /// Returns true if any failures occurred.
    ///
    /// Rejected merges and abandoned comments are reported but do not count.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.repositories_failed > 0
    }

    /// Returns true if all operations were successful.
    #[must_use]
    pub fn all_success(&self) -> bool {
        !self.has_failures() && self.merge_rejected == 0 && self.comments_abandoned == 0
    }
}
