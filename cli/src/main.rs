//! CLI for blocker-merge.
//!
//! This tool merges pull requests whose linked JIRA issue has the configured
//! priority and comments on the issue afterwards.

use blocker_merge::github::{DEFAULT_API_URL, DEFAULT_WEB_URL};
use blocker_merge::retry::DEFAULT_BASE_DELAY;
use blocker_merge::{
    Credentials, PrOutcome, RetryPolicy, RunSummary, Runner, RunnerConfig, RunnerError, Target,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// blocker-merge - Merge pull requests linked to high-priority JIRA issues.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the run configuration (JSON, YAML or TOML).
    #[arg(long, default_value = "repos.json")]
    config: PathBuf,

    /// Only process pull requests targeting this base branch.
    #[arg(long, conflicts_with = "pr_id")]
    branch: Option<String>,

    /// Process only this pull request number.
    #[arg(long)]
    pr_id: Option<u64>,

    /// Repository to look for `--pr-id` in (default: every configured one).
    #[arg(long, requires = "pr_id")]
    repo: Option<String>,

    /// JIRA priority to merge on, overriding `jira_priority` from the config.
    #[arg(long)]
    priority: Option<String>,

    /// Evaluate every gate without merging or commenting.
    #[arg(long)]
    dry_run: bool,

    /// Exit with 1 if no pull request had the target priority.
    #[arg(long)]
    strict: bool,

    /// Attempts per API call before giving up.
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    max_retries: u32,

    /// GitHub REST API URL.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    github_api_url: String,

    /// GitHub web URL, used for links to pull requests.
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = DEFAULT_WEB_URL)]
    github_web_url: String,

    /// JIRA Personal Access Token.
    #[arg(long, env = "JIRA_API_TOKEN", hide_env_values = true)]
    jira_token: String,

    /// GitHub Personal Access Token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// GitHub App ID; used with `--app-key` instead of a personal token.
    #[arg(long, env = "APP_ID")]
    app_id: Option<String>,

    /// GitHub App private key (PEM).
    #[arg(long, env = "APP_KEY", hide_env_values = true)]
    app_key: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    // Both rustls providers may be compiled in; pick one before any client is built.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let args = Args::parse();
    let strict = args.strict;

    match run(args).await {
        Ok(summary) => {
            print_summary(&summary);

            if summary.has_failures() {
                ExitCode::from(1)
            } else if strict && summary.qualified == 0 {
                warn!("No pull request had the target priority");
                ExitCode::from(1)
            } else {
                ExitCode::from(0)
            }
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Main execution logic.
async fn run(args: Args) -> Result<RunSummary, RunnerError> {
    let target = match args.pr_id {
        Some(number) => Target::Single {
            number,
            repo: args.repo,
        },
        None => Target::OpenPulls { base: args.branch },
    };
    let credentials = Credentials {
        jira_token: args.jira_token,
        github_token: args.github_token,
        app_id: args.app_id,
        app_key: args.app_key,
    };

    let config = RunnerConfig::new(args.config, target, credentials)
        .with_dry_run(args.dry_run)
        .with_priority(args.priority)
        .with_retry(RetryPolicy::new(args.max_retries, DEFAULT_BASE_DELAY))
        .with_github_api_url(args.github_api_url)
        .with_github_web_url(args.github_web_url);

    let runner = Runner::new(config)?;
    Ok(runner.run().await)
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "  Mode: {}",
        if summary.dry_run { "Dry Run" } else { "Live" }
    );
    println!("  Repositories scanned: {}", summary.repositories_scanned);
    println!("  Pull requests examined: {}", summary.pulls_examined);
    println!("  Qualified: {}", summary.qualified);

    if summary.dry_run {
        println!("  Would merge: {}", summary.would_merge);
    } else {
        println!("  Merged: {}", summary.merged);
        println!("  Merges rejected: {}", summary.merge_rejected);
        println!("  JIRA comments posted: {}", summary.comments_posted);
        println!("  JIRA comments abandoned: {}", summary.comments_abandoned);
    }
    println!("  Skipped: {}", summary.skipped);
    println!("  Failed: {}", summary.failed);
    if summary.repositories_failed > 0 {
        println!("  Repositories failed: {}", summary.repositories_failed);
    }

    for result in &summary.results {
        let line = match &result.outcome {
            PrOutcome::Merged { key, link, .. } => format!("merged ({key}) {link}"),
            PrOutcome::WouldMerge { key, link } => format!("would merge ({key}) {link}"),
            PrOutcome::MergeRejected {
                key,
                status,
                message,
            } => format!("merge rejected ({key}): HTTP {status} {message}"),
            PrOutcome::Failed { error } => format!("failed: {error}"),
            PrOutcome::Skipped(_) => continue,
        };
        println!("  {}#{}: {line}", result.repository, result.number);
    }
}
