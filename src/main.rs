//! Command-line entry point: check one push event payload.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use lfs_watchdog::watchdog::DEFAULT_MAX_CONCURRENT_COMMITS;
use lfs_watchdog::{CommitReport, GitHubClient, LogReporter, PushEvent, Reporter, Watchdog};

#[derive(Parser, Debug)]
#[command(name = "lfs-watchdog", version, about = "Check a GitHub push for Git LFS problems")]
struct Args {
    /// Push event payload (JSON); `-` reads stdin
    #[arg(long, short, default_value = "-")]
    payload: PathBuf,

    /// GitHub token used for API requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API root, e.g. https://ghe.example.com/api/v3/ (derived from the
    /// repository URL when omitted)
    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<Url>,

    /// Log findings instead of posting comments and statuses
    #[arg(long, env = "WATCHDOG_DEBUG", value_parser = clap::builder::FalseyValueParser::new())]
    dry_run: bool,

    /// Maximum number of commits checked at the same time
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT_COMMITS)]
    max_concurrent_commits: usize,

    /// Log filter, e.g. `info` or `lfs_watchdog=debug`
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let push = read_payload(&args.payload)?;
    let repo = &push.repository;

    let mut client = match &args.api_url {
        Some(url) => GitHubClient::with_api_url(url.clone(), repo.owner_name()?, &repo.name),
        None => GitHubClient::for_push(&push)
            .with_context(|| format!("cannot derive API URL for {}", repo.full_name))?,
    };
    match &args.token {
        Some(token) => client = client.with_token(token),
        None => warn!("GITHUB_TOKEN is not set, API requests are unauthenticated"),
    }

    let reports = if args.dry_run {
        run(client, LogReporter, &push, args.max_concurrent_commits)
    } else {
        run(client.clone(), client, &push, args.max_concurrent_commits)
    };

    let flagged = reports.iter().filter(|r| !r.outcome.is_empty()).count();
    let unpublished = reports
        .iter()
        .filter(|r| !r.outcome.is_empty() && !r.published)
        .count();
    info!(
        repo = %repo.full_name,
        checked = reports.len(),
        flagged,
        unpublished,
        dry_run = args.dry_run,
        "push checked"
    );
    Ok(())
}

fn run<R: Reporter>(
    client: GitHubClient,
    reporter: R,
    push: &PushEvent,
    max_concurrent_commits: usize,
) -> Vec<CommitReport> {
    Watchdog::new(client, reporter)
        .with_max_concurrent_commits(max_concurrent_commits)
        .check(push)
}

fn read_payload(path: &Path) -> anyhow::Result<PushEvent> {
    if path == Path::new("-") {
        return PushEvent::from_reader(io::stdin().lock()).context("invalid push payload on stdin");
    }

    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    PushEvent::from_reader(BufReader::new(file))
        .with_context(|| format!("invalid push payload in {}", path.display()))
}

fn init_tracing(filter: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter).with_context(|| format!("invalid log filter '{}'", filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}
