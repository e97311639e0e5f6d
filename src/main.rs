//! Command-line front end: author activity and file hotspots for a Git repository.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use commitstats::analysis::{
    ChangeClassifier, CommitFilter, CommitSource, GitCommitSource, HotspotAnalyzer,
    LineDiffEngine, ParallelCommitStatsAdapter, StatsAggregator, StatsCalculator,
};
use commitstats::app::ui;
use commitstats::config::StatsConfig;
use commitstats::types::{AuthorStats, FileHotspot};

/// Change-volume statistics for Git history
#[derive(Parser)]
#[command(name = "commitstats")]
#[command(
    about = "Per-author change statistics, daily activity and file hotspots for a Git repository."
)]
#[command(version)]
struct Cli {
    /// Path to the repository
    #[arg(short, long, default_value = ".")]
    repo: PathBuf,
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Branch to walk instead of HEAD
    #[arg(short, long)]
    branch: Option<String>,
    /// Case-insensitive substring of the author name or email
    #[arg(short, long)]
    author: Option<String>,
    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    since: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    until: Option<NaiveDate>,
    /// Number of hotspots to list
    #[arg(short = 'n', long)]
    top: Option<usize>,
    /// Only report commits that touched this path
    #[arg(short, long)]
    file: Option<String>,
    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    summary: &'a AuthorStats,
    hotspots: &'a [FileHotspot],
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn init_tracing() {
    #[cfg(feature = "dev")]
    let default_filter = "commitstats=debug";
    #[cfg(not(feature = "dev"))]
    let default_filter = "commitstats=info";

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<StatsConfig> {
    match path.or_else(StatsConfig::default_path) {
        Some(path) => StatsConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(StatsConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    debug!(?config, "loaded configuration");

    let source = GitCommitSource::open(&cli.repo, cli.branch, config.source.clone())
        .with_context(|| format!("failed to open repository at {}", cli.repo.display()))?;

    let mut filter = CommitFilter::new();
    if let Some(author) = cli.author {
        filter = filter.with_author(author);
    }
    if let Some(since) = cli.since {
        filter = filter.with_since(since);
    }
    if let Some(until) = cli.until {
        filter = filter.with_until(until);
    }

    let commits: Arc<[_]> = tokio::task::spawn_blocking(move || source.fetch_commits(&filter))
        .await?
        .context("failed to read commit history")?
        .into();
    info!(commits = commits.len(), "fetched commits");

    let classifier = ChangeClassifier::new(LineDiffEngine::new(config.diff.clone()));
    let adapter = ParallelCommitStatsAdapter::new(
        StatsCalculator::new(classifier.clone()),
        config.compute.max_parallel_tasks,
    );
    let mut with_stats = adapter.compute_all(commits.clone()).await;

    let top_n = cli.top.unwrap_or(config.hotspots.top_n);
    let hotspots = HotspotAnalyzer::new(classifier).analyze_hotspots(&with_stats, &commits, top_n);

    if let Some(path) = &cli.file {
        with_stats = HotspotAnalyzer::commits_touching(&with_stats, &commits, path);
        debug!(path = path.as_str(), commits = with_stats.len(), "narrowed to file");
    }
    let summary = StatsAggregator::new().aggregate(&with_stats);

    if cli.json {
        let report = Report {
            summary: &summary,
            hotspots: &hotspots,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{}", ui::render_summary(&summary));
    if cli.file.is_none() && !hotspots.is_empty() {
        println!("\nHotspots:");
        print!("{}", ui::render_hotspots(&hotspots));
    }
    if ui::is_large_commit(&summary.aggregated_stats, config.commit.large_commit_threshold)
        && summary.total_commits == 1
    {
        println!("\n{}", ui::large_commit_message(&summary.aggregated_stats));
    }
    Ok(())
}
