//! # Commit Statistics Library
//!
//! `commitstats` measures how much a set of file changes alters a code base. It
//! reduces change sets and Git commits to file and line counts, aggregates them
//! per author and per day, and ranks the files that change most often.
//!
//! ## Features
//!
//! - Line-level diffing with configurable whitespace handling
//! - Binary-aware change classification
//! - Bounded parallel computation over commit histories
//! - Daily activity buckets and newest-first commit listings
//! - File hotspot ranking with drill-down
//! - Debounced, cancellable recomputation for interactive front ends
//!
//! ## Example
//!
//! ```no_run
//! use commitstats::analysis::{CommitFilter, CommitSource, GitCommitSource};
//! use commitstats::analysis::{HotspotAnalyzer, ParallelCommitStatsAdapter, StatsAggregator};
//! use commitstats::config::SourceConfig;
//!
//! # async fn run() -> commitstats::error::Result<()> {
//! let source = GitCommitSource::open(".", None, SourceConfig::default())?;
//! let commits: std::sync::Arc<[_]> = source.fetch_commits(&CommitFilter::new())?.into();
//!
//! let with_stats = ParallelCommitStatsAdapter::default()
//!     .compute_all(commits.clone())
//!     .await;
//! let summary = StatsAggregator::new().aggregate(&with_stats);
//! let hotspots = HotspotAnalyzer::default().analyze_hotspots(&with_stats, &commits, 10);
//! println!("{} commits, {} hotspots", summary.total_commits, hotspots.len());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod app;
pub mod config;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use app::{App, DebouncedRecomputeController};
pub use config::StatsConfig;
pub use error::{Result, StatsError};
pub use types::{AuthorStats, ChangeRecord, CommitRecord, CommitWithStats, FileHotspot, Statistics};
