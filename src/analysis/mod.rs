mod cache;
pub mod aggregator;
pub mod calculator;
pub mod classify;
pub mod diff;
pub mod filter;
pub mod git;
pub mod hotspot;
pub mod parallel;


pub use aggregator::StatsAggregator;
pub use calculator::StatsCalculator;
pub use classify::{is_binary_path, ChangeClassifier, ChangeKind};
pub use diff::{count_lines, LineDelta, LineDiffEngine};
pub use filter::{normalize_date_range, CommitFilter, ResolvedFilter};
pub use git::{CommitSource, GitCommitSource};
pub use hotspot::HotspotAnalyzer;
pub use parallel::{get_optimal_task_count, ParallelCommitStatsAdapter};
