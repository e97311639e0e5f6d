use chrono::{Local, TimeZone};
use std::collections::BTreeMap;

use crate::types::{AuthorStats, CommitWithStats, Statistics, TimeRange};

/// Folds per-commit statistics into totals, a newest-first list and daily buckets.
///
/// Days are calendar dates in the aggregator's time zone, the local zone unless
/// constructed with [`StatsAggregator::with_timezone`].
#[derive(Debug, Clone)]
pub struct StatsAggregator<Tz: TimeZone = Local> {
    tz: Tz,
}

impl Default for StatsAggregator<Local> {
    fn default() -> Self {
        Self { tz: Local }
    }
}

impl StatsAggregator<Local> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<Tz: TimeZone> StatsAggregator<Tz> {
    pub fn with_timezone(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn aggregate(&self, commits: &[CommitWithStats]) -> AuthorStats {
        let Some(first) = commits.first() else {
            return AuthorStats::default();
        };

        let aggregated_stats: Statistics = commits.iter().map(|c| &c.stats).sum();

        let mut daily_activity: BTreeMap<_, Statistics> = BTreeMap::new();
        for commit in commits {
            let day = commit.timestamp.with_timezone(&self.tz).date_naive();
            *daily_activity.entry(day).or_default() += commit.stats;
        }

        let mut start = first.timestamp;
        let mut end = first.timestamp;
        for commit in commits {
            start = start.min(commit.timestamp);
            end = end.max(commit.timestamp);
        }

        let mut sorted = commits.to_vec();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        AuthorStats {
            author: first.author.clone(),
            time_range: Some(TimeRange { start, end }),
            total_commits: commits.len(),
            aggregated_stats,
            commits: sorted,
            daily_activity,
        }
    }
}
