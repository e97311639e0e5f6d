use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::analysis::classify::{ChangeClassifier, ChangeKind};
use crate::error::{Result, StatsError};
use crate::types::{ChangeRecord, CommitRecord, CommitWithStats, FileHotspot};

/// Flat line estimate for an added or deleted file whose delta could not be recomputed.
const ESTIMATED_WHOLE_FILE_LINES: usize = 100;
/// Flat line estimate for a modified file whose delta could not be recomputed.
const ESTIMATED_MODIFIED_LINES: usize = 50;

/// Ranks files by how many commits touched them.
#[derive(Debug, Clone, Default)]
pub struct HotspotAnalyzer {
    classifier: ChangeClassifier,
}

impl HotspotAnalyzer {
    pub fn new(classifier: ChangeClassifier) -> Self {
        Self { classifier }
    }

    /// Top `top_n` files by modification count, ties in encounter order.
    ///
    /// Every change of every commit in `raw_commits` counts. `commits_with_stats`
    /// is the computed form of the same commits; callers narrowing the ranking
    /// pass the matching subset of raw commits.
    pub fn analyze_hotspots(
        &self,
        commits_with_stats: &[CommitWithStats],
        raw_commits: &[CommitRecord],
        top_n: usize,
    ) -> Vec<FileHotspot> {
        self.analyze(commits_with_stats, raw_commits, top_n, None)
            .unwrap_or_default()
    }

    /// Like [`analyze_hotspots`](Self::analyze_hotspots), checking `token` at every
    /// commit and change.
    pub fn analyze_hotspots_cancellable(
        &self,
        commits_with_stats: &[CommitWithStats],
        raw_commits: &[CommitRecord],
        top_n: usize,
        token: &CancellationToken,
    ) -> Result<Vec<FileHotspot>> {
        self.analyze(commits_with_stats, raw_commits, top_n, Some(token))
    }

    fn analyze(
        &self,
        _commits_with_stats: &[CommitWithStats],
        raw_commits: &[CommitRecord],
        top_n: usize,
        token: Option<&CancellationToken>,
    ) -> Result<Vec<FileHotspot>> {
        let cancelled = || token.is_some_and(CancellationToken::is_cancelled);

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut hotspots: Vec<FileHotspot> = Vec::new();

        for commit in raw_commits {
            if cancelled() {
                return Err(StatsError::Cancelled);
            }
            for change in &commit.changes {
                if cancelled() {
                    return Err(StatsError::Cancelled);
                }
                let Some(path) = change.path() else {
                    continue;
                };
                let lines = self.lines_changed(commit, change);
                let slot = *index.entry(path.to_string()).or_insert_with(|| {
                    hotspots.push(FileHotspot {
                        file_path: path.to_string(),
                        modification_count: 0,
                        total_lines_changed: 0,
                    });
                    hotspots.len() - 1
                });
                hotspots[slot].modification_count += 1;
                hotspots[slot].total_lines_changed += lines;
            }
        }

        hotspots.sort_by(|a, b| b.modification_count.cmp(&a.modification_count));
        hotspots.truncate(top_n);
        Ok(hotspots)
    }

    /// Lines added plus deleted for one change.
    ///
    /// Oversized diffs and unreadable content count as zero lines, matching the
    /// statistics computed for the same change. The flat estimates only cover a
    /// recomputation that fails in any other way, including a panicking loader.
    fn lines_changed(&self, commit: &CommitRecord, change: &ChangeRecord) -> usize {
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.classifier.try_classify(change)));
        let err = match outcome {
            Ok(Ok(stats)) => return stats.total_lines(),
            Ok(Err(
                err @ (StatsError::DiffTooLarge { .. } | StatsError::ContentUnavailable { .. }),
            )) => {
                debug!(
                    path = change.path().unwrap_or_default(),
                    commit = commit.short_id(),
                    "{err}, counting file without lines"
                );
                return 0;
            }
            Ok(Err(err)) => err.to_string(),
            Err(_) => "recomputation panicked".to_string(),
        };

        warn!(
            path = change.path().unwrap_or_default(),
            commit = commit.short_id(),
            error = err.as_str(),
            "failed to recompute file stats, using estimate"
        );
        match ChangeKind::of(change) {
            ChangeKind::Added { .. } | ChangeKind::Deleted { .. } => ESTIMATED_WHOLE_FILE_LINES,
            _ => ESTIMATED_MODIFIED_LINES,
        }
    }

    /// Commits from `commits_with_stats` whose raw commit touches `path` on either side.
    pub fn commits_touching(
        commits_with_stats: &[CommitWithStats],
        raw_commits: &[CommitRecord],
        path: &str,
    ) -> Vec<CommitWithStats> {
        let touching: HashSet<&str> = raw_commits
            .iter()
            .filter(|commit| commit.changes.iter().any(|change| change.touches(path)))
            .map(|commit| commit.id.as_str())
            .collect();
        commits_with_stats
            .iter()
            .filter(|commit| touching.contains(commit.hash.as_str()))
            .cloned()
            .collect()
    }
}
