use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analysis::calculator::StatsCalculator;
use crate::error::{Result, StatsError};
use crate::types::{CommitRecord, CommitWithStats, Statistics};

/// Get optimal number of parallel tasks based on system resources
pub fn get_optimal_task_count() -> usize {
    let cpu_count = num_cpus::get();
    // Use 75% of available CPUs to leave room for other system processes
    (cpu_count * 3 / 4).max(1)
}

/// Computes statistics for many commits concurrently.
///
/// Each commit is reduced on the blocking pool, at most `max_tasks` at a time. A
/// commit whose computation fails is kept with a degraded value so the output
/// always has one entry per input commit, in input order.
#[derive(Debug, Clone)]
pub struct ParallelCommitStatsAdapter {
    calculator: Arc<StatsCalculator>,
    max_tasks: usize,
}

impl Default for ParallelCommitStatsAdapter {
    fn default() -> Self {
        Self::new(StatsCalculator::default(), None)
    }
}

impl ParallelCommitStatsAdapter {
    pub fn new(calculator: StatsCalculator, max_tasks: Option<usize>) -> Self {
        Self {
            calculator: Arc::new(calculator),
            max_tasks: max_tasks.unwrap_or_else(get_optimal_task_count).max(1),
        }
    }

    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    pub fn calculator(&self) -> Arc<StatsCalculator> {
        self.calculator.clone()
    }

    pub async fn compute_all(&self, commits: Arc<[CommitRecord]>) -> Vec<CommitWithStats> {
        let outcomes = self.fan_out(commits.clone(), CancellationToken::new()).await;
        commits
            .iter()
            .zip(outcomes)
            .map(|(commit, outcome)| resolve(commit, outcome))
            .collect()
    }

    /// Like [`compute_all`](Self::compute_all), but abandons the whole batch with
    /// [`StatsError::Cancelled`] once `token` fires.
    pub async fn compute_all_cancellable(
        &self,
        commits: Arc<[CommitRecord]>,
        token: &CancellationToken,
    ) -> Result<Vec<CommitWithStats>> {
        let outcomes = self.fan_out(commits.clone(), token.clone()).await;
        let cancelled = outcomes
            .iter()
            .any(|outcome| matches!(outcome, Err(err) if err.is_cancelled()));
        if token.is_cancelled() || cancelled {
            debug!("commit batch cancelled");
            return Err(StatsError::Cancelled);
        }
        Ok(commits
            .iter()
            .zip(outcomes)
            .map(|(commit, outcome)| resolve(commit, outcome))
            .collect())
    }

    async fn fan_out(
        &self,
        commits: Arc<[CommitRecord]>,
        token: CancellationToken,
    ) -> Vec<Result<Statistics>> {
        let start_time = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.max_tasks));

        let handles: Vec<_> = (0..commits.len())
            .map(|idx| {
                let commits = commits.clone();
                let calculator = self.calculator.clone();
                let semaphore = semaphore.clone();
                let token = token.clone();
                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| StatsError::Cancelled)?;
                    if token.is_cancelled() {
                        return Err(StatsError::Cancelled);
                    }
                    spawn_blocking(move || {
                        calculator.compute_stats_cancellable(&commits[idx].changes, &token)
                    })
                    .await?
                })
            })
            .collect();

        let outcomes: Vec<Result<Statistics>> = join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.map_err(StatsError::from).and_then(|outcome| outcome))
            .collect();

        let elapsed_secs = start_time.elapsed().as_secs_f64();
        info!(
            commits = commits.len(),
            elapsed_secs,
            commits_per_sec = commits.len() as f64 / elapsed_secs.max(f64::EPSILON),
            parallel_tasks = self.max_tasks,
            "computed commit statistics"
        );
        outcomes
    }
}

/// Substitute the degraded value `{files_modified = change_count}` for a failed commit.
fn resolve(commit: &CommitRecord, outcome: Result<Statistics>) -> CommitWithStats {
    let stats = outcome.unwrap_or_else(|err| {
        warn!(
            commit = commit.short_id(),
            error = %err,
            "failed to compute stats for commit, reporting file count only"
        );
        Statistics {
            files_modified: commit.change_count(),
            ..Statistics::default()
        }
    });
    CommitWithStats::from_commit(commit, stats)
}
