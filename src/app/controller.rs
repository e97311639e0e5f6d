//! Debounced, cancellable recomputation.
//!
//! Every call to [`DebouncedRecomputeController::request_recompute`] supersedes the
//! previous one: pending work is cancelled, a fresh quiet period starts, and only
//! the computation started by the most recent request may publish its result.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::{spawn_blocking, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::analysis::{
    CommitFilter, CommitSource, HotspotAnalyzer, ParallelCommitStatsAdapter, StatsAggregator,
};
use crate::error::{Result, StatsError};
use crate::types::{AuthorStats, ChangeRecord, CommitRecord, FileHotspot, Statistics};

/// Receives published results. Called from runtime worker threads.
///
/// Results are published while the controller holds its state lock, so that a
/// superseded computation can never publish after a newer one. Implementations
/// must not call back into the controller synchronously; forward the result to
/// another task first if a publication should trigger a new request.
pub trait ResultSink: Send + Sync + 'static {
    /// Statistics for a pending change set, with whether they should be shown.
    fn publish_stats(&self, stats: Statistics, visible: bool);
    /// Aggregated history and its hotspot ranking.
    fn publish_history(&self, stats: AuthorStats, hotspots: Vec<FileHotspot>);
    /// The input could not be obtained at all.
    fn publish_error(&self, message: String);
}

/// The input a recomputation runs against. Cheap to clone; never mutated.
#[derive(Debug, Clone)]
pub enum InputSnapshot {
    /// Uncommitted changes, reduced to one statistics value
    ChangeSet(Arc<[ChangeRecord]>),
    /// Already fetched commits, aggregated with a hotspot ranking
    Commits {
        commits: Arc<[CommitRecord]>,
        top_n: usize,
    },
    /// Commits fetched from the pipeline's source with `filter`
    Query { filter: CommitFilter, top_n: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    ChangeSet(Statistics),
    History {
        stats: AuthorStats,
        hotspots: Vec<FileHotspot>,
    },
}

/// Runs one snapshot through calculation, aggregation and hotspot ranking.
pub struct Pipeline {
    adapter: ParallelCommitStatsAdapter,
    hotspots: Arc<HotspotAnalyzer>,
    aggregator: Arc<StatsAggregator>,
    source: Option<Arc<dyn CommitSource>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(ParallelCommitStatsAdapter::default(), HotspotAnalyzer::default())
    }
}

impl Pipeline {
    pub fn new(adapter: ParallelCommitStatsAdapter, hotspots: HotspotAnalyzer) -> Self {
        Self {
            adapter,
            hotspots: Arc::new(hotspots),
            aggregator: Arc::new(StatsAggregator::new()),
            source: None,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn CommitSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub async fn run(&self, snapshot: InputSnapshot, token: &CancellationToken) -> Result<Outcome> {
        match snapshot {
            InputSnapshot::ChangeSet(changes) => {
                let calculator = self.adapter.calculator();
                let token = token.clone();
                let stats =
                    spawn_blocking(move || calculator.compute_stats_cancellable(&changes, &token))
                        .await??;
                Ok(Outcome::ChangeSet(stats))
            }
            InputSnapshot::Commits { commits, top_n } => self.history(commits, top_n, token).await,
            InputSnapshot::Query { filter, top_n } => {
                let source = self.source.clone().ok_or_else(|| {
                    StatsError::NoRepository("no commit source configured".to_string())
                })?;
                let commits = spawn_blocking(move || source.fetch_commits(&filter)).await??;
                if token.is_cancelled() {
                    return Err(StatsError::Cancelled);
                }
                self.history(commits.into(), top_n, token).await
            }
        }
    }

    async fn history(
        &self,
        commits: Arc<[CommitRecord]>,
        top_n: usize,
        token: &CancellationToken,
    ) -> Result<Outcome> {
        let with_stats: Arc<[_]> = self
            .adapter
            .compute_all_cancellable(commits.clone(), token)
            .await?
            .into();

        let aggregate = {
            let aggregator = self.aggregator.clone();
            let with_stats = with_stats.clone();
            spawn_blocking(move || aggregator.aggregate(&with_stats))
        };
        let ranking = {
            let analyzer = self.hotspots.clone();
            let token = token.clone();
            spawn_blocking(move || {
                analyzer.analyze_hotspots_cancellable(&with_stats, &commits, top_n, &token)
            })
        };

        let (stats, hotspots) = tokio::join!(aggregate, ranking);
        Ok(Outcome::History {
            stats: stats?,
            hotspots: hotspots??,
        })
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    generation: u64,
    current: Option<CancellationToken>,
    computing: bool,
    runs: u64,
}

/// Coalesces bursts of input changes into at most one in-flight computation.
pub struct DebouncedRecomputeController<S: ResultSink> {
    pipeline: Arc<Pipeline>,
    sink: Arc<S>,
    quiet_period: Duration,
    root: CancellationToken,
    state: Arc<Mutex<ControllerState>>,
}

impl<S: ResultSink> DebouncedRecomputeController<S> {
    pub fn new(pipeline: Pipeline, sink: Arc<S>, quiet_period: Duration) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            sink,
            quiet_period,
            root: CancellationToken::new(),
            state: Arc::new(Mutex::new(ControllerState::default())),
        }
    }

    /// Schedule a recomputation against `snapshot`, superseding any earlier request.
    ///
    /// Must be called from within a tokio runtime. The returned handle may be
    /// dropped; the task runs to completion or cancellation either way.
    pub fn request_recompute(&self, snapshot: InputSnapshot) -> JoinHandle<()> {
        let (generation, token) = {
            let mut state = lock(&self.state);
            if let Some(previous) = state.current.take() {
                previous.cancel();
            }
            state.generation += 1;
            state.computing = false;
            let token = self.root.child_token();
            state.current = Some(token.clone());
            (state.generation, token)
        };

        let pipeline = self.pipeline.clone();
        let sink = self.sink.clone();
        let state = self.state.clone();
        let quiet_period = self.quiet_period;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(generation, "request superseded during quiet period");
                    return;
                }
                _ = tokio::time::sleep(quiet_period) => {}
            }

            {
                let mut state = lock(&state);
                if state.generation != generation {
                    return;
                }
                state.computing = true;
                state.runs += 1;
            }

            let outcome = pipeline.run(snapshot, &token).await;

            let mut state = lock(&state);
            if state.generation != generation || token.is_cancelled() {
                debug!(generation, "discarding superseded result");
                return;
            }
            state.computing = false;
            state.current = None;
            match outcome {
                Ok(Outcome::ChangeSet(stats)) => sink.publish_stats(stats, true),
                Ok(Outcome::History { stats, hotspots }) => sink.publish_history(stats, hotspots),
                Err(StatsError::Cancelled) => debug!(generation, "computation cancelled"),
                Err(err) => {
                    warn!(error = %err, "recompute failed");
                    sink.publish_error(err.to_string());
                }
            }
        })
    }

    /// Cancel outstanding work and hide the change-set statistics.
    pub fn finish(&self) {
        self.cancel_current();
        self.sink.publish_stats(Statistics::default(), false);
    }

    /// Cancel everything this controller has scheduled, now and in the future.
    pub fn shutdown(&self) {
        self.root.cancel();
        self.cancel_current();
    }

    pub fn is_computing(&self) -> bool {
        lock(&self.state).computing
    }

    /// Number of computations that got past their quiet period.
    pub fn runs(&self) -> u64 {
        lock(&self.state).runs
    }

    fn cancel_current(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.computing = false;
        if let Some(token) = state.current.take() {
            token.cancel();
        }
    }
}

impl<S: ResultSink> Drop for DebouncedRecomputeController<S> {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

fn lock(state: &Mutex<ControllerState>) -> MutexGuard<'_, ControllerState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
