use super::*;
use crate::analysis::{CommitFilter, CommitSource};
use crate::error::{Result, StatsError};
use crate::types::{
    AuthorStats, ChangeRecord, CommitRecord, Content, ContentLoader, FileHotspot, Revision,
    Statistics,
};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

const QUIET: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq)]
enum Published {
    Stats(Statistics, bool),
    History(AuthorStats, Vec<FileHotspot>),
    Error(String),
}

#[derive(Default)]
struct RecordingSink {
    published: Mutex<Vec<Published>>,
}

impl RecordingSink {
    fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }
}

impl ResultSink for RecordingSink {
    fn publish_stats(&self, stats: Statistics, visible: bool) {
        self.published.lock().unwrap().push(Published::Stats(stats, visible));
    }

    fn publish_history(&self, stats: AuthorStats, hotspots: Vec<FileHotspot>) {
        self.published.lock().unwrap().push(Published::History(stats, hotspots));
    }

    fn publish_error(&self, message: String) {
        self.published.lock().unwrap().push(Published::Error(message));
    }
}

/// Blocks inside `load` until released, announcing when it has started.
struct GatedText {
    text: &'static str,
    started: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl ContentLoader for GatedText {
    fn load(&self) -> Result<Content> {
        let _ = self.started.lock().unwrap().send(());
        let _ = self.release.lock().unwrap().recv();
        Ok(Content::Text(self.text.to_string()))
    }
}

struct FailingSource;

impl CommitSource for FailingSource {
    fn fetch_commits(&self, _filter: &CommitFilter) -> Result<Vec<CommitRecord>> {
        Err(StatsError::NoRepository("/nowhere".to_string()))
    }

    fn authors(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

struct FixedSource(Vec<CommitRecord>);

impl CommitSource for FixedSource {
    fn fetch_commits(&self, _filter: &CommitFilter) -> Result<Vec<CommitRecord>> {
        Ok(self.0.clone())
    }

    fn authors(&self) -> Result<Vec<String>> {
        Ok(vec!["Alice".to_string()])
    }
}

fn change_set(line_count: usize) -> InputSnapshot {
    let text: String = (0..line_count).map(|i| format!("line {i}\n")).collect();
    InputSnapshot::ChangeSet(vec![ChangeRecord::added(Revision::text("f.txt", text))].into())
}

fn added_lines(count: usize) -> Statistics {
    Statistics {
        files_added: 1,
        lines_added: count,
        ..Statistics::default()
    }
}

fn sample_commit() -> CommitRecord {
    CommitRecord {
        id: "0123456789abcdef".to_string(),
        author_name: "Alice".to_string(),
        author_email: "alice@example.com".to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        message: "Add readme".to_string(),
        changes: vec![ChangeRecord::added(Revision::text("README.md", "# hi\n\ntext\n"))],
    }
}

fn controller(sink: Arc<RecordingSink>) -> DebouncedRecomputeController<RecordingSink> {
    DebouncedRecomputeController::new(Pipeline::default(), sink, QUIET)
}

#[tokio::test(start_paused = true)]
async fn test_burst_runs_once_against_last_snapshot() {
    let sink = Arc::new(RecordingSink::default());
    let controller = controller(sink.clone());

    let first = controller.request_recompute(change_set(1));
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = controller.request_recompute(change_set(2));
    tokio::time::sleep(Duration::from_millis(50)).await;
    let third = controller.request_recompute(change_set(3));

    for handle in [first, second, third] {
        handle.await.unwrap();
    }

    assert_eq!(controller.runs(), 1);
    assert_eq!(sink.published(), vec![Published::Stats(added_lines(3), true)]);
    assert!(!controller.is_computing());
}

#[tokio::test(start_paused = true)]
async fn test_spaced_requests_each_publish() {
    let sink = Arc::new(RecordingSink::default());
    let controller = controller(sink.clone());

    controller.request_recompute(change_set(1)).await.unwrap();
    controller.request_recompute(change_set(4)).await.unwrap();

    assert_eq!(controller.runs(), 2);
    assert_eq!(
        sink.published(),
        vec![
            Published::Stats(added_lines(1), true),
            Published::Stats(added_lines(4), true),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_in_flight_result_is_discarded_when_superseded() {
    let sink = Arc::new(RecordingSink::default());
    let quiet = Duration::from_millis(10);
    let controller = DebouncedRecomputeController::new(Pipeline::default(), sink.clone(), quiet);

    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gated = GatedText {
        text: "a\nb\n",
        started: Mutex::new(started_tx),
        release: Mutex::new(release_rx),
    };
    let first = controller.request_recompute(InputSnapshot::ChangeSet(
        vec![ChangeRecord::added(Revision::new("gated.txt", Arc::new(gated)))].into(),
    ));

    tokio::task::spawn_blocking(move || started_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(controller.is_computing());

    let second = controller.request_recompute(change_set(7));
    release_tx.send(()).unwrap();

    first.await.unwrap();
    second.await.unwrap();

    assert_eq!(controller.runs(), 2);
    assert_eq!(sink.published(), vec![Published::Stats(added_lines(7), true)]);
}

/// Records publications and signals a follow-up task after each one.
struct ForwardingSink {
    inner: RecordingSink,
    notify: tokio::sync::mpsc::UnboundedSender<()>,
}

impl ResultSink for ForwardingSink {
    fn publish_stats(&self, stats: Statistics, visible: bool) {
        self.inner.publish_stats(stats, visible);
        let _ = self.notify.send(());
    }

    fn publish_history(&self, stats: AuthorStats, hotspots: Vec<FileHotspot>) {
        self.inner.publish_history(stats, hotspots);
        let _ = self.notify.send(());
    }

    fn publish_error(&self, message: String) {
        self.inner.publish_error(message);
        let _ = self.notify.send(());
    }
}

#[tokio::test(start_paused = true)]
async fn test_sink_reenters_controller_through_another_task() {
    let (notify, mut notified) = tokio::sync::mpsc::unbounded_channel();
    let sink = Arc::new(ForwardingSink {
        inner: RecordingSink::default(),
        notify,
    });
    let controller = Arc::new(DebouncedRecomputeController::new(
        Pipeline::default(),
        sink.clone(),
        QUIET,
    ));

    let follow_up = {
        let controller = controller.clone();
        tokio::spawn(async move {
            notified.recv().await;
            controller.request_recompute(change_set(5)).await.unwrap();
        })
    };

    controller.request_recompute(change_set(1)).await.unwrap();
    follow_up.await.unwrap();

    assert_eq!(controller.runs(), 2);
    assert_eq!(
        sink.inner.published(),
        vec![
            Published::Stats(added_lines(1), true),
            Published::Stats(added_lines(5), true),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_commit_snapshot_publishes_history() {
    let sink = Arc::new(RecordingSink::default());
    let controller = controller(sink.clone());

    let snapshot = InputSnapshot::Commits {
        commits: vec![sample_commit()].into(),
        top_n: 5,
    };
    controller.request_recompute(snapshot).await.unwrap();

    let published = sink.published();
    assert_eq!(published.len(), 1);
    let Published::History(stats, hotspots) = &published[0] else {
        panic!("expected history, got {published:?}");
    };
    assert_eq!(stats.total_commits, 1);
    assert_eq!(stats.author, "Alice");
    assert_eq!(stats.aggregated_stats, added_lines(3));
    assert_eq!(
        hotspots,
        &vec![FileHotspot {
            file_path: "README.md".to_string(),
            modification_count: 1,
            total_lines_changed: 3,
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_query_uses_source() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::default().with_source(Arc::new(FixedSource(vec![sample_commit()])));
    let controller = DebouncedRecomputeController::new(pipeline, sink.clone(), QUIET);

    let snapshot = InputSnapshot::Query {
        filter: CommitFilter::new().with_author("alice"),
        top_n: 10,
    };
    controller.request_recompute(snapshot).await.unwrap();

    match sink.published().as_slice() {
        [Published::History(stats, _)] => assert_eq!(stats.total_commits, 1),
        other => panic!("unexpected publications: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_source_failure_publishes_error() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Pipeline::default().with_source(Arc::new(FailingSource));
    let controller = DebouncedRecomputeController::new(pipeline, sink.clone(), QUIET);

    let snapshot = InputSnapshot::Query {
        filter: CommitFilter::new(),
        top_n: 10,
    };
    controller.request_recompute(snapshot).await.unwrap();

    match sink.published().as_slice() {
        [Published::Error(message)] => assert!(message.contains("/nowhere")),
        other => panic!("unexpected publications: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_finish_cancels_and_hides() {
    let sink = Arc::new(RecordingSink::default());
    let controller = controller(sink.clone());

    let pending = controller.request_recompute(change_set(2));
    controller.finish();
    pending.await.unwrap();

    assert_eq!(controller.runs(), 0);
    assert_eq!(sink.published(), vec![Published::Stats(Statistics::default(), false)]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending() {
    let sink = Arc::new(RecordingSink::default());
    let controller = controller(sink.clone());

    let pending = controller.request_recompute(change_set(2));
    controller.shutdown();
    pending.await.unwrap();

    let late = controller.request_recompute(change_set(3));
    late.await.unwrap();

    assert!(sink.published().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_app_state_as_sink() {
    let app = Arc::new(Mutex::new(App::new(2)));
    let controller = DebouncedRecomputeController::new(Pipeline::default(), app.clone(), QUIET);

    controller.request_recompute(change_set(3)).await.unwrap();
    {
        let app = app.lock().unwrap();
        assert_eq!(app.current_stats, added_lines(3));
        assert_eq!(app.status_text(), "1 file, +3/-0");
        assert!(app.is_large_commit());
        assert!(app.tooltip_text().unwrap().contains("1 file added"));
    }

    controller.finish();
    let app = app.lock().unwrap();
    assert!(!app.stats_visible);
    assert_eq!(app.status_text(), "");
}

#[test]
fn test_app_error_state_clears_history() {
    let mut app = App::default();
    app.update_with_history(AuthorStats::default(), vec![]);
    assert!(app.author_stats.is_some());

    app.set_error("no git repository found".to_string());
    assert!(app.author_stats.is_none());
    assert_eq!(app.error_message.as_deref(), Some("no git repository found"));

    app.update_with_history(AuthorStats::default(), vec![]);
    assert!(app.error_message.is_none());
}
