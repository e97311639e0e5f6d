use chrono::{DateTime, Utc};
use std::sync::Mutex;
use tracing::warn;

use super::controller::ResultSink;
use super::ui;
use crate::types::{AuthorStats, FileHotspot, Statistics};

/// Latest published results, as shown to the user
#[derive(Clone, Debug)]
pub struct App {
    pub current_stats: Statistics,
    pub stats_visible: bool,
    pub author_stats: Option<AuthorStats>,
    pub hotspots: Vec<FileHotspot>,
    pub error_message: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub large_commit_threshold: usize,
}

impl App {
    pub fn new(large_commit_threshold: usize) -> Self {
        Self {
            large_commit_threshold,
            ..Self::default()
        }
    }

    /// Update the app state with statistics for the pending change set
    pub fn update_with_stats(&mut self, stats: Statistics, visible: bool) {
        self.current_stats = stats;
        self.stats_visible = visible;
        self.last_updated = Some(Utc::now());
    }

    /// Update the app state with a new history aggregation
    pub fn update_with_history(&mut self, stats: AuthorStats, hotspots: Vec<FileHotspot>) {
        self.author_stats = Some(stats);
        self.hotspots = hotspots;
        self.error_message = None;
        self.last_updated = Some(Utc::now());
    }

    /// Replace the history view with an explicit error state
    pub fn set_error(&mut self, message: String) {
        self.author_stats = None;
        self.hotspots.clear();
        self.error_message = Some(message);
    }

    pub fn status_text(&self) -> String {
        ui::status_text(&self.current_stats, self.stats_visible)
    }

    pub fn tooltip_text(&self) -> Option<String> {
        ui::tooltip_text(&self.current_stats, self.stats_visible)
    }

    /// Whether the pending change set should trigger a large-commit warning
    pub fn is_large_commit(&self) -> bool {
        ui::is_large_commit(&self.current_stats, self.large_commit_threshold)
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            current_stats: Statistics::default(),
            stats_visible: false,
            author_stats: None,
            hotspots: Vec::new(),
            error_message: None,
            last_updated: None,
            large_commit_threshold: 500,
        }
    }
}

/// Thread-safe sink that lets the recompute controller publish into shared app state
impl ResultSink for Mutex<App> {
    fn publish_stats(&self, stats: Statistics, visible: bool) {
        if let Ok(mut app) = self.lock() {
            app.update_with_stats(stats, visible);
        } else {
            warn!("failed to acquire app lock while publishing stats");
        }
    }

    fn publish_history(&self, stats: AuthorStats, hotspots: Vec<FileHotspot>) {
        if let Ok(mut app) = self.lock() {
            app.update_with_history(stats, hotspots);
        } else {
            warn!("failed to acquire app lock while publishing history");
        }
    }

    fn publish_error(&self, message: String) {
        if let Ok(mut app) = self.lock() {
            app.set_error(message);
        } else {
            warn!("failed to acquire app lock while publishing error");
        }
    }
}
