//! # Common Types
//!
//! This module contains the value types passed between the statistics engine, its
//! aggregators and the collaborators that feed it: change and commit records on the
//! input side, statistics and summaries on the output side.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::sync::Arc;

use crate::error::Result;

/// Change-volume counters for one change, one commit, or any sum of them.
///
/// `Statistics` forms a commutative monoid under field-wise addition with
/// `Statistics::default()` as the identity. Every reduction in the crate goes
/// through `+`, `+=` or `Sum`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Statistics {
    /// Number of files changed in place (text or binary)
    pub files_modified: usize,
    /// Number of files that did not exist before
    pub files_added: usize,
    /// Number of files that no longer exist after
    pub files_deleted: usize,
    /// Lines present only on the after side
    pub lines_added: usize,
    /// Lines present only on the before side
    pub lines_deleted: usize,
    /// Modified files whose content was treated as binary
    pub binary_files_modified: usize,
}

impl Statistics {
    pub fn total_files(&self) -> usize {
        self.files_modified + self.files_added + self.files_deleted
    }

    pub fn total_lines(&self) -> usize {
        self.lines_added + self.lines_deleted
    }

    pub fn is_empty(&self) -> bool {
        *self == Statistics::default()
    }
}

impl Add for Statistics {
    type Output = Statistics;

    fn add(self, other: Statistics) -> Statistics {
        Statistics {
            files_modified: self.files_modified + other.files_modified,
            files_added: self.files_added + other.files_added,
            files_deleted: self.files_deleted + other.files_deleted,
            lines_added: self.lines_added + other.lines_added,
            lines_deleted: self.lines_deleted + other.lines_deleted,
            binary_files_modified: self.binary_files_modified + other.binary_files_modified,
        }
    }
}

impl AddAssign for Statistics {
    fn add_assign(&mut self, other: Statistics) {
        *self = *self + other;
    }
}

impl Sum for Statistics {
    fn sum<I: Iterator<Item = Statistics>>(iter: I) -> Statistics {
        iter.fold(Statistics::default(), Add::add)
    }
}

impl<'a> Sum<&'a Statistics> for Statistics {
    fn sum<I: Iterator<Item = &'a Statistics>>(iter: I) -> Statistics {
        iter.copied().sum()
    }
}

/// Content of one side of a change, as reported by its loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Binary,
}

/// Lazily retrieves the content of one revision of a file.
///
/// Loaders are called from worker threads, possibly more than once for the same
/// revision (the hotspot pass recomputes per-file deltas). An `Err` means the blob
/// could not be read; callers degrade instead of propagating it.
pub trait ContentLoader: Send + Sync {
    fn load(&self) -> Result<Content>;
}

impl ContentLoader for Content {
    fn load(&self) -> Result<Content> {
        Ok(self.clone())
    }
}

/// One side (before or after) of a file transition.
#[derive(Clone)]
pub struct Revision {
    /// Repository-relative path of the file on this side
    pub path: String,
    content: Arc<dyn ContentLoader>,
}

impl Revision {
    pub fn new(path: impl Into<String>, content: Arc<dyn ContentLoader>) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }

    pub fn text(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(path, Arc::new(Content::Text(text.into())))
    }

    pub fn binary(path: impl Into<String>) -> Self {
        Self::new(path, Arc::new(Content::Binary))
    }

    pub fn load(&self) -> Result<Content> {
        self.content.load()
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Revision").field("path", &self.path).finish_non_exhaustive()
    }
}

/// A single file's transition within one commit or change set.
///
/// At least one side should be present. A record with neither side is accepted
/// and classified as invalid, contributing nothing.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    pub before: Option<Revision>,
    pub after: Option<Revision>,
}

impl ChangeRecord {
    pub fn added(after: Revision) -> Self {
        Self {
            before: None,
            after: Some(after),
        }
    }

    pub fn deleted(before: Revision) -> Self {
        Self {
            before: Some(before),
            after: None,
        }
    }

    pub fn modified(before: Revision, after: Revision) -> Self {
        Self {
            before: Some(before),
            after: Some(after),
        }
    }

    /// The path used to identify this change: after-path, else before-path.
    pub fn path(&self) -> Option<&str> {
        self.after
            .as_ref()
            .or(self.before.as_ref())
            .map(|rev| rev.path.as_str())
    }

    /// True if either side of the change lives at `path`.
    pub fn touches(&self, path: &str) -> bool {
        self.after.as_ref().is_some_and(|rev| rev.path == path)
            || self.before.as_ref().is_some_and(|rev| rev.path == path)
    }
}

/// A commit as fetched from the commit source.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    /// Full commit hash
    pub id: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    /// First line of the commit message
    pub message: String,
    /// File transitions in the order the source reported them
    pub changes: Vec<ChangeRecord>,
}

impl CommitRecord {
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map(|(idx, _)| idx)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }
}

/// A commit's identity and metadata paired with its computed statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitWithStats {
    pub hash: String,
    pub author: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub stats: Statistics,
}

impl CommitWithStats {
    pub fn from_commit(commit: &CommitRecord, stats: Statistics) -> Self {
        Self {
            hash: commit.id.clone(),
            author: commit.author_name.clone(),
            author_email: commit.author_email.clone(),
            timestamp: commit.timestamp,
            message: commit.message.clone(),
            stats,
        }
    }
}

/// Earliest and latest commit timestamps observed in an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Aggregated view over a set of commits, rebuilt from scratch on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorStats {
    /// Author label of the first commit seen, empty when there were no commits
    pub author: String,
    pub time_range: Option<TimeRange>,
    pub total_commits: usize,
    pub aggregated_stats: Statistics,
    /// Commits sorted newest first
    pub commits: Vec<CommitWithStats>,
    /// Summed statistics per calendar day
    pub daily_activity: BTreeMap<NaiveDate, Statistics>,
}

/// A file ranked by how often it was modified across a commit set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHotspot {
    pub file_path: String,
    /// Number of changes touching this path
    pub modification_count: usize,
    /// Sum of added and deleted lines across those changes
    pub total_lines_changed: usize,
}

impl FileHotspot {
    pub fn file_name(&self) -> &str {
        self.file_path
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.file_path)
    }
}
