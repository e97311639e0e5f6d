use once_cell::sync::Lazy;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::analysis::diff::{count_lines, LineDiffEngine};
use crate::error::{Result, StatsError};
use crate::types::{ChangeRecord, Content, Revision, Statistics};

static BINARY_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // images
        "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg",
        // documents
        "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
        // archives
        "zip", "tar", "gz", "rar", "7z",
        // executables and libraries
        "exe", "dll", "so", "dylib",
        // jvm
        "class", "jar", "war", "ear",
        // media
        "mp3", "mp4", "avi", "mov", "mkv",
        // fonts
        "ttf", "otf", "woff", "woff2",
    ]
    .into_iter()
    .collect()
});

/// True if the path's extension is on the binary allow-list.
///
/// Only the final path segment is inspected, so a dotted directory name does not
/// count as an extension. Matching is case-insensitive.
pub fn is_binary_path(path: &str) -> bool {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((_, ext)) => BINARY_EXTENSIONS.contains(ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

/// The case a single change falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added { binary: bool },
    Deleted { binary: bool },
    ModifiedText,
    ModifiedBinary,
    Invalid,
}

impl ChangeKind {
    /// Decide the case from paths alone; content may still turn a text case binary.
    pub fn of(change: &ChangeRecord) -> Self {
        match (&change.before, &change.after) {
            (None, Some(after)) => ChangeKind::Added {
                binary: is_binary_path(&after.path),
            },
            (Some(before), None) => ChangeKind::Deleted {
                binary: is_binary_path(&before.path),
            },
            (Some(before), Some(after)) => {
                if is_binary_path(&after.path) || is_binary_path(&before.path) {
                    ChangeKind::ModifiedBinary
                } else {
                    ChangeKind::ModifiedText
                }
            }
            (None, None) => ChangeKind::Invalid,
        }
    }

    /// Statistics for this case when no line counts are available.
    pub fn count_only(self) -> Statistics {
        match self {
            ChangeKind::Added { .. } => Statistics {
                files_added: 1,
                ..Statistics::default()
            },
            ChangeKind::Deleted { .. } => Statistics {
                files_deleted: 1,
                ..Statistics::default()
            },
            ChangeKind::ModifiedText => Statistics {
                files_modified: 1,
                ..Statistics::default()
            },
            ChangeKind::ModifiedBinary => Statistics {
                files_modified: 1,
                binary_files_modified: 1,
                ..Statistics::default()
            },
            ChangeKind::Invalid => Statistics::default(),
        }
    }
}

/// Turns one change into its statistics.
#[derive(Debug, Clone, Default)]
pub struct ChangeClassifier {
    engine: LineDiffEngine,
}

impl ChangeClassifier {
    pub fn new(engine: LineDiffEngine) -> Self {
        Self { engine }
    }

    /// Classify a change, degrading to the count-only outcome when content cannot be
    /// read or the diff is refused.
    pub fn classify(&self, change: &ChangeRecord) -> Statistics {
        let kind = ChangeKind::of(change);
        match self.try_classify(change) {
            Ok(stats) => stats,
            Err(StatsError::InvalidChange) => {
                warn!("change has neither a before nor an after revision, ignoring");
                Statistics::default()
            }
            Err(err @ StatsError::DiffTooLarge { .. }) => {
                debug!(path = change.path().unwrap_or_default(), "{err}, counting file only");
                kind.count_only()
            }
            Err(err) => {
                warn!(path = change.path().unwrap_or_default(), "{err}, counting file only");
                kind.count_only()
            }
        }
    }

    /// Classify a change, propagating content and diff failures.
    pub fn try_classify(&self, change: &ChangeRecord) -> Result<Statistics> {
        let kind = ChangeKind::of(change);
        match (kind, &change.before, &change.after) {
            (ChangeKind::Added { binary: false }, _, Some(after)) => Ok(match load(after)? {
                Content::Text(text) => Statistics {
                    lines_added: count_lines(&text),
                    ..kind.count_only()
                },
                Content::Binary => kind.count_only(),
            }),
            (ChangeKind::Deleted { binary: false }, Some(before), _) => {
                Ok(match load(before)? {
                    Content::Text(text) => Statistics {
                        lines_deleted: count_lines(&text),
                        ..kind.count_only()
                    },
                    Content::Binary => kind.count_only(),
                })
            }
            (ChangeKind::ModifiedText, Some(before), Some(after)) => {
                match (load(before)?, load(after)?) {
                    (Content::Text(old), Content::Text(new)) => {
                        let delta = self.engine.diff(&old, &new)?;
                        Ok(Statistics {
                            lines_added: delta.added,
                            lines_deleted: delta.deleted,
                            ..kind.count_only()
                        })
                    }
                    _ => Ok(ChangeKind::ModifiedBinary.count_only()),
                }
            }
            (ChangeKind::Invalid, _, _) => Err(StatsError::InvalidChange),
            _ => Ok(kind.count_only()),
        }
    }
}

fn load(revision: &Revision) -> Result<Content> {
    revision.load().map_err(|err| match err {
        StatsError::ContentUnavailable { .. } => err,
        other => StatsError::ContentUnavailable {
            path: revision.path.clone(),
            reason: other.to_string(),
        },
    })
}
