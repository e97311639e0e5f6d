//! Error types shared by the statistics engine and its collaborators.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Error, Debug)]
pub enum StatsError {
    /// Line comparison refused because the inputs are too large.
    #[error("diff too large: {lines} lines exceeds limit of {limit}")]
    DiffTooLarge { lines: usize, limit: usize },
    #[error("content unavailable for {path}: {reason}")]
    ContentUnavailable { path: String, reason: String },
    #[error("invalid change: neither side is present")]
    InvalidChange,
    /// Work was abandoned because a newer request superseded it.
    #[error("computation cancelled")]
    Cancelled,
    #[error("no git repository found at {0}")]
    NoRepository(String),
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl StatsError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StatsError::Cancelled)
    }
}
