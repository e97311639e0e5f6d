use chrono::{DateTime, Utc};
use git2::{Delta, DiffFile, ErrorCode, Oid, Repository, Sort};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::analysis::cache::AuthorCache;
use crate::analysis::filter::CommitFilter;
use crate::config::SourceConfig;
use crate::error::{Result, StatsError};
use crate::types::{ChangeRecord, CommitRecord, Content, ContentLoader, Revision};

/// Supplies commits to the statistics pipeline.
pub trait CommitSource: Send + Sync {
    /// Commits matching `filter`, newest first.
    fn fetch_commits(&self, filter: &CommitFilter) -> Result<Vec<CommitRecord>>;

    /// Sorted, de-duplicated author names of recent commits.
    fn authors(&self) -> Result<Vec<String>>;
}

/// Reads commits and blob contents from a Git repository.
pub struct GitCommitSource {
    repo: Arc<Mutex<Repository>>,
    branch: Option<String>,
    config: SourceConfig,
    authors: Mutex<AuthorCache>,
}

impl GitCommitSource {
    /// Open the repository at `path`, walking `branch` (or HEAD when unset or missing).
    pub fn open<P: AsRef<Path>>(
        path: P,
        branch: Option<String>,
        config: SourceConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|err| match err.code() {
            ErrorCode::NotFound => StatsError::NoRepository(path.display().to_string()),
            _ => StatsError::Git(err),
        })?;
        Ok(Self {
            repo: Arc::new(Mutex::new(repo)),
            branch,
            config,
            authors: Mutex::new(AuthorCache::new()),
        })
    }

    /// Forget the cached author list so the next call re-reads history.
    pub fn invalidate_authors(&self) {
        if let Ok(mut cache) = self.authors.lock() {
            cache.clear();
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Repository>> {
        self.repo
            .lock()
            .map_err(|_| StatsError::Git(git2::Error::from_str("repository lock poisoned")))
    }

    /// Commit ids reachable from the configured branch, newest first.
    fn walk(&self, repo: &Repository) -> Result<Vec<Oid>> {
        match repo.head() {
            Err(err) if err.code() == ErrorCode::UnbornBranch => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
            Ok(_) => {}
        }

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;

        let branch_ref = self
            .branch
            .as_deref()
            .and_then(|name| repo.find_branch(name, git2::BranchType::Local).ok());
        match branch_ref.as_ref().and_then(|b| b.get().name()) {
            Some(ref_name) => revwalk.push_ref(ref_name)?,
            None => {
                if let Some(name) = &self.branch {
                    debug!(branch = name.as_str(), "branch not found, falling back to HEAD");
                }
                revwalk.push_head()?
            }
        }

        Ok(revwalk.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn build_commit(
        &self,
        repo: &Repository,
        commit: &git2::Commit<'_>,
        timestamp: DateTime<Utc>,
    ) -> Result<CommitRecord> {
        let tree = commit.tree()?;
        let parent_tree = match commit.parent_count() {
            0 => None,
            _ => Some(commit.parent(0)?.tree()?),
        };
        let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let changes = diff
            .deltas()
            .filter_map(|delta| match delta.status() {
                Delta::Added => self.revision(&delta.new_file()).map(ChangeRecord::added),
                Delta::Deleted => self.revision(&delta.old_file()).map(ChangeRecord::deleted),
                Delta::Modified | Delta::Renamed | Delta::Copied | Delta::Typechange => {
                    match (self.revision(&delta.old_file()), self.revision(&delta.new_file())) {
                        (Some(before), Some(after)) => Some(ChangeRecord::modified(before, after)),
                        _ => None,
                    }
                }
                _ => None,
            })
            .collect();

        let author = commit.author();
        Ok(CommitRecord {
            id: commit.id().to_string(),
            author_name: author.name().unwrap_or("Unknown").to_string(),
            author_email: author.email().unwrap_or_default().to_string(),
            timestamp,
            message: commit.summary().unwrap_or_default().to_string(),
            changes,
        })
    }

    fn revision(&self, file: &DiffFile<'_>) -> Option<Revision> {
        let path = file.path()?.to_string_lossy().into_owned();
        let loader = GitBlob {
            repo: self.repo.clone(),
            oid: file.id(),
            path: path.clone(),
        };
        Some(Revision::new(path, Arc::new(loader)))
    }
}

impl CommitSource for GitCommitSource {
    fn fetch_commits(&self, filter: &CommitFilter) -> Result<Vec<CommitRecord>> {
        let resolved = filter.resolve();
        let repo = self.lock()?;
        let mut commits = Vec::new();

        for oid in self.walk(&repo)? {
            if self.config.max_commits.is_some_and(|max| commits.len() >= max) {
                break;
            }
            let commit = repo.find_commit(oid)?;
            let author = commit.author();
            if !resolved.matches_author(author.name().unwrap_or(""), author.email().unwrap_or("")) {
                continue;
            }

            let secs = commit.time().seconds();
            let Some(timestamp) = DateTime::<Utc>::from_timestamp(secs, 0) else {
                warn!(commit = %oid, secs, "commit has an invalid timestamp, skipping");
                continue;
            };
            if !resolved.matches_time(&timestamp) {
                continue;
            }

            commits.push(self.build_commit(&repo, &commit, timestamp)?);
        }

        info!(
            commits = commits.len(),
            author = filter.author.as_deref().unwrap_or(""),
            since = ?filter.since,
            until = ?filter.until,
            "fetched commits"
        );
        Ok(commits)
    }

    fn authors(&self) -> Result<Vec<String>> {
        let cached = self
            .authors
            .lock()
            .ok()
            .and_then(|cache| cache.get().map(<[String]>::to_vec));
        if let Some(authors) = cached {
            return Ok(authors);
        }

        let authors: Vec<String> = {
            let repo = self.lock()?;
            let mut names = BTreeSet::new();
            for oid in self.walk(&repo)?.into_iter().take(self.config.author_sample) {
                let commit = repo.find_commit(oid)?;
                let author = commit.author();
                if let Some(name) = author.name() {
                    if !name.trim().is_empty() {
                        names.insert(name.to_string());
                    }
                }
            }
            names.into_iter().collect()
        };

        info!(authors = authors.len(), "loaded unique authors");
        if let Ok(mut cache) = self.authors.lock() {
            cache.store(authors.clone());
        }
        Ok(authors)
    }
}

/// Loads one blob on demand.
struct GitBlob {
    repo: Arc<Mutex<Repository>>,
    oid: Oid,
    path: String,
}

impl ContentLoader for GitBlob {
    fn load(&self) -> Result<Content> {
        let unavailable = |reason: String| StatsError::ContentUnavailable {
            path: self.path.clone(),
            reason,
        };
        let repo = self
            .repo
            .lock()
            .map_err(|_| unavailable("repository lock poisoned".to_string()))?;
        let blob = repo
            .find_blob(self.oid)
            .map_err(|err| unavailable(err.message().to_string()))?;
        if blob.is_binary() {
            return Ok(Content::Binary);
        }
        Ok(match std::str::from_utf8(blob.content()) {
            Ok(text) => Content::Text(text.to_string()),
            Err(_) => Content::Binary,
        })
    }
}
