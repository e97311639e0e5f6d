//! Runtime configuration loaded from `config.toml`.
//!
//! Every section is optional; missing keys fall back to the defaults below.
//!
//! ```toml
//! [diff]
//! policy = "default"
//! max_lines = 200000
//!
//! [debounce]
//! quiet_period_ms = 300
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub diff: DiffConfig,
    pub compute: ComputeConfig,
    pub debounce: DebounceConfig,
    pub hotspots: HotspotConfig,
    pub commit: CommitConfig,
    pub source: SourceConfig,
}

impl StatsConfig {
    /// Load configuration from a TOML file, or defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// `<config dir>/commitstats/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("commitstats").join("config.toml"))
    }
}

/// How lines are normalized before comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonPolicy {
    /// Ignore whitespace at the end of each line
    #[default]
    Default,
    /// Compare lines byte for byte
    Exact,
    /// Ignore all whitespace inside a line
    IgnoreWhitespace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub policy: ComparisonPolicy,
    /// Combined before+after line count above which a diff is refused
    pub max_lines: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            policy: ComparisonPolicy::Default,
            max_lines: 200_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeConfig {
    /// Upper bound on concurrently computed commits; derived from the CPU count when unset
    pub max_parallel_tasks: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub quiet_period_ms: u64,
}

impl DebounceConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotspotConfig {
    pub top_n: usize,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self { top_n: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    /// Changed lines above which a pending commit is reported as large
    pub large_commit_threshold: usize,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            large_commit_threshold: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Maximum number of commits fetched per query; unlimited when unset
    pub max_commits: Option<usize>,
    /// Number of recent commits scanned to build the author list
    pub author_sample: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            max_commits: None,
            author_sample: 1000,
        }
    }
}
