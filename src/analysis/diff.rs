use similar::{capture_diff_slices, Algorithm, DiffOp};
use std::borrow::Cow;

use crate::config::{ComparisonPolicy, DiffConfig};
use crate::error::{Result, StatsError};

/// Added and deleted line counts produced by one comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineDelta {
    pub added: usize,
    pub deleted: usize,
}

/// Line-granularity comparison of two text blobs.
#[derive(Debug, Clone, Default)]
pub struct LineDiffEngine {
    config: DiffConfig,
}

impl LineDiffEngine {
    pub fn new(config: DiffConfig) -> Self {
        Self { config }
    }

    /// Count lines only on the before side as deletions and lines only on the
    /// after side as additions.
    ///
    /// Fails with [`StatsError::DiffTooLarge`] when the combined line count is
    /// above the configured limit.
    pub fn diff(&self, before: &str, after: &str) -> Result<LineDelta> {
        let old_lines = self.normalized_lines(before);
        let new_lines = self.normalized_lines(after);

        let total = old_lines.len() + new_lines.len();
        if total > self.config.max_lines {
            return Err(StatsError::DiffTooLarge {
                lines: total,
                limit: self.config.max_lines,
            });
        }

        let mut delta = LineDelta::default();
        for op in capture_diff_slices(Algorithm::Myers, &old_lines, &new_lines) {
            match op {
                DiffOp::Equal { .. } => {}
                DiffOp::Delete { old_len, .. } => delta.deleted += old_len,
                DiffOp::Insert { new_len, .. } => delta.added += new_len,
                DiffOp::Replace {
                    old_len, new_len, ..
                } => {
                    delta.deleted += old_len;
                    delta.added += new_len;
                }
            }
        }
        Ok(delta)
    }

    fn normalized_lines<'a>(&self, text: &'a str) -> Vec<Cow<'a, str>> {
        text.lines()
            .map(|line| match self.config.policy {
                ComparisonPolicy::Exact => Cow::Borrowed(line),
                ComparisonPolicy::Default => Cow::Borrowed(line.trim_end()),
                ComparisonPolicy::IgnoreWhitespace => {
                    Cow::Owned(line.chars().filter(|c| !c.is_whitespace()).collect())
                }
            })
            .collect()
    }
}

/// Number of lines in `content`, counting an unterminated final line.
pub fn count_lines(content: &str) -> usize {
    if content.is_empty() {
        return 0;
    }
    let terminators = content.bytes().filter(|&b| b == b'\n').count();
    if content.ends_with('\n') {
        terminators
    } else {
        terminators + 1
    }
}
