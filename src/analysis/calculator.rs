use tokio_util::sync::CancellationToken;

use crate::analysis::classify::ChangeClassifier;
use crate::error::{Result, StatsError};
use crate::types::{ChangeRecord, Statistics};

/// Reduces a change set to one [`Statistics`] value.
#[derive(Debug, Clone, Default)]
pub struct StatsCalculator {
    classifier: ChangeClassifier,
}

impl StatsCalculator {
    pub fn new(classifier: ChangeClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &ChangeClassifier {
        &self.classifier
    }

    pub fn compute_stats(&self, changes: &[ChangeRecord]) -> Statistics {
        changes
            .iter()
            .map(|change| self.classifier.classify(change))
            .sum()
    }

    /// Like [`compute_stats`](Self::compute_stats), but checks `token` before every
    /// change. A cancelled run yields [`StatsError::Cancelled`], never a partial sum.
    pub fn compute_stats_cancellable(
        &self,
        changes: &[ChangeRecord],
        token: &CancellationToken,
    ) -> Result<Statistics> {
        let mut total = Statistics::default();
        for change in changes {
            if token.is_cancelled() {
                return Err(StatsError::Cancelled);
            }
            total += self.classifier.classify(change);
        }
        Ok(total)
    }
}
