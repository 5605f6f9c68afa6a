use std::sync::Arc;

use prep_core::model::{QuizAttempt, UserIdentity};
use prep_core::{AttemptAnalytics, DashboardMetrics, TimeFilter, TopicCatalog};
use storage::repository::AttemptRepository;

use crate::Clock;

/// Attempt history loaded once, recomputed per filter without re-reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSnapshot {
    pub attempts: Vec<QuizAttempt>,
    /// False when the store could not be read and the history is empty.
    pub loaded: bool,
}

/// Reads attempt history and turns it into dashboard metrics.
#[derive(Clone)]
pub struct DashboardService {
    clock: Clock,
    attempts: Arc<dyn AttemptRepository>,
    analytics: AttemptAnalytics,
}

impl DashboardService {
    #[must_use]
    pub fn new(clock: Clock, attempts: Arc<dyn AttemptRepository>, catalog: TopicCatalog) -> Self {
        Self {
            clock,
            attempts,
            analytics: AttemptAnalytics::new(catalog),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &TopicCatalog {
        self.analytics.catalog()
    }

    /// Full history for `user`; a failed read yields an empty snapshot.
    pub async fn snapshot(&self, user: &UserIdentity) -> DashboardSnapshot {
        match self.attempts.list_attempts(user).await {
            Ok(attempts) => {
                tracing::debug!(user = %user, attempts = attempts.len(), "loaded attempt history");
                DashboardSnapshot {
                    attempts,
                    loaded: true,
                }
            }
            Err(err) => {
                tracing::warn!(user = %user, error = %err, "attempt history unavailable");
                DashboardSnapshot {
                    attempts: Vec::new(),
                    loaded: false,
                }
            }
        }
    }

    #[must_use]
    pub fn metrics(&self, snapshot: &DashboardSnapshot, filter: TimeFilter) -> DashboardMetrics {
        if snapshot.attempts.is_empty() {
            return DashboardMetrics::empty(filter, self.analytics.catalog());
        }
        self.analytics
            .compute(&snapshot.attempts, filter, self.clock.now())
    }

    /// Read and compute in one step.
    pub async fn load(&self, user: &UserIdentity, filter: TimeFilter) -> DashboardMetrics {
        let snapshot = self.snapshot(user).await;
        self.metrics(&snapshot, filter)
    }
}
