//! Runtime knobs for the recommendation service.

use std::time::Duration;

use sources::DEFAULT_RETRIEVAL_BUDGET;

/// Tuning for request handling.
///
/// ```ignore
/// let config = ServiceConfig::default()
///     .with_retrieval_budget(50)
///     .with_model_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Total number of neighbors requested across all embedding queries
    pub retrieval_budget: usize,
    /// Upper bound on a similarity or vector search job
    pub retrieval_timeout: Duration,
    /// Upper bound on one rating model call
    pub model_timeout: Duration,
    /// Number of blocking jobs allowed to run at once
    pub max_blocking_jobs: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            retrieval_budget: DEFAULT_RETRIEVAL_BUDGET,
            retrieval_timeout: Duration::from_secs(5),
            model_timeout: Duration::from_secs(10),
            max_blocking_jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

impl ServiceConfig {
    pub fn with_retrieval_budget(mut self, budget: usize) -> Self {
        self.retrieval_budget = budget;
        self
    }

    pub fn with_retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.retrieval_timeout = timeout;
        self
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    /// Zero is bumped to one so requests cannot wait forever for a permit
    pub fn with_max_blocking_jobs(mut self, jobs: usize) -> Self {
        self.max_blocking_jobs = jobs.max(1);
        self
    }
}
