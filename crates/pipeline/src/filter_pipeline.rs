//! Chains filters into a single candidate-narrowing pass.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, UserContext};
use tracing::debug;

/// Ordered list of filters applied one after another.
///
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(AlreadyRatedFilter)
///     .add_filter(KnownItemFilter::new(encoding.clone()));
///
/// let scorable = pipeline.apply(candidates, &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Append a filter (builder pattern)
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every filter in insertion order, stopping at the first failure.
    pub fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        let mut current = candidates;
        for filter in &self.filters {
            let before = current.len();
            current = filter.apply(current, context)?;
            debug!(
                filter = filter.name(),
                before,
                after = current.len(),
                "Filter applied"
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::AlreadyRatedFilter;
    use data_loader::UserId;

    struct FailingFilter;

    impl Filter for FailingFilter {
        fn name(&self) -> &str {
            "FailingFilter"
        }

        fn apply(&self, _: Vec<Candidate>, _: &UserContext) -> Result<Vec<Candidate>> {
            anyhow::bail!("boom")
        }
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        let context = UserContext::new(UserId::new("u1"));

        let candidates = vec![Candidate::new("Dune", 0), Candidate::new("Emma", 1)];

        let filtered = pipeline.apply(candidates.clone(), &context).unwrap();
        assert_eq!(filtered, candidates);
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_single_filter() {
        let mut context = UserContext::new(UserId::new("u1"));
        context.rated_titles.insert("Dune".to_string());

        let pipeline = FilterPipeline::new().add_filter(AlreadyRatedFilter);

        let candidates = vec![Candidate::new("Dune", 0), Candidate::new("Emma", 1)];

        let filtered = pipeline.apply(candidates, &context).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Emma");
    }

    #[test]
    fn test_failure_propagates() {
        let context = UserContext::new(UserId::new("u1"));
        let pipeline = FilterPipeline::new()
            .add_filter(AlreadyRatedFilter)
            .add_filter(FailingFilter);

        let result = pipeline.apply(vec![Candidate::new("Dune", 0)], &context);
        assert!(result.is_err());
        assert_eq!(pipeline.len(), 2);
    }
}
