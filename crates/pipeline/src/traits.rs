//! Core traits for the filtering pipeline.

use anyhow::Result;
use sources::{Candidate, UserContext};

/// A single stage that narrows the prediction candidate set.
///
/// Filters take ownership of the candidates and must keep the relative order
/// of the ones they retain; ranking breaks score ties by enumeration order.
pub trait Filter: Send + Sync {
    /// Name used in pipeline logs
    fn name(&self) -> &str;

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &UserContext,
    ) -> Result<Vec<Candidate>>;
}
