//! Filter to remove books the user has already rated.
//!
//! This is the first filter in the prediction pipeline; a rated book is
//! never a candidate.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, UserContext};

/// Removes candidates whose title the user has already rated.
///
/// ## Algorithm
/// Uses the HashSet in UserContext.rated_titles for O(1) lookups.
pub struct AlreadyRatedFilter;

impl Filter for AlreadyRatedFilter {
    fn name(&self) -> &str {
        "AlreadyRatedFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !context.rated_titles.contains(&candidate.title))
            .collect();
        Ok(filtered)
    }
}
