//! Filter to keep only books the rating model was trained on.
//!
//! A title that never appeared in the merged ratings has no row in the
//! model's item table and cannot be scored. Such candidates are dropped
//! silently instead of failing the request.

use crate::traits::Filter;
use anyhow::Result;
use data_loader::IdentifierIndex;
use sources::{Candidate, UserContext};
use std::sync::Arc;
use tracing::debug;

/// Drops candidates unknown to the IdentifierIndex and records the item
/// index of the ones it keeps.
pub struct KnownItemFilter {
    encoding: Arc<IdentifierIndex>,
}

impl KnownItemFilter {
    pub fn new(encoding: Arc<IdentifierIndex>) -> Self {
        Self { encoding }
    }
}

impl Filter for KnownItemFilter {
    fn name(&self) -> &str {
        "KnownItemFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        _context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        let total = candidates.len();
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter_map(|mut candidate| {
                let index = self.encoding.encode_item(&candidate.title).ok()?;
                candidate.item_index = Some(index);
                Some(candidate)
            })
            .collect();

        if filtered.len() < total {
            debug!("Dropped {} cold candidates", total - filtered.len());
        }
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{ItemIndex, Rating, UserId};

    fn encoding() -> Arc<IdentifierIndex> {
        let ratings = vec![
            Rating {
                user_id: UserId::new("u1"),
                title: "Emma".to_string(),
                score: 4.0,
            },
            Rating {
                user_id: UserId::new("u2"),
                title: "Dune".to_string(),
                score: 5.0,
            },
        ];
        Arc::new(IdentifierIndex::build(&ratings))
    }

    #[test]
    fn test_known_item_filter() {
        let context = UserContext::new(UserId::new("u1"));
        let candidates = vec![
            Candidate::new("Dune", 0),
            Candidate::new("Never Rated", 1),
            Candidate::new("Emma", 2),
        ];

        let filtered = KnownItemFilter::new(encoding())
            .apply(candidates, &context)
            .unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].title, "Dune");
        assert_eq!(filtered[0].item_index, Some(ItemIndex(1)));
        assert_eq!(filtered[1].title, "Emma");
        assert_eq!(filtered[1].item_index, Some(ItemIndex(0)));
    }
}
