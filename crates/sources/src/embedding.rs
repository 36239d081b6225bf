//! Semantic nearest-neighbor retrieval over item embeddings
//!
//! Each seed item is looked up in a precomputed vector index by its textual
//! descriptor (the stringified item id). The total result budget is split
//! evenly across seeds, so more seeds mean fewer results per seed.

use crate::error::SourceError;
use crate::types::SearchHit;
use data_loader::{ItemId, RowRef};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Total number of results requested across all seeds
pub const DEFAULT_RETRIEVAL_BUDGET: usize = 100;

/// Narrow capability interface over a vector store.
///
/// `similarity_search` returns at most `k` hits ordered by descending
/// similarity. Implementations must be safe for concurrent reads.
pub trait VectorIndex: Send + Sync {
    fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, SourceError>;
}

/// Per-seed result count: `max(1, round(total_budget / num_queries))`
///
/// Halves round to even (100 / 8 = 12.5 gives 12).
pub fn per_query_k(total_budget: usize, num_queries: usize) -> usize {
    if num_queries == 0 {
        return total_budget.max(1);
    }
    let k = (total_budget as f64 / num_queries as f64).round_ties_even() as usize;
    k.max(1)
}

/// Drives a [`VectorIndex`] for a set of seed items
#[derive(Clone)]
pub struct EmbeddingRetriever {
    index: Arc<dyn VectorIndex>,
}

impl EmbeddingRetriever {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self { index }
    }

    /// Row references related to the seed items
    ///
    /// For every seed, `per_query_k` hits are requested and the first
    /// (best) hit is dropped, on the assumption that it is the seed itself.
    /// Results are concatenated in seed order, then similarity order. Rows
    /// found for several seeds appear once per seed.
    #[instrument(skip(self, queries), fields(queries = queries.len()))]
    pub fn retrieve(&self, queries: &[ItemId], total_budget: usize) -> Result<Vec<RowRef>, SourceError> {
        let k = per_query_k(total_budget, queries.len());
        debug!("Requesting {} hits per query", k);

        let mut rows = Vec::new();
        for item_id in queries {
            let hits = self.index.similarity_search(&item_id.to_string(), k)?;
            rows.extend(hits.into_iter().skip(1).map(|hit| hit.row));
        }

        debug!("Retrieved {} rows for {} queries", rows.len(), queries.len());
        Ok(rows)
    }
}
