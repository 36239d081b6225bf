//! The immutable state every request reads from.

use std::sync::Arc;
use std::time::Instant;

use data_loader::{DataIndex, IdentifierIndex};
use sources::SimilarityEngine;
use tracing::info;

/// Catalog, identifier encodings and similarity matrix.
///
/// Built once before serving and shared behind an `Arc`; nothing in here
/// changes afterwards.
#[derive(Debug)]
pub struct RecommenderContext {
    pub data_index: Arc<DataIndex>,
    pub encoding: Arc<IdentifierIndex>,
    pub similarity: Arc<SimilarityEngine>,
}

impl RecommenderContext {
    /// Derive the encodings and the similarity matrix from a loaded index.
    pub fn build(data_index: DataIndex) -> Self {
        let start = Instant::now();
        let encoding = IdentifierIndex::from_data_index(&data_index);
        info!(
            users = encoding.num_users(),
            items = encoding.num_items(),
            "Built identifier encodings"
        );

        let similarity = SimilarityEngine::build(data_index.pivot_ratings());
        info!(
            rows = similarity.len(),
            elapsed = ?start.elapsed(),
            "Built similarity matrix"
        );

        Self {
            data_index: Arc::new(data_index),
            encoding: Arc::new(encoding),
            similarity: Arc::new(similarity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Book, ItemId, Rating, UserId};

    #[test]
    fn test_build_from_index() {
        let books = vec![
            Book {
                id: ItemId(1),
                title: "Dune".to_string(),
                authors: vec![],
                image: String::new(),
                categories: vec![],
            },
            Book {
                id: ItemId(2),
                title: "Emma".to_string(),
                authors: vec![],
                image: String::new(),
                categories: vec![],
            },
        ];
        let ratings = vec![
            Rating {
                user_id: UserId::new("u1"),
                title: "Dune".to_string(),
                score: 4.0,
            },
            Rating {
                user_id: UserId::new("u2"),
                title: "Emma".to_string(),
                score: 3.0,
            },
            Rating {
                user_id: UserId::new("u3"),
                title: "Not In Catalog".to_string(),
                score: 3.0,
            },
        ];
        let index = DataIndex::from_parts(books, ratings.clone(), ratings);

        let context = RecommenderContext::build(index);
        assert_eq!(context.encoding.num_users(), 2);
        assert_eq!(context.encoding.num_items(), 2);
        // The pivot is built from the unjoined ratings
        assert_eq!(context.similarity.len(), 3);
    }
}
