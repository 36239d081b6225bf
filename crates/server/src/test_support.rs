//! Fixtures shared by the orchestrator and HTTP tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use data_loader::{Book, DataIndex, ItemId, Rating, RowRef, UserId};
use ml_client::{MLClientError, RatingModel};
use sources::{SearchHit, SourceError, VectorIndex};

use crate::context::RecommenderContext;

fn book(id: u64, title: &str, author: &str, category: &str) -> Book {
    Book {
        id: ItemId(id),
        title: title.to_string(),
        authors: vec![author.to_string()],
        image: format!("http://img/{}", id),
        categories: vec![category.to_string()],
    }
}

/// Five rated books, a duplicated catalog title and one unrated book.
///
/// Item indices follow first appearance in the ratings:
/// Dune 0, Emma 1, Walden 2, Ulysses 3, Persuasion 4.
pub fn build_test_context() -> Arc<RecommenderContext> {
    let books = vec![
        book(1, "Dune", "Frank Herbert", "Fiction"),
        book(2, "Emma", "Jane Austen", "Romance"),
        book(3, "Walden", "Henry David Thoreau", "Nature"),
        book(4, "Ulysses", "James Joyce", "Fiction"),
        book(5, "Persuasion", "Jane Austen", "Romance"),
        book(6, "Dune", "Somebody Else", "Reprint"),
        book(7, "Lonely Book", "Nobody", "Misc"),
    ];

    let rows = [
        ("alice", "Dune", 5.0),
        ("alice", "Emma", 4.0),
        ("alice", "Walden", 2.0),
        ("bob", "Dune", 4.0),
        ("bob", "Emma", 4.0),
        ("bob", "Ulysses", 3.0),
        ("carol", "Walden", 5.0),
        ("carol", "Ulysses", 4.0),
        ("carol", "Persuasion", 5.0),
        ("dave", "Persuasion", 1.0),
    ];
    let ratings: Vec<Rating> = rows
        .into_iter()
        .map(|(user, title, score)| Rating {
            user_id: UserId::new(user),
            title: title.to_string(),
            score,
        })
        .collect();

    let index = DataIndex::from_parts(books, ratings.clone(), ratings);
    Arc::new(RecommenderContext::build(index))
}

/// In-process model scoring every item by its index
pub struct IndexScoreModel;

#[tonic::async_trait]
impl RatingModel for IndexScoreModel {
    async fn predict(&self, _: u32, item_indices: Vec<u32>) -> Result<Vec<f32>, MLClientError> {
        Ok(item_indices.iter().map(|&item| item as f32).collect())
    }
}

/// Counts calls and never returns scores
#[derive(Default)]
pub struct CountingModel {
    calls: AtomicUsize,
}

impl CountingModel {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[tonic::async_trait]
impl RatingModel for CountingModel {
    async fn predict(&self, _: u32, _: Vec<u32>) -> Result<Vec<f32>, MLClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(MLClientError::ScoringError("unavailable".to_string()))
    }
}

/// Canned hits per descriptor, truncated to `k`
#[derive(Default)]
pub struct FakeIndex {
    pub hits: HashMap<String, Vec<u64>>,
    pub delay: Option<Duration>,
}

impl VectorIndex for FakeIndex {
    fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, SourceError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.hits.is_empty() {
            return Err(SourceError::RetrievalUnavailable("empty index".to_string()));
        }
        let rows = self
            .hits
            .get(query)
            .ok_or_else(|| SourceError::UnindexedQuery(query.to_string()))?;
        Ok(rows
            .iter()
            .take(k)
            .enumerate()
            .map(|(rank, &row)| SearchHit {
                row: RowRef(row),
                score: 1.0 - rank as f32 * 0.1,
            })
            .collect())
    }
}

/// Book 1 and book 2 are indexed; book 1's neighbors overlap book 2's
pub fn fake_index() -> Arc<FakeIndex> {
    let mut hits = HashMap::new();
    hits.insert("1".to_string(), vec![10, 11, 12]);
    hits.insert("2".to_string(), vec![20, 11]);
    Arc::new(FakeIndex { hits, delay: None })
}
