//! # Recommendation Orchestrator
//!
//! Entry point for the three recommendation flows:
//! 1. Similarity: books whose rating vectors are closest to a given book
//! 2. Embedding: dataset rows semantically related to a set of seed books
//! 3. Prediction: books the rating model expects a user to rate highest
//!
//! Identifiers are resolved before any expensive work. CPU-bound searches
//! run on the blocking pool, bounded by a semaphore and a timeout.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use data_loader::{Book, ItemId, RowRef, UserId};
use ml_client::RatingModel;
use pipeline::filters::{AlreadyRatedFilter, KnownItemFilter};
use pipeline::{FilterPipeline, enumerate_candidates, rank_by_score, top_rated_history};
use sources::user_context::build_user_context;
use sources::{EmbeddingRetriever, SourceError, VectorIndex};

use crate::config::ServiceConfig;
use crate::context::RecommenderContext;
use crate::error::RecommendError;
use crate::predictor::RatingPredictor;

/// Number of predicted books returned to a user
pub const PREDICTION_TOP_N: usize = 10;

/// Number of the user's own top-rated books returned alongside
pub const HISTORY_TOP_N: usize = 5;

/// A book in a similarity result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummary {
    pub title: String,
    pub authors: Vec<String>,
    pub image: String,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            authors: book.authors.clone(),
            image: book.image.clone(),
        }
    }
}

/// A book in a user recommendation result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookBrief {
    pub title: String,
    pub categories: Vec<String>,
}

/// A result entry together with the score that ranked it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scored<T> {
    #[serde(flatten)]
    pub item: T,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecommendations {
    pub user_id: UserId,
    /// The user's own best-rated books, best first
    pub top_books_user: Vec<BookBrief>,
    /// Predicted books, best first
    pub recommended_books: Vec<BookBrief>,
}

/// [`UserRecommendations`] with the user's ratings and the predicted ratings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredUserRecommendations {
    pub user_id: UserId,
    pub top_books_user: Vec<Scored<BookBrief>>,
    pub recommended_books: Vec<Scored<BookBrief>>,
}

impl From<ScoredUserRecommendations> for UserRecommendations {
    fn from(scored: ScoredUserRecommendations) -> Self {
        Self {
            user_id: scored.user_id,
            top_books_user: scored.top_books_user.into_iter().map(|s| s.item).collect(),
            recommended_books: scored.recommended_books.into_iter().map(|s| s.item).collect(),
        }
    }
}

/// Coordinates the recommendation flows over a shared [`RecommenderContext`]
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    context: Arc<RecommenderContext>,
    retriever: EmbeddingRetriever,
    predictor: RatingPredictor,
    filter_pipeline: Arc<FilterPipeline>,
    config: ServiceConfig,
    blocking_jobs: Arc<Semaphore>,
}

impl RecommendationOrchestrator {
    /// Wire the flows to a vector index and a rating model.
    pub fn new(
        context: Arc<RecommenderContext>,
        vector_index: Arc<dyn VectorIndex>,
        model: Arc<dyn RatingModel>,
        config: ServiceConfig,
    ) -> Self {
        let retriever = EmbeddingRetriever::new(vector_index);
        let predictor = RatingPredictor::new(context.encoding.clone(), model, config.model_timeout);
        let filter_pipeline = Arc::new(
            FilterPipeline::new()
                .add_filter(AlreadyRatedFilter)
                .add_filter(KnownItemFilter::new(context.encoding.clone())),
        );
        let blocking_jobs = Arc::new(Semaphore::new(config.max_blocking_jobs.max(1)));

        Self {
            context,
            retriever,
            predictor,
            filter_pipeline,
            config,
            blocking_jobs,
        }
    }

    pub fn context(&self) -> &RecommenderContext {
        &self.context
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Books most similar to `id` by rating vectors, most similar first.
    pub async fn similar_books(&self, id: ItemId, amount: usize) -> Result<Vec<BookSummary>, RecommendError> {
        let scored = self.similar_books_with_scores(id, amount).await?;
        Ok(scored.into_iter().map(|s| s.item).collect())
    }

    /// [`similar_books`](Self::similar_books) with cosine similarities
    #[instrument(skip(self))]
    pub async fn similar_books_with_scores(
        &self,
        id: ItemId,
        amount: usize,
    ) -> Result<Vec<Scored<BookSummary>>, RecommendError> {
        let data_index = &self.context.data_index;
        let title = data_index
            .get_book(id)
            .map(|book| book.title.clone())
            .ok_or(RecommendError::BookNotFound(id))?;

        let similarity = self.context.similarity.clone();
        let neighbors = self
            .run_blocking("similarity search", move || {
                similarity.nearest_neighbors(&title, amount)
            })
            .await?;

        let books = neighbors
            .into_iter()
            .filter_map(|neighbor| match data_index.get_book_by_title(&neighbor.title) {
                Some(book) => Some(Scored {
                    item: BookSummary::from(book),
                    score: neighbor.similarity,
                }),
                None => {
                    warn!("Neighbor '{}' has no catalog entry, skipping", neighbor.title);
                    None
                }
            })
            .collect();
        Ok(books)
    }

    /// Dataset rows semantically related to the seed books.
    ///
    /// The configured retrieval budget is split across the seeds. An empty
    /// seed list yields an empty result.
    #[instrument(skip(self, ids), fields(seeds = ids.len()))]
    pub async fn related_rows(&self, ids: &[ItemId]) -> Result<Vec<RowRef>, RecommendError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let retriever = self.retriever.clone();
        let seeds = ids.to_vec();
        let budget = self.config.retrieval_budget;
        self.run_blocking("vector search", move || retriever.retrieve(&seeds, budget))
            .await
    }

    /// The user's own favourites and the books the model predicts they
    /// would rate highest.
    ///
    /// Always returns at most [`PREDICTION_TOP_N`] predictions; `amount` is
    /// only logged.
    pub async fn recommend_for_user(
        &self,
        user_id: UserId,
        amount: usize,
    ) -> Result<UserRecommendations, RecommendError> {
        self.recommend_for_user_with_scores(user_id, amount)
            .await
            .map(UserRecommendations::from)
    }

    /// [`recommend_for_user`](Self::recommend_for_user) with the user's
    /// ratings and the predicted ratings
    #[instrument(skip(self, user_id), fields(user = %user_id))]
    pub async fn recommend_for_user_with_scores(
        &self,
        user_id: UserId,
        amount: usize,
    ) -> Result<ScoredUserRecommendations, RecommendError> {
        let start = Instant::now();

        // Resolve the user before enumerating anything
        self.context
            .encoding
            .encode_user(&user_id)
            .map_err(|_| RecommendError::UnknownUser(user_id.clone()))?;

        if amount != PREDICTION_TOP_N {
            info!(
                "Requested {} recommendations, returning at most {}",
                amount, PREDICTION_TOP_N
            );
        }

        let data_index = &self.context.data_index;
        let user_context = build_user_context(data_index, &user_id);

        let candidates = enumerate_candidates(data_index);
        let total = candidates.len();
        let scorable = self
            .filter_pipeline
            .apply(candidates, &user_context)
            .map_err(|e| RecommendError::Internal(format!("filtering failed: {:#}", e)))?;
        info!("Scoring {} of {} catalog titles", scorable.len(), total);

        let predictions = self.predictor.predict(&user_id, scorable).await?;
        let recommended_books = rank_by_score(predictions, PREDICTION_TOP_N)
            .into_iter()
            .map(|(candidate, score)| Scored {
                item: self.brief(&candidate.title),
                score,
            })
            .collect();

        let top_books_user = top_rated_history(&user_context.history, HISTORY_TOP_N)
            .into_iter()
            .map(|rating| Scored {
                item: self.brief(&rating.title),
                score: rating.score,
            })
            .collect();

        info!("Recommendations ready in {:.2?}", start.elapsed());
        Ok(ScoredUserRecommendations {
            user_id,
            top_books_user,
            recommended_books,
        })
    }

    fn brief(&self, title: &str) -> BookBrief {
        let categories = self
            .context
            .data_index
            .get_book_by_title(title)
            .map(|book| book.categories.clone())
            .unwrap_or_default();
        BookBrief {
            title: title.to_string(),
            categories,
        }
    }

    /// Run a CPU-bound search on the blocking pool.
    ///
    /// Waiting for a permit counts against the retrieval timeout. The permit
    /// stays held until the job returns, even after a timeout.
    async fn run_blocking<T, F>(&self, operation: &'static str, job: F) -> Result<T, RecommendError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, SourceError> + Send + 'static,
    {
        let timeout = self.config.retrieval_timeout;
        let semaphore = self.blocking_jobs.clone();

        let run = async move {
            let permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| RecommendError::Internal(e.to_string()))?;
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                job()
            })
            .await
            .map_err(|e| RecommendError::Internal(format!("{} task failed: {}", operation, e)))
        };

        let result = tokio::time::timeout(timeout, run)
            .await
            .map_err(|_| RecommendError::Timeout { operation, timeout })??;
        Ok(result?)
    }
}
