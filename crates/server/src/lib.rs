//! Server crate for the book recommendation service.
//!
//! Wires the loaded data, the sources and the rating model into the
//! [`RecommendationOrchestrator`] and exposes it over HTTP.

pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod predictor;

#[cfg(test)]
mod test_support;

pub use config::ServiceConfig;
pub use context::RecommenderContext;
pub use error::RecommendError;
pub use orchestrator::{
    BookBrief, BookSummary, HISTORY_TOP_N, PREDICTION_TOP_N, RecommendationOrchestrator, Scored,
    ScoredUserRecommendations, UserRecommendations,
};
pub use predictor::RatingPredictor;
