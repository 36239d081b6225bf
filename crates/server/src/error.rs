//! Error type shared by the orchestrator and the HTTP layer.

use std::time::Duration;

use data_loader::{ItemId, UserId};
use ml_client::MLClientError;
use sources::SourceError;
use thiserror::Error;

/// Everything a recommendation request can fail with.
///
/// Identifier failures are reported before any expensive work starts and
/// are never retried.
#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("Book {0} not found in catalog")]
    BookNotFound(ItemId),

    #[error("Item not found in similarity matrix: {0}")]
    ItemNotFound(String),

    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    #[error("Item {0} is not in the vector index")]
    UnindexedQuery(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Vector index unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Rating model failed: {0}")]
    Model(#[from] MLClientError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecommendError {
    /// Whether the error means the requested identifier does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BookNotFound(_)
                | Self::ItemNotFound(_)
                | Self::UnknownUser(_)
                | Self::UnindexedQuery(_)
        )
    }
}

impl From<SourceError> for RecommendError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::ItemNotFound { title } => Self::ItemNotFound(title),
            SourceError::RetrievalUnavailable(reason) => Self::RetrievalUnavailable(reason),
            SourceError::UnindexedQuery(query) => Self::UnindexedQuery(query),
        }
    }
}
