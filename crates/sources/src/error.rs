//! Errors raised by the recommendation sources.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The title has no row in the similarity pivot
    #[error("Book title not found in pivot table: {title}")]
    ItemNotFound { title: String },

    /// The vector index cannot be reached, failed to load, or is empty
    #[error("Vector index unavailable: {0}")]
    RetrievalUnavailable(String),

    /// The query descriptor has no document in the vector index
    #[error("Query '{0}' is not present in the vector index")]
    UnindexedQuery(String),
}
