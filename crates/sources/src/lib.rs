//! # Sources Crate
//!
//! The two retrieval strategies that do not need the rating model.
//!
//! ## Components
//!
//! ### Similarity engine (item-item)
//! Cosine similarity between the rating vectors of two books:
//! - "Readers who rated this book also rated..."
//! - Precomputed once into a dense symmetric matrix
//!
//! ### Embedding retriever (semantic)
//! Nearest neighbors in a precomputed embedding index:
//! - Queried through the narrow [`VectorIndex`] trait
//! - [`PersistedVectorIndex`] reads the index the embedding job persisted
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{EmbeddingRetriever, PersistedVectorIndex, SimilarityEngine};
//! use std::sync::Arc;
//!
//! let engine = SimilarityEngine::build(data_index.pivot_ratings());
//! let neighbors = engine.nearest_neighbors("Dune", 5)?;
//!
//! let index = Arc::new(PersistedVectorIndex::open(Path::new("db/index.json"))?);
//! let rows = EmbeddingRetriever::new(index).retrieve(&[ItemId(12)], 100)?;
//! ```

// Public modules
pub mod embedding;
pub mod error;
pub mod similarity;
pub mod types;
pub mod user_context;
pub mod vector_store;

// Re-export commonly used types
pub use embedding::{DEFAULT_RETRIEVAL_BUDGET, EmbeddingRetriever, VectorIndex, per_query_k};
pub use error::SourceError;
pub use similarity::SimilarityEngine;
pub use types::{Candidate, Neighbor, SearchHit, UserContext};
pub use vector_store::{IndexedDocument, PersistedVectorIndex};
