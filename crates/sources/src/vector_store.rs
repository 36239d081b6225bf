//! Persisted vector index produced by the external embedding job.
//!
//! The job writes a JSON array of documents:
//!
//! ```json
//! [{ "descriptor": "1432", "row": 1432, "embedding": [0.12, -0.03, ...] }]
//! ```
//!
//! Embeddings are never computed here. A query's vector is the stored
//! embedding of the document whose descriptor equals the query text.

use crate::embedding::VectorIndex;
use crate::error::SourceError;
use crate::types::SearchHit;
use data_loader::RowRef;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// One indexed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub descriptor: String,
    pub row: RowRef,
    pub embedding: Vec<f32>,
}

/// In-memory brute-force cosine index over persisted documents
#[derive(Debug)]
pub struct PersistedVectorIndex {
    documents: Vec<IndexedDocument>,
    norms: Vec<f32>,
    /// First document carrying each descriptor
    by_descriptor: HashMap<String, usize>,
}

impl PersistedVectorIndex {
    /// Load the index from its JSON file
    ///
    /// Any failure to read or decode the file makes retrieval unavailable.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let bytes = std::fs::read(path).map_err(|e| {
            SourceError::RetrievalUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        let documents: Vec<IndexedDocument> = serde_json::from_slice(&bytes).map_err(|e| {
            SourceError::RetrievalUnavailable(format!("cannot decode {}: {}", path.display(), e))
        })?;

        let index = Self::from_documents(documents)?;
        info!(
            "Opened vector index {} with {} documents",
            path.display(),
            index.len()
        );
        Ok(index)
    }

    /// Build from documents; every embedding must have the same dimension
    pub fn from_documents(documents: Vec<IndexedDocument>) -> Result<Self, SourceError> {
        if let Some(first) = documents.first() {
            let dimension = first.embedding.len();
            if let Some(bad) = documents.iter().find(|d| d.embedding.len() != dimension) {
                return Err(SourceError::RetrievalUnavailable(format!(
                    "document '{}' has dimension {}, expected {}",
                    bad.descriptor,
                    bad.embedding.len(),
                    dimension
                )));
            }
        }

        let norms = documents.iter().map(|d| norm(&d.embedding)).collect();
        let mut by_descriptor = HashMap::new();
        for (position, doc) in documents.iter().enumerate() {
            by_descriptor.entry(doc.descriptor.clone()).or_insert(position);
        }

        Ok(Self {
            documents,
            norms,
            by_descriptor,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl VectorIndex for PersistedVectorIndex {
    fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, SourceError> {
        if self.is_empty() {
            return Err(SourceError::RetrievalUnavailable(
                "vector index is empty".to_string(),
            ));
        }
        let &position = self
            .by_descriptor
            .get(query)
            .ok_or_else(|| SourceError::UnindexedQuery(query.to_string()))?;

        let query_vec = &self.documents[position].embedding;
        let query_norm = self.norms[position];

        let mut hits: Vec<(usize, f32)> = self
            .documents
            .par_iter()
            .zip(self.norms.par_iter())
            .enumerate()
            .map(|(i, (doc, &doc_norm))| {
                let score = if query_norm == 0.0 || doc_norm == 0.0 {
                    0.0
                } else {
                    dot(query_vec, &doc.embedding) / (query_norm * doc_norm)
                };
                (i, score)
            })
            .collect();

        // Best first; ties keep document order
        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        hits.truncate(k);

        Ok(hits
            .into_iter()
            .map(|(i, score)| SearchHit {
                row: self.documents[i].row,
                score,
            })
            .collect())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}
