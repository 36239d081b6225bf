//! Shared types produced by the sources and consumed by the pipeline.

use data_loader::{ItemIndex, Rating, RowRef, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An item eligible for rating prediction
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    /// Position in the unfiltered candidate enumeration; breaks score ties
    pub position: usize,
    /// Dense model index, filled in once the title has been encoded
    pub item_index: Option<ItemIndex>,
}

impl Candidate {
    pub fn new(title: impl Into<String>, position: usize) -> Self {
        Self {
            title: title.into(),
            position,
            item_index: None,
        }
    }
}

/// Everything about one user the prediction flow needs
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: UserId,
    /// Titles the user has rated
    pub rated_titles: HashSet<String>,
    /// The user's ratings, in rating file order
    pub history: Vec<Rating>,
}

impl UserContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            rated_titles: HashSet::new(),
            history: Vec::new(),
        }
    }
}

/// One row of a similarity query result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    /// Row position in the similarity matrix
    pub row: usize,
    pub title: String,
    pub similarity: f32,
}

/// One hit of a vector index search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub row: RowRef,
    pub score: f32,
}
