//! Item-item similarity over explicit ratings
//!
//! "Readers who rated this book the way you did also rated..."
//!
//! ## Algorithm
//! 1. Pivot the ratings into one row per title and one column per user.
//!    A missing (user, title) cell is 0, not absent, so every user counts
//!    in every row; repeated ratings of a cell are averaged.
//! 2. Compute the cosine similarity between every pair of rows.
//! 3. Answer neighbor queries by sorting one matrix row.
//!
//! Rows are ordered by title and columns by user id. Row order is also the
//! tie-break between equally similar neighbors.

use crate::error::SourceError;
use crate::types::Neighbor;
use data_loader::{Rating, UserId};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

/// Dense, symmetric item-item cosine similarity matrix.
///
/// Built once at startup; read-only afterwards.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    titles: Vec<String>,
    rows: HashMap<String, usize>,
    /// Row-major `titles.len() x titles.len()`
    matrix: Vec<f32>,
}

/// A pivot row: (user column, mean rating), sorted by column
type SparseRow = Vec<(u32, f32)>;

impl SimilarityEngine {
    /// Build the pivot and the similarity matrix from ratings
    #[instrument(skip(ratings), fields(ratings = ratings.len()))]
    pub fn build(ratings: &[Rating]) -> Self {
        let (titles, pivot) = pivot(ratings);
        let n = titles.len();

        let norms: Vec<f64> = pivot
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&(_, v)| f64::from(v) * f64::from(v))
                    .sum::<f64>()
                    .sqrt()
            })
            .collect();

        // Upper triangle in parallel, one task per row
        let upper: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..n)
                    .map(|j| cosine(&pivot[i], &pivot[j], norms[i], norms[j]))
                    .collect()
            })
            .collect();

        let mut matrix = vec![0.0f32; n * n];
        for (i, row) in upper.into_iter().enumerate() {
            matrix[i * n + i] = 1.0;
            for (offset, sim) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                matrix[i * n + j] = sim;
                matrix[j * n + i] = sim;
            }
        }

        let rows = titles
            .iter()
            .enumerate()
            .map(|(row, title)| (title.clone(), row))
            .collect();

        info!("Built {}x{} similarity matrix", n, n);
        Self {
            titles,
            rows,
            matrix,
        }
    }

    /// Number of rows (distinct titles in the pivot)
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn row_of(&self, title: &str) -> Option<usize> {
        self.rows.get(title).copied()
    }

    pub fn title_of(&self, row: usize) -> Option<&str> {
        self.titles.get(row).map(String::as_str)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.rows.contains_key(title)
    }

    /// Similarity between two rows, `None` when either is out of range
    pub fn similarity(&self, i: usize, j: usize) -> Option<f32> {
        let n = self.len();
        (i < n && j < n).then(|| self.matrix[i * n + j])
    }

    /// The `k` rows most similar to `title`, most similar first
    ///
    /// The query row itself is never returned. Equal similarities keep
    /// row order. Fewer than `k` results only when fewer than `k` other
    /// rows exist.
    #[instrument(skip(self))]
    pub fn nearest_neighbors(&self, title: &str, k: usize) -> Result<Vec<Neighbor>, SourceError> {
        let row = self.row_of(title).ok_or_else(|| SourceError::ItemNotFound {
            title: title.to_string(),
        })?;

        let n = self.len();
        let sims = &self.matrix[row * n..(row + 1) * n];

        let mut order: Vec<usize> = (0..n).filter(|&j| j != row).collect();
        // Stable sort: ties stay in row order
        order.sort_by(|&a, &b| sims[b].total_cmp(&sims[a]));
        order.truncate(k);

        let neighbors: Vec<Neighbor> = order
            .into_iter()
            .map(|j| Neighbor {
                row: j,
                title: self.titles[j].clone(),
                similarity: sims[j],
            })
            .collect();

        debug!("Found {} neighbors for '{}'", neighbors.len(), title);
        Ok(neighbors)
    }
}

/// Pivot ratings into title-sorted sparse rows over user columns
fn pivot(ratings: &[Rating]) -> (Vec<String>, Vec<SparseRow>) {
    // Column ids: users sorted by id
    let mut users: Vec<&UserId> = ratings.iter().map(|r| &r.user_id).collect();
    users.sort_unstable();
    users.dedup();
    let columns: HashMap<&UserId, u32> = users
        .into_iter()
        .enumerate()
        .map(|(col, user)| (user, col as u32))
        .collect();

    // title -> column -> (sum, count)
    let mut cells: BTreeMap<&str, BTreeMap<u32, (f64, u32)>> = BTreeMap::new();
    for rating in ratings {
        let col = columns[&rating.user_id];
        let cell = cells
            .entry(rating.title.as_str())
            .or_default()
            .entry(col)
            .or_insert((0.0, 0));
        cell.0 += f64::from(rating.score);
        cell.1 += 1;
    }

    let mut titles = Vec::with_capacity(cells.len());
    let mut rows = Vec::with_capacity(cells.len());
    for (title, row) in cells {
        titles.push(title.to_string());
        rows.push(
            row.into_iter()
                .map(|(col, (sum, count))| (col, (sum / f64::from(count)) as f32))
                .collect(),
        );
    }
    (titles, rows)
}

/// Cosine similarity of two sparse rows; 0 when either row is all zeros
fn cosine(a: &[(u32, f32)], b: &[(u32, f32)], norm_a: f64, norm_b: f64) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0f64;
    while i < a.len() && j < b.len() {
        let (col_a, val_a) = a[i];
        let (col_b, val_b) = b[j];
        match col_a.cmp(&col_b) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += f64::from(val_a) * f64::from(val_b);
                i += 1;
                j += 1;
            }
        }
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32
}
