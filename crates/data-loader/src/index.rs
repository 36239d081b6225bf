//! DataIndex building from the dataset files.
//!
//! Loading steps:
//! 1. Parse the catalog and both rating files (in parallel)
//! 2. Insert the catalog, then join ratings onto it by title
//! 3. Validate scores

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default file names inside a data directory
pub const BOOKS_FILE: &str = "books_data_clean.csv";
pub const RATINGS_FILE: &str = "books_rating_clean.csv";
pub const PIVOT_RATINGS_FILE: &str = "final_ratings.csv";

/// Locations of the dataset files
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub books: PathBuf,
    pub ratings: PathBuf,
    /// Ratings for the similarity pivot, usually pre-filtered to popular
    /// titles and active users
    pub pivot_ratings: PathBuf,
}

impl DataPaths {
    /// The default file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            books: dir.join(BOOKS_FILE),
            ratings: dir.join(RATINGS_FILE),
            pivot_ratings: dir.join(PIVOT_RATINGS_FILE),
        }
    }
}

impl DataIndex {
    /// Load the catalog and rating datasets
    ///
    /// This is the main entry point for loading data. All three files are
    /// required; the similarity matrix is dense in the number of pivot
    /// titles, so the full rating file is never used in place of the pivot.
    pub fn load_from_files(paths: &DataPaths) -> Result<Self> {
        info!("Loading book datasets from {:?}", paths.books.parent());

        // Parse the three files in parallel
        let ((books, ratings), pivot) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_books(&paths.books),
                    || parser::parse_ratings(&paths.ratings),
                )
            },
            || parser::parse_ratings(&paths.pivot_ratings),
        );

        let books = books?;
        let ratings = ratings?;
        let pivot = pivot?;

        let index = Self::from_parts(books, ratings, pivot);
        index.validate()?;

        let (books, users, merged, pivot) = index.counts();
        info!(
            "Loaded {} books, {} users, {} merged ratings, {} pivot ratings",
            books, users, merged, pivot
        );
        Ok(index)
    }

    /// Build an index from already-parsed records
    pub fn from_parts(books: Vec<Book>, ratings: Vec<Rating>, pivot: Vec<Rating>) -> Self {
        let mut index = DataIndex::new();

        for book in books {
            index.insert_book(book);
        }

        let total = ratings.len();
        let kept = ratings
            .into_iter()
            .map(|rating| index.insert_rating(rating))
            .filter(|&kept| kept)
            .count();
        if kept < total {
            debug!(
                "Dropped {} ratings whose title is not in the catalog",
                total - kept
            );
        }

        for rating in pivot {
            index.insert_pivot_rating(rating);
        }
        index
    }

    /// Validate data integrity
    ///
    /// Every score, merged or pivot, must be a finite value within
    /// [`MIN_SCORE`, `MAX_SCORE`].
    pub fn validate(&self) -> Result<()> {
        if self.books.is_empty() {
            return Err(DataLoadError::ValidationError(
                "catalog is empty".to_string(),
            ));
        }
        for rating in self.ratings.iter().chain(self.pivot_ratings.iter()) {
            if !rating.score.is_finite() || rating.score < MIN_SCORE || rating.score > MAX_SCORE {
                return Err(DataLoadError::InvalidValue {
                    field: "review/score".to_string(),
                    value: format!("{} (user {}, '{}')", rating.score, rating.user_id, rating.title),
                });
            }
        }
        Ok(())
    }
}
