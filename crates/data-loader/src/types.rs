//! Core domain types for the book catalog and rating datasets.
//!
//! Identifiers are newtypes rather than bare strings/integers so a user id
//! can never be passed where an item id is expected.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Identifiers
// =============================================================================

/// External identifier of a user, as it appears in the rating dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// External identifier of a book: the first column of the catalog file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dense position of a user in the rating model's user table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserIndex(pub u32);

/// Dense position of an item in the rating model's item table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemIndex(pub u32);

/// Opaque row pointer into the originating dataset, as stored in the
/// embedding index. Callers resolve it to display fields themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowRef(pub u64);

// =============================================================================
// Books and ratings
// =============================================================================

/// A book from the catalog dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: ItemId,
    /// Unique key used to cross-reference ratings
    pub title: String,
    pub authors: Vec<String>,
    /// Cover image URL; empty when the catalog has none
    pub image: String,
    pub categories: Vec<String>,
}

/// A single rating from a user for a book, keyed by title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub title: String,
    /// Review score from 1.0 to 5.0
    pub score: f32,
}

/// Lowest score accepted in a rating file
pub const MIN_SCORE: f32 = 1.0;

/// Highest score accepted in a rating file
pub const MAX_SCORE: f32 = 5.0;

// =============================================================================
// DataIndex - the in-memory catalog
// =============================================================================

/// Holds the catalog and both rating datasets with lookup indices.
///
/// Built once at startup and shared read-only afterwards. `ratings` is the
/// rating file joined with the catalog on title; `pivot_ratings` is the
/// dataset the similarity pivot is computed from.
#[derive(Debug, Default)]
pub struct DataIndex {
    pub(crate) books: Vec<Book>,
    pub(crate) book_by_id: HashMap<ItemId, usize>,
    /// First catalog row carrying each title
    pub(crate) book_by_title: HashMap<String, usize>,

    pub(crate) ratings: Vec<Rating>,
    /// Positions into `ratings`, in rating row order
    pub(crate) user_ratings: HashMap<UserId, Vec<usize>>,

    pub(crate) pivot_ratings: Vec<Rating>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a book by its catalog id
    pub fn get_book(&self, id: ItemId) -> Option<&Book> {
        self.book_by_id.get(&id).map(|&row| &self.books[row])
    }

    /// Get the first catalog entry with this title
    pub fn get_book_by_title(&self, title: &str) -> Option<&Book> {
        self.book_by_title.get(title).map(|&row| &self.books[row])
    }

    /// All catalog rows, in file order (duplicated titles included)
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Merged ratings, in rating file order
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    /// Ratings used to build the similarity pivot
    pub fn pivot_ratings(&self) -> &[Rating] {
        &self.pivot_ratings
    }

    /// Ratings made by a user, in rating file order
    ///
    /// Returns an empty vector when the user has no merged ratings
    pub fn get_user_ratings(&self, user_id: &UserId) -> Vec<&Rating> {
        self.user_ratings
            .get(user_id)
            .map(|rows| rows.iter().map(|&row| &self.ratings[row]).collect())
            .unwrap_or_default()
    }

    /// Distinct titles in catalog order (first occurrence wins)
    pub fn distinct_titles(&self) -> Vec<&str> {
        self.books
            .iter()
            .enumerate()
            .filter(|(row, book)| self.book_by_title.get(&book.title) == Some(row))
            .map(|(_, book)| book.title.as_str())
            .collect()
    }

    // Mutators - used while loading and by test fixtures

    /// Insert a book into the catalog
    ///
    /// Both lookups keep pointing at the first row with a given id or title.
    pub fn insert_book(&mut self, book: Book) {
        let row = self.books.len();
        self.book_by_id.entry(book.id).or_insert(row);
        self.book_by_title.entry(book.title.clone()).or_insert(row);
        self.books.push(book);
    }

    /// Insert a rating into the merged dataset
    ///
    /// Ratings for titles missing from the catalog are dropped, mirroring an
    /// inner join on title. Returns whether the rating was kept.
    pub fn insert_rating(&mut self, rating: Rating) -> bool {
        if !self.book_by_title.contains_key(&rating.title) {
            return false;
        }
        let row = self.ratings.len();
        self.user_ratings
            .entry(rating.user_id.clone())
            .or_default()
            .push(row);
        self.ratings.push(rating);
        true
    }

    /// Insert a rating into the similarity pivot source
    pub fn insert_pivot_rating(&mut self, rating: Rating) {
        self.pivot_ratings.push(rating);
    }

    /// Get counts for debugging/validation: (books, users, merged ratings, pivot ratings)
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.books.len(),
            self.user_ratings.len(),
            self.ratings.len(),
            self.pivot_ratings.len(),
        )
    }
}
