//! # Data Loader Crate
//!
//! This crate loads the book catalog and rating datasets and builds the
//! identifier encodings used by the rating model.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Book, Rating, DataIndex, identifier newtypes)
//! - **parser**: Parse the cleaned CSV files into Rust structs
//! - **index**: Build the DataIndex (catalog joined with ratings)
//! - **encoding**: IdentifierIndex, the dense user/item positions
//! - **error**: Error types for data loading and encoding
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{DataIndex, DataPaths, IdentifierIndex, UserId};
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(&DataPaths::in_dir(Path::new("data")))?;
//! let encoding = IdentifierIndex::from_data_index(&index);
//!
//! let user = encoding.encode_user(&UserId::new("A30TK6U7DNS82R"))?;
//! ```

// Public modules
pub mod encoding;
pub mod error;
pub mod index;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use encoding::{Encoding, IdentifierIndex};
pub use error::{DataLoadError, EncodingError, IdentifierKind, Result};
pub use index::DataPaths;
pub use types::{
    Book, DataIndex, ItemId, ItemIndex, MAX_SCORE, MIN_SCORE, Rating, RowRef, UserId, UserIndex,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: u64, title: &str) -> Book {
        Book {
            id: ItemId(id),
            title: title.to_string(),
            authors: vec!["Author".to_string()],
            image: String::new(),
            categories: vec!["Fiction".to_string()],
        }
    }

    #[test]
    fn test_data_index_creation() {
        // Test that we can create an empty DataIndex
        let index = DataIndex::new();
        assert_eq!(index.counts(), (0, 0, 0, 0));
    }

    #[test]
    fn test_insert_book() {
        let mut index = DataIndex::new();
        index.insert_book(book(42, "Dune"));

        let retrieved = index.get_book(ItemId(42)).unwrap();
        assert_eq!(retrieved.title, "Dune");
        assert_eq!(index.get_book_by_title("Dune").unwrap().id, ItemId(42));
    }

    #[test]
    fn test_insert_rating_requires_catalog_title() {
        let mut index = DataIndex::new();
        index.insert_book(book(1, "Dune"));

        let kept = index.insert_rating(Rating {
            user_id: UserId::new("u1"),
            title: "Dune".to_string(),
            score: 5.0,
        });
        let dropped = index.insert_rating(Rating {
            user_id: UserId::new("u1"),
            title: "Ulysses".to_string(),
            score: 4.0,
        });

        assert!(kept);
        assert!(!dropped);
        assert_eq!(index.get_user_ratings(&UserId::new("u1")).len(), 1);
    }

    #[test]
    fn test_empty_queries() {
        let index = DataIndex::new();

        // Querying non-existent data should return None or empty results
        assert!(index.get_book(ItemId(999)).is_none());
        assert!(index.get_book_by_title("Nothing").is_none());
        assert!(index.get_user_ratings(&UserId::new("nobody")).is_empty());
        assert!(index.distinct_titles().is_empty());
    }
}
