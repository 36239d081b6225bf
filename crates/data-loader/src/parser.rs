//! Readers for the cleaned CSV datasets.
//!
//! - catalog: `<id>,Title,...,authors,image,...,categories,...` (the id is
//!   the first column, whatever its header says)
//! - ratings: `...,Title,...,User_id,...,review/score,...`
//!
//! Columns are located by header name so extra columns and column order do
//! not matter. List-valued cells (`authors`, `categories`) are stored as
//! list literals such as `['Jane Doe', 'John Roe']`.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use csv::StringRecord;
use std::path::Path;

pub const TITLE_COLUMN: &str = "Title";
pub const AUTHORS_COLUMN: &str = "authors";
pub const IMAGE_COLUMN: &str = "image";
pub const CATEGORIES_COLUMN: &str = "categories";
pub const USER_COLUMN: &str = "User_id";
pub const SCORE_COLUMN: &str = "review/score";

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| DataLoadError::Csv {
            file: file_label(path),
            source,
        })
}

/// Position of a named column in the header row
fn column(headers: &StringRecord, file: &str, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| DataLoadError::MissingColumn {
            file: file.to_string(),
            column: name.to_string(),
        })
}

fn line_of(record: &StringRecord) -> usize {
    record
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or_default()
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).map(str::trim).unwrap_or("")
}

/// Parse the catalog file
pub fn parse_books(path: &Path) -> Result<Vec<Book>> {
    let file = file_label(path);
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|source| DataLoadError::Csv {
            file: file.clone(),
            source,
        })?
        .clone();

    let title_idx = column(&headers, &file, TITLE_COLUMN)?;
    let authors_idx = column(&headers, &file, AUTHORS_COLUMN)?;
    let image_idx = column(&headers, &file, IMAGE_COLUMN)?;
    let categories_idx = column(&headers, &file, CATEGORIES_COLUMN)?;

    let mut books = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| DataLoadError::Csv {
            file: file.clone(),
            source,
        })?;
        let line = line_of(&record);

        let raw_id = cell(&record, 0);
        let id = raw_id.parse::<u64>().map_err(|e| DataLoadError::ParseError {
            file: file.clone(),
            line,
            reason: format!("Invalid book id '{}': {}", raw_id, e),
        })?;

        let title = cell(&record, title_idx);
        if title.is_empty() {
            return Err(DataLoadError::ParseError {
                file: file.clone(),
                line,
                reason: "Missing title".to_string(),
            });
        }

        books.push(Book {
            id: ItemId(id),
            title: title.to_string(),
            authors: parse_list_field(cell(&record, authors_idx)),
            image: cell(&record, image_idx).to_string(),
            categories: parse_list_field(cell(&record, categories_idx)),
        });
    }

    Ok(books)
}

/// Parse a rating file (used for both the merged and the pivot dataset)
///
/// Rows without a user id are skipped; the cleaned datasets should not
/// contain any, and the count is reported at debug level.
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let file = file_label(path);
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|source| DataLoadError::Csv {
            file: file.clone(),
            source,
        })?
        .clone();

    let user_idx = column(&headers, &file, USER_COLUMN)?;
    let title_idx = column(&headers, &file, TITLE_COLUMN)?;
    let score_idx = column(&headers, &file, SCORE_COLUMN)?;

    let mut ratings = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result.map_err(|source| DataLoadError::Csv {
            file: file.clone(),
            source,
        })?;
        let line = line_of(&record);

        let user_id = cell(&record, user_idx);
        if user_id.is_empty() {
            skipped += 1;
            continue;
        }

        let title = cell(&record, title_idx);
        if title.is_empty() {
            return Err(DataLoadError::ParseError {
                file: file.clone(),
                line,
                reason: "Missing title".to_string(),
            });
        }

        let raw_score = cell(&record, score_idx);
        let score = raw_score.parse::<f32>().map_err(|e| DataLoadError::ParseError {
            file: file.clone(),
            line,
            reason: format!("Invalid score '{}': {}", raw_score, e),
        })?;

        ratings.push(Rating {
            user_id: UserId::new(user_id),
            title: title.to_string(),
            score,
        });
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} rows without a user id in {}", skipped, file);
    }
    Ok(ratings)
}

/// Parse a list literal cell into its elements
///
/// Example: "['Jane Doe', \"O'Brien\"]" -> ["Jane Doe", "O'Brien"]
///          "Fiction" -> ["Fiction"]
///          "" -> []
pub fn parse_list_field(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let Some(inner) = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    };

    let mut items = Vec::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\'' && c != '"' {
            continue;
        }
        let quote = c;
        let mut item = String::new();
        while let Some(next) = chars.next() {
            match next {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        item.push(escaped);
                    }
                }
                _ if next == quote => break,
                _ => item.push(next),
            }
        }
        let item = item.trim();
        if !item.is_empty() {
            items.push(item.to_string());
        }
    }
    items
}
