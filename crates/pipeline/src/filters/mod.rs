//! Filter implementations for the candidate pipeline.
//!
//! This module contains the concrete filters that can be composed into a
//! FilterPipeline.

pub mod already_rated;
pub mod known_item;

// Re-export for convenience
pub use already_rated::AlreadyRatedFilter;
pub use known_item::KnownItemFilter;
