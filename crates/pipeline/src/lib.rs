//! Candidate pipeline for the rating prediction flow.
//!
//! The pipeline turns the catalog into the set of books worth sending to
//! the rating model, then orders whatever the model returns.
//!
//! 1. [`enumerate_candidates`] lists every distinct catalog title
//! 2. A [`FilterPipeline`] drops books the user rated and books the model
//!    has never seen
//! 3. [`rank_by_score`] keeps the best predictions
//!
//! ```ignore
//! use pipeline::filters::{AlreadyRatedFilter, KnownItemFilter};
//! use pipeline::{FilterPipeline, enumerate_candidates, rank_by_score};
//!
//! let pipeline = FilterPipeline::new()
//!     .add_filter(AlreadyRatedFilter)
//!     .add_filter(KnownItemFilter::new(encoding.clone()));
//!
//! let scorable = pipeline.apply(enumerate_candidates(&data_index), &context)?;
//! ```

pub mod candidates;
pub mod filter_pipeline;
pub mod filters;
pub mod ranking;
pub mod traits;

pub use candidates::enumerate_candidates;
pub use filter_pipeline::FilterPipeline;
pub use ranking::{rank_by_score, top_rated_history};
pub use traits::Filter;
