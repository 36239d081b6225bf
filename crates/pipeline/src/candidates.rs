//! Candidate enumeration for the prediction flow.

use data_loader::DataIndex;
use sources::Candidate;

/// Every distinct catalog title, in catalog order.
///
/// The position recorded on each candidate is its index in this enumeration
/// and survives filtering.
pub fn enumerate_candidates(data_index: &DataIndex) -> Vec<Candidate> {
    data_index
        .distinct_titles()
        .into_iter()
        .enumerate()
        .map(|(position, title)| Candidate::new(title, position))
        .collect()
}
