//! Ordering of scored candidates and of a user's own history.

use data_loader::Rating;
use sources::Candidate;
use std::collections::HashSet;

/// Sort scored candidates by score descending and keep the first `n`.
///
/// The sort is stable, so equal scores keep enumeration order. NaN scores
/// rank below every real score.
pub fn rank_by_score(mut scored: Vec<(Candidate, f32)>, n: usize) -> Vec<(Candidate, f32)> {
    scored.sort_by(|(_, a), (_, b)| sort_key(*b).total_cmp(&sort_key(*a)));
    scored.truncate(n);
    scored
}

fn sort_key(score: f32) -> f32 {
    if score.is_nan() { f32::NEG_INFINITY } else { score }
}

/// The user's `n` highest-scored ratings, one per title.
///
/// Ties keep rating file order. A title rated twice only counts with its
/// higher-ranked rating.
pub fn top_rated_history(history: &[Rating], n: usize) -> Vec<&Rating> {
    let mut sorted: Vec<&Rating> = history.iter().collect();
    sorted.sort_by(|a, b| sort_key(b.score).total_cmp(&sort_key(a.score)));

    let mut seen = HashSet::new();
    sorted
        .into_iter()
        .filter(|rating| seen.insert(rating.title.as_str()))
        .take(n)
        .collect()
}
