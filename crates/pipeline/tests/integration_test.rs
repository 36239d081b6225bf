//! Integration tests for the pipeline.
//!
//! Runs enumeration, filtering and ranking together over a small catalog.

use data_loader::{Book, DataIndex, IdentifierIndex, ItemId, Rating, UserId};
use pipeline::filters::*;
use pipeline::{FilterPipeline, enumerate_candidates, rank_by_score, top_rated_history};
use sources::user_context::build_user_context;
use std::sync::Arc;

fn create_test_index() -> DataIndex {
    let mut index = DataIndex::new();

    for (id, title) in [
        (1, "Dune"),
        (2, "Emma"),
        (3, "Walden"),
        (4, "Ulysses"),
        (5, "Nobody Rated This"),
        (6, "Dune"),
    ] {
        index.insert_book(Book {
            id: ItemId(id),
            title: title.to_string(),
            authors: vec![],
            image: String::new(),
            categories: vec![],
        });
    }

    let rows = [
        ("alice", "Dune", 5.0),
        ("alice", "Emma", 2.0),
        ("bob", "Emma", 4.0),
        ("bob", "Walden", 3.0),
        ("carol", "Ulysses", 4.0),
        ("carol", "Dune", 1.0),
    ];
    for (user, title, score) in rows {
        index.insert_rating(Rating {
            user_id: UserId::new(user),
            title: title.to_string(),
            score,
        });
    }

    index
}

#[test]
fn test_full_pipeline() {
    let index = create_test_index();
    let encoding = Arc::new(IdentifierIndex::from_data_index(&index));
    let context = build_user_context(&index, &UserId::new("alice"));

    let pipeline = FilterPipeline::new()
        .add_filter(AlreadyRatedFilter)
        .add_filter(KnownItemFilter::new(encoding.clone()));

    let candidates = enumerate_candidates(&index);
    assert_eq!(candidates.len(), 5);

    let scorable = pipeline.apply(candidates, &context).unwrap();
    let titles: Vec<&str> = scorable.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Walden", "Ulysses"]);
    assert!(scorable.iter().all(|c| c.item_index.is_some()));

    let scored: Vec<_> = scorable.into_iter().zip([3.2f32, 4.1]).collect();
    let ranked = rank_by_score(scored, 10);
    assert_eq!(ranked[0].0.title, "Ulysses");
    assert_eq!(ranked[1].0.title, "Walden");
}

#[test]
fn test_user_without_history_sees_every_known_book() {
    let index = create_test_index();
    let encoding = Arc::new(IdentifierIndex::from_data_index(&index));
    let context = build_user_context(&index, &UserId::new("nobody"));

    let pipeline = FilterPipeline::new()
        .add_filter(AlreadyRatedFilter)
        .add_filter(KnownItemFilter::new(encoding));

    let scorable = pipeline.apply(enumerate_candidates(&index), &context).unwrap();
    assert_eq!(scorable.len(), 4);
    assert!(scorable.iter().all(|c| c.title != "Nobody Rated This"));
}

#[test]
fn test_history_for_user() {
    let index = create_test_index();
    let context = build_user_context(&index, &UserId::new("bob"));

    let top = top_rated_history(&context.history, 5);
    let titles: Vec<&str> = top.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Emma", "Walden"]);
}
