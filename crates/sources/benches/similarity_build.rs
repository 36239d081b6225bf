//! Benchmarks for the similarity engine
//!
//! Run with: cargo bench --package sources
//!
//! Uses a synthetic rating set so the benchmark needs no dataset files.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use data_loader::{Rating, UserId};
use sources::SimilarityEngine;

/// 500 titles x 2000 users, each user rating ~20 titles
fn synthetic_ratings() -> Vec<Rating> {
    let mut ratings = Vec::new();
    for user in 0..2000u32 {
        for step in 0..20u32 {
            let title = (user * 7 + step * 31) % 500;
            ratings.push(Rating {
                user_id: UserId::new(format!("user-{}", user)),
                title: format!("Title {:03}", title),
                score: ((user + step) % 5 + 1) as f32,
            });
        }
    }
    ratings
}

fn bench_build(c: &mut Criterion) {
    let ratings = synthetic_ratings();

    c.bench_function("similarity_build", |b| {
        b.iter(|| {
            let engine = SimilarityEngine::build(black_box(&ratings));
            black_box(engine)
        })
    });
}

fn bench_nearest_neighbors(c: &mut Criterion) {
    let engine = SimilarityEngine::build(&synthetic_ratings());

    c.bench_function("similarity_nearest_neighbors", |b| {
        b.iter(|| {
            let neighbors = engine
                .nearest_neighbors(black_box("Title 042"), black_box(10))
                .unwrap();
            black_box(neighbors)
        })
    });
}

criterion_group!(benches, bench_build, bench_nearest_neighbors);
criterion_main!(benches);
