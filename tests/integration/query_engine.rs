#![allow(missing_docs)]

use std::path::PathBuf;

use estante::query::{
    Extremes, QueryEngine, QueryError, RatingBand, PLACEHOLDER_COVER, UNKNOWN_AUTHOR,
    UNKNOWN_TITLE,
};
use estante::store::{Store, StoreOptions, UserId};

fn fixture_store() -> Store {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    Store::open(&StoreOptions::new(
        base.join("books.csv"),
        base.join("recommendations.csv"),
    ))
    .expect("open fixture store")
}

#[test]
fn top_two_for_user_one() {
    let store = fixture_store();
    let top = QueryEngine::new(&store).top_n(UserId(1), 2);
    assert_eq!(top.len(), 2);
    assert_eq!(
        top[0].title.as_deref(),
        Some("Harry Potter and the Sorcerer's Stone")
    );
    assert_eq!(top[0].rating(), 4.5);
    assert_eq!(top[1].title.as_deref(), Some("Life of Pi"));
    assert_eq!(top[1].rating(), 3.8);
}

#[test]
fn top_n_length_is_min_of_n_and_row_count() {
    let store = fixture_store();
    let engine = QueryEngine::new(&store);
    for n in 1..=10 {
        assert_eq!(engine.top_n(UserId(1), n).len(), n.min(4));
    }
}

#[test]
fn top_n_order_is_non_increasing() {
    let store = fixture_store();
    let top = QueryEngine::new(&store).top_n(UserId(2), 10);
    for pair in top.windows(2) {
        assert!(pair[0].rating() >= pair[1].rating());
    }
}

#[test]
fn equal_ratings_keep_ratings_file_order() {
    let store = fixture_store();
    // User 1 rates book 2 and book 3 both at 3.8, in that file order.
    let top = QueryEngine::new(&store).top_n(UserId(1), 4);
    assert_eq!(top[1].book_index, 2);
    assert_eq!(top[2].book_index, 3);
}

#[test]
fn unknown_user_gets_an_empty_result() {
    let store = fixture_store();
    assert!(QueryEngine::new(&store).top_n(UserId(404), 5).is_empty());
}

#[test]
fn join_miss_resolves_to_sentinel_card() {
    let store = fixture_store();
    // User 2's book_idx 9 points past the 5-row catalog.
    let top = QueryEngine::new(&store).top_n(UserId(2), 3);
    let miss = top
        .iter()
        .find(|row| row.book_index == 9)
        .expect("unresolvable row is kept");
    assert_eq!(miss.title, None);
    let card = miss.to_card();
    assert_eq!(card.title, UNKNOWN_TITLE);
    assert_eq!(card.author, UNKNOWN_AUTHOR);
    assert_eq!(card.cover_url, PLACEHOLDER_COVER);
    assert_eq!(card.rating, 4.2);
}

#[test]
fn missing_rating_ranks_at_the_bottom() {
    let store = fixture_store();
    let top = QueryEngine::new(&store).top_n(UserId(3), 2);
    assert_eq!(top[0].rating(), 3.0);
    assert_eq!(top[1].predicted_rating, None);
    assert_eq!(top[1].rating(), 0.0);
    assert_eq!(top[1].to_card().band, RatingBand::Low);
}

#[test]
fn extremes_of_top_subset() {
    let store = fixture_store();
    let top = QueryEngine::new(&store).top_n(UserId(1), 3);
    let extremes = Extremes::of(&top).expect("non-empty subset");
    assert_eq!(extremes.best.rating(), 4.5);
    // Within the Top-3 subset the worst is 3.8, not the user's true minimum.
    assert_eq!(extremes.worst.rating(), 3.8);
    assert_eq!(extremes.worst.book_index, 2);
}

#[test]
fn extremes_of_empty_subset_is_a_typed_error() {
    let store = fixture_store();
    let top = QueryEngine::new(&store).top_n(UserId(404), 5);
    assert_eq!(Extremes::of(&top).unwrap_err(), QueryError::EmptyDataset);
}

#[test]
fn global_extremes_over_the_fixture_table() {
    let store = fixture_store();
    let extremes = QueryEngine::new(&store)
        .extremes_global()
        .expect("non-empty table");
    assert_eq!(extremes.best.user_id, UserId(2));
    assert_eq!(extremes.best.rating(), 4.9);
    assert_eq!(extremes.best.title.as_deref(), Some("Girl with a Pearl Earring"));
    // The blank rating resolves to 0.0 and is the earliest zero in the file.
    assert_eq!(extremes.worst.user_id, UserId(3));
    assert_eq!(extremes.worst.book_index, 1);
    assert_eq!(extremes.worst.rating(), 0.0);
}

#[test]
fn repeated_queries_are_identical() {
    let store = fixture_store();
    let engine = QueryEngine::new(&store);
    assert_eq!(engine.top_n(UserId(2), 3), engine.top_n(UserId(2), 3));
    assert_eq!(
        engine.extremes_global().expect("rows"),
        engine.extremes_global().expect("rows")
    );
}

#[test]
fn degraded_store_answers_empty_not_error() {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let store = Store::open(&StoreOptions::new(
        base.join("books.csv"),
        base.join("no-such-recommendations.csv"),
    ))
    .expect("open degrades");
    let engine = QueryEngine::new(&store);
    assert!(engine.top_n(UserId(1), 5).is_empty());
    assert_eq!(engine.extremes_global().unwrap_err(), QueryError::EmptyDataset);
}
