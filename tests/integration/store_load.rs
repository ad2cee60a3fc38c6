#![allow(missing_docs)]

use std::path::PathBuf;

use estante::store::{Store, StoreOptions, TableStatus, UserId};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn fixture_options() -> StoreOptions {
    StoreOptions::new(fixture("books.csv"), fixture("recommendations.csv"))
}

#[test]
fn fixtures_load_with_expected_counters() {
    let store = Store::open(&fixture_options()).expect("open store");
    let summary = store.summary();
    assert_eq!(summary.total_books, 5);
    assert_eq!(summary.total_users, 4);
    assert_eq!(summary.total_recommendations, 12);
    assert!(!store.is_degraded());
}

#[test]
fn load_report_counts_rows_and_invalid_ratings() {
    let store = Store::open(&fixture_options()).expect("open store");
    let report = store.report();
    assert_eq!(report.books, TableStatus::Loaded { rows: 5 });
    assert_eq!(report.ratings, TableStatus::Loaded { rows: 12 });
    // One "oops" cell; the blank rating is missing, not invalid.
    assert_eq!(report.invalid_ratings, 1);
}

#[test]
fn blank_catalog_cells_decode_as_none() {
    let store = Store::open(&fixture_options()).expect("open store");
    let life_of_pi = store.book_at(2).expect("third catalog row");
    assert_eq!(life_of_pi.title.as_deref(), Some("Life of Pi"));
    assert_eq!(life_of_pi.cover_image_url, None);
    let pearl_earring = store.book_at(4).expect("fifth catalog row");
    assert_eq!(pearl_earring.author, None);
}

#[test]
fn unusable_rating_cells_decode_as_none() {
    let store = Store::open(&fixture_options()).expect("open store");
    let blank: Vec<_> = store.ratings_for(UserId(3)).collect();
    assert_eq!(blank[0].predicted_rating, None);
    let invalid: Vec<_> = store.ratings_for(UserId(5)).collect();
    assert_eq!(invalid[2].predicted_rating, None);
}

#[test]
fn missing_catalog_degrades_to_empty_table() {
    let options = StoreOptions::new(fixture("no-such-books.csv"), fixture("recommendations.csv"));
    let store = Store::open(&options).expect("open degrades, not fails");
    assert!(store.is_degraded());
    assert!(store.report().books.is_missing());
    assert_eq!(store.summary().total_books, 0);
    // Ratings still load; every join will miss.
    assert_eq!(store.summary().total_recommendations, 12);
}

#[test]
fn missing_both_tables_yields_zero_counters() {
    let options = StoreOptions::new(fixture("absent.csv"), fixture("also-absent.csv"));
    let store = Store::open(&options).expect("open degrades, not fails");
    let summary = store.summary();
    assert_eq!(summary.total_books, 0);
    assert_eq!(summary.total_users, 0);
    assert_eq!(summary.total_recommendations, 0);
    assert_eq!(store.user_ids().count(), 0);
}

#[test]
fn malformed_ratings_file_is_a_hard_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ratings = dir.path().join("recommendations.csv");
    std::fs::write(&ratings, "user_idx,book_idx,predicted_rating\nnot-a-number,0,4.0\n")
        .expect("write ratings");
    let options = StoreOptions::new(fixture("books.csv"), ratings);
    let err = Store::open(&options).expect_err("bad index must fail the load");
    assert!(err.to_string().contains("user_idx"));
}

#[test]
fn ratings_file_without_required_column_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ratings = dir.path().join("recommendations.csv");
    std::fs::write(&ratings, "user_idx,predicted_rating\n1,4.0\n").expect("write ratings");
    let options = StoreOptions::new(fixture("books.csv"), ratings);
    let err = Store::open(&options).expect_err("missing column must fail the load");
    assert!(err.to_string().contains("book_idx"));
}
