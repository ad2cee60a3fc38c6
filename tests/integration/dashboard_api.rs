#![allow(missing_docs)]

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use estante::dashboard::{build_router, DashboardOptions};
use estante::store::{Store, StoreOptions};
use serde_json::Value;
use tower::ServiceExt;

fn fixture_router() -> Router {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let store = Store::open(&StoreOptions::new(
        base.join("books.csv"),
        base.join("recommendations.csv"),
    ))
    .expect("open fixture store");
    router_over(store)
}

fn router_over(store: Store) -> Router {
    let options = DashboardOptions {
        host: IpAddr::from([127, 0, 0, 1]),
        port: 0,
        assets_dir: None,
        allow_origins: Vec::new(),
    };
    build_router(Arc::new(store), &options)
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .expect("request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).expect("json body");
    (status, json)
}

#[tokio::test]
async fn health_reports_ok_and_not_degraded() {
    let (status, json) = get_json(fixture_router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["degraded"], false);
}

#[tokio::test]
async fn summary_exposes_counters_and_report() {
    let (status, json) = get_json(fixture_router(), "/api/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_books"], 5);
    assert_eq!(json["total_users"], 4);
    assert_eq!(json["total_recommendations"], 12);
    assert_eq!(json["report"]["books"]["status"], "loaded");
    assert_eq!(json["report"]["invalid_ratings"], 1);
}

#[tokio::test]
async fn users_are_sorted_and_distinct() {
    let (status, json) = get_json(fixture_router(), "/api/users").await;
    assert_eq!(status, StatusCode::OK);
    let users: Vec<u64> = json["users"]
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v.as_u64().expect("id"))
        .collect();
    assert_eq!(users, vec![1, 2, 3, 5]);
}

#[tokio::test]
async fn recommendations_return_cards_and_subset_extremes() {
    let (status, json) =
        get_json(fixture_router(), "/api/recommendations?user_id=1&n=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    let cards = json["cards"].as_array().expect("cards");
    assert_eq!(cards[0]["title"], "Harry Potter and the Sorcerer's Stone");
    assert_eq!(cards[0]["band"], "high");
    assert_eq!(cards[1]["rating"], 3.8);
    assert_eq!(json["extremes"]["best"]["rating"], 4.5);
    assert_eq!(json["extremes"]["worst"]["rating"], 3.8);
}

#[tokio::test]
async fn recommendations_clamp_n_to_ten() {
    let (status, json) =
        get_json(fixture_router(), "/api/recommendations?user_id=1&n=999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["n"], 10);
    assert_eq!(json["count"], 4);
}

#[tokio::test]
async fn recommendations_default_n_is_five() {
    let (status, json) = get_json(fixture_router(), "/api/recommendations?user_id=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["n"], 5);
}

#[tokio::test]
async fn unknown_user_gets_empty_cards_and_no_extremes() {
    let (status, json) =
        get_json(fixture_router(), "/api/recommendations?user_id=404").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 0);
    assert!(json["cards"].as_array().expect("cards").is_empty());
    assert!(json["extremes"].is_null());
}

#[tokio::test]
async fn join_miss_card_shows_sentinels() {
    let (_, json) = get_json(fixture_router(), "/api/recommendations?user_id=2&n=3").await;
    let cards = json["cards"].as_array().expect("cards");
    let miss = cards
        .iter()
        .find(|card| card["book_index"] == 9)
        .expect("unresolvable row present");
    assert_eq!(miss["title"], "Unknown Title");
    assert_eq!(miss["author"], "Unknown Author");
    assert_eq!(
        miss["cover_url"],
        "https://via.placeholder.com/120x180.png?text=No+Cover"
    );
}

#[tokio::test]
async fn global_extremes_endpoint() {
    let (status, json) = get_json(fixture_router(), "/api/extremes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["best"]["rating"], 4.9);
    assert_eq!(json["worst"]["rating"], 0.0);
}

#[tokio::test]
async fn extremes_on_empty_table_is_404() {
    let router = router_over(Store::from_tables(Vec::new(), Vec::new()));
    let (status, json) = get_json(router, "/api/extremes").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "no recommendation rows available");
}

#[tokio::test]
async fn raw_tables_are_clamped_with_truncated_flag() {
    let (status, json) = get_json(fixture_router(), "/api/ratings?max_rows=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rows"].as_array().expect("rows").len(), 3);
    assert_eq!(json["total_rows"], 12);
    assert_eq!(json["truncated"], true);

    let (_, json) = get_json(fixture_router(), "/api/books").await;
    assert_eq!(json["rows"].as_array().expect("rows").len(), 5);
    assert_eq!(json["truncated"], false);
}

#[tokio::test]
async fn degraded_store_surfaces_in_health_and_summary() {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let store = Store::open(&StoreOptions::new(
        base.join("no-such-books.csv"),
        base.join("recommendations.csv"),
    ))
    .expect("open degrades");
    let router = router_over(store);
    let (_, health) = get_json(router.clone(), "/health").await;
    assert_eq!(health["degraded"], true);
    let (_, summary) = get_json(router, "/api/summary").await;
    assert_eq!(summary["total_books"], 0);
    assert_eq!(summary["report"]["books"]["status"], "missing");
}
