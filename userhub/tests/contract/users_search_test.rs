//! ユーザー検索API Contract Tests
//!
//! GET /users/search/count, POST /users/search/filter

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::support::app::{create_test_app, create_user, empty_request, json_request, send};

async fn seed(app: &axum::Router) {
    create_user(app, "anna@example.com", "Anna").await;
    create_user(app, "joanne@example.org", "JoANNe").await;
    create_user(app, "bob@example.com", "Bob").await;
}

fn sorted_names(body: &Value) -> Vec<String> {
    let mut names: Vec<String> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|user| user["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_count_users() {
    let (app, _db_pool) = create_test_app().await;

    let (status, body) = send(&app, empty_request("GET", "/users/search/count")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 0}));

    seed(&app).await;

    let (_, body) = send(&app, empty_request("GET", "/users/search/count")).await;
    assert_eq!(body, json!({"count": 3}));
}

/// 表示名は大文字小文字を区別しない部分一致
#[tokio::test]
async fn test_filter_by_name_ignores_case() {
    let (app, _db_pool) = create_test_app().await;
    seed(&app).await;

    let (status, body) = send(
        &app,
        json_request("POST", "/users/search/filter", &json!({"name": "ann"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(sorted_names(&body), vec!["Anna", "JoANNe"]);
}

/// 複数条件はAND結合
#[tokio::test]
async fn test_filter_criteria_are_combined() {
    let (app, _db_pool) = create_test_app().await;
    seed(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/users/search/filter",
            &json!({"name": "ANN", "email": "example.com"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(sorted_names(&body), vec!["Anna"]);
}

/// 条件なしは全件
#[tokio::test]
async fn test_empty_filter_returns_everyone() {
    let (app, _db_pool) = create_test_app().await;
    seed(&app).await;

    let (status, body) = send(
        &app,
        json_request("POST", "/users/search/filter", &json!({"name": ""})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}
