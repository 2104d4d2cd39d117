#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;
use userhub::config::{AppConfig, Environment};
use userhub::{api, AppState};

/// テスト用のアプリケーションを作成する（.oneshot()スタイルのテスト用）
pub async fn create_test_app() -> (Router, SqlitePool) {
    create_test_app_with_config(AppConfig {
        environment: Environment::Test,
        ..AppConfig::default()
    })
    .await
}

/// 設定を指定してテスト用のアプリケーションを作成する
pub async fn create_test_app_with_config(config: AppConfig) -> (Router, SqlitePool) {
    let db_pool = create_test_db_pool().await;
    let state = AppState::new(db_pool.clone(), config);
    (api::create_app(state), db_pool)
}

/// テスト用のSQLiteデータベースプールを作成する
pub async fn create_test_db_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    userhub::db::migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// JSONボディ付きのリクエスト
pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// ボディなしのリクエスト
pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// リクエストを送信し、ステータスとJSONボディを返す
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// POST /users でユーザーを作成し、作成されたユーザーを返す
pub async fn create_user(app: &Router, email: &str, name: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/users",
            &serde_json::json!({"email": email, "name": name}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
    body
}

/// ユーザーテーブルの行数
pub async fn user_rows(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .unwrap()
}

/// 監査ログテーブルの行数
pub async fn audit_rows(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(pool)
        .await
        .unwrap()
}
