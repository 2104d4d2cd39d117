//! 監査ログ付きユーザー書き込み Contract Tests
//!
//! POST /users/with-audit, PATCH /users/:id/with-audit, GET /users/:id/audit-logs

use axum::http::StatusCode;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::support::app::{
    audit_rows, create_test_app, create_user, empty_request, json_request, send, user_rows,
};

/// 監査ログへのINSERTを常に失敗させる
async fn break_audit_store(pool: &SqlitePool) {
    sqlx::query(
        "CREATE TRIGGER reject_audit_logs BEFORE INSERT ON audit_logs
         BEGIN SELECT RAISE(ABORT, 'audit store offline'); END",
    )
    .execute(pool)
    .await
    .unwrap();
}

fn details_of(entry: &Value) -> Value {
    serde_json::from_str(entry["details"].as_str().unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// POST /users/with-audit
// ---------------------------------------------------------------------------

/// ユーザーとCREATE監査ログが両方書き込まれる
#[tokio::test]
async fn test_create_with_audit_writes_user_and_log() {
    let (app, db_pool) = create_test_app().await;

    let (status, user) = send(
        &app,
        json_request(
            "POST",
            "/users/with-audit",
            &json!({"email": "anna@example.com", "name": "Anna", "performedBy": "admin@example.com"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "anna@example.com");
    assert_eq!(user_rows(&db_pool).await, 1);

    let (status, logs) = send(
        &app,
        empty_request(
            "GET",
            &format!("/users/{}/audit-logs", user["id"].as_str().unwrap()),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["action"], "CREATE");
    assert_eq!(logs[0]["userId"], user["id"]);
    assert_eq!(logs[0]["performedBy"], "admin@example.com");
    assert_eq!(
        details_of(&logs[0]),
        json!({"email": "anna@example.com", "name": "Anna"})
    );
}

/// 監査ログの書き込みに失敗するとユーザーも残らない
#[tokio::test]
async fn test_create_with_audit_rolls_back_on_audit_failure() {
    let (app, db_pool) = create_test_app().await;
    break_audit_store(&db_pool).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/users/with-audit",
            &json!({"email": "anna@example.com", "name": "Anna", "performedBy": "admin"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["statusCode"], 500);
    assert_eq!(body["error"], "INTERNAL_ERROR");
    assert_eq!(body["message"], "Failed to create audit log");
    assert!(body["details"]
        .as_str()
        .is_some_and(|details| details.contains("audit store offline")));
    assert_eq!(user_rows(&db_pool).await, 0);
}

/// performedBy がなければ400で、何も書き込まれない
#[tokio::test]
async fn test_create_with_audit_requires_performed_by() {
    let (app, db_pool) = create_test_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/users/with-audit",
            &json!({"email": "anna@example.com", "name": "Anna"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(
        body["details"],
        json!([{"field": "performedBy", "constraints": ["isString", "isNotEmpty"]}])
    );
    assert_eq!(user_rows(&db_pool).await, 0);
    assert_eq!(audit_rows(&db_pool).await, 0);
}

/// メールアドレス重複は409で、監査ログも残らない
#[tokio::test]
async fn test_create_with_audit_duplicate_email() {
    let (app, db_pool) = create_test_app().await;
    create_user(&app, "dup@example.com", "First").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/users/with-audit",
            &json!({"email": "dup@example.com", "name": "Second", "performedBy": "admin"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "EMAIL_ALREADY_EXISTS");
    assert_eq!(user_rows(&db_pool).await, 1);
    assert_eq!(audit_rows(&db_pool).await, 0);
}

// ---------------------------------------------------------------------------
// PATCH /users/:id/with-audit
// ---------------------------------------------------------------------------

/// 名前だけ変更した場合、差分には name のみが記録される
#[tokio::test]
async fn test_update_with_audit_records_name_diff_only() {
    let (app, _db_pool) = create_test_app().await;
    let user = create_user(&app, "anna@example.com", "Anna").await;
    let id = user["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/users/{}/with-audit", id),
            &json!({"name": "Anne", "performedBy": "admin"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Anne");
    assert_eq!(body["email"], "anna@example.com");

    let (_, logs) = send(&app, empty_request("GET", &format!("/users/{}/audit-logs", id))).await;
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["action"], "UPDATE");
    let details = details_of(&logs[0]);
    assert_eq!(details, json!({"name": {"from": "Anna", "to": "Anne"}}));
    assert!(details.get("email").is_none());
}

/// 監査ログの書き込みに失敗すると更新も取り消される
#[tokio::test]
async fn test_update_with_audit_rolls_back_on_audit_failure() {
    let (app, db_pool) = create_test_app().await;
    let user = create_user(&app, "anna@example.com", "Anna").await;
    let id = user["id"].as_str().unwrap();
    break_audit_store(&db_pool).await;

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/users/{}/with-audit", id),
            &json!({"name": "Anne", "performedBy": "admin"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to create audit log");

    let (_, stored) = send(&app, empty_request("GET", &format!("/users/{}", id))).await;
    assert_eq!(stored["name"], "Anna");
    assert_eq!(stored["updatedAt"], user["updatedAt"]);
}

/// 存在しないユーザーは404
#[tokio::test]
async fn test_update_with_audit_missing_user() {
    let (app, db_pool) = create_test_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            "/users/missing/with-audit",
            &json!({"name": "Anne", "performedBy": "admin"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "USER_NOT_FOUND");
    assert_eq!(audit_rows(&db_pool).await, 0);
}

// ---------------------------------------------------------------------------
// GET /users/:id/audit-logs
// ---------------------------------------------------------------------------

/// 監査ログは新しい順
#[tokio::test]
async fn test_audit_trail_newest_first() {
    let (app, _db_pool) = create_test_app().await;

    let (_, user) = send(
        &app,
        json_request(
            "POST",
            "/users/with-audit",
            &json!({"email": "anna@example.com", "name": "Anna", "performedBy": "admin"}),
        ),
    )
    .await;
    let id = user["id"].as_str().unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    send(
        &app,
        json_request(
            "PATCH",
            &format!("/users/{}/with-audit", id),
            &json!({"email": "anne@example.com", "performedBy": "admin"}),
        ),
    )
    .await;

    let (status, logs) = send(&app, empty_request("GET", &format!("/users/{}/audit-logs", id))).await;

    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = logs
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["UPDATE", "CREATE"]);
}

/// 存在しないユーザーの監査ログは404
#[tokio::test]
async fn test_audit_trail_missing_user() {
    let (app, _db_pool) = create_test_app().await;

    let (status, _body) = send(&app, empty_request("GET", "/users/missing/audit-logs")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
