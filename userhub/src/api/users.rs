//! ユーザー管理API
//!
//! ユーザーCRUDと監査ログ付きの作成・更新

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::error::AppError;
use super::validation::{
    CreateUserPayload, CreateUserWithAuditPayload, FilterUsersPayload, UpdateUserPayload,
    UpdateUserWithAuditPayload, ValidatedJson,
};
use crate::types::{AuditLog, User};
use crate::AppState;

/// ユーザー数レスポンス
#[derive(Debug, Serialize)]
pub struct CountResponse {
    /// ユーザー数
    pub count: i64,
}

/// POST /users - ユーザー作成
///
/// # Returns
/// * `201 Created` - 作成されたユーザー
/// * `400 Bad Request` - 入力検証エラー
/// * `409 Conflict` - メールアドレス重複
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(new_user): ValidatedJson<CreateUserPayload>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.user_service.create_user(new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users - ユーザー一覧取得（作成日時の降順）
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.user_service.find_all_users().await?))
}

/// GET /users/:id - ユーザー取得
///
/// # Returns
/// * `200 OK` - ユーザー
/// * `404 Not Found` - 存在しない
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.user_service.find_user_by_id(&id).await?))
}

/// PATCH /users/:id - ユーザー更新
///
/// 指定されたフィールドのみ更新する
///
/// # Returns
/// * `200 OK` - 更新後のユーザー
/// * `400 Bad Request` - 入力検証エラー
/// * `404 Not Found` - 存在しない
/// * `409 Conflict` - メールアドレス重複
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(changes): ValidatedJson<UpdateUserPayload>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.user_service.update_user(&id, changes).await?))
}

/// DELETE /users/:id - ユーザー削除
///
/// 削除したユーザーを返す
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.user_service.delete_user(&id).await?))
}

/// GET /users/search/count - ユーザー数
pub async fn count_users(State(state): State<AppState>) -> Result<Json<CountResponse>, AppError> {
    let count = state.user_service.count_users().await?;
    Ok(Json(CountResponse { count }))
}

/// POST /users/search/filter - 表示名・メールアドレスで絞り込み
pub async fn filter_users(
    State(state): State<AppState>,
    ValidatedJson(filter): ValidatedJson<FilterUsersPayload>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.user_service.filter_users(&filter).await?))
}

/// POST /users/with-audit - 監査ログ付きユーザー作成
///
/// ユーザーと監査ログは同一トランザクションで書き込まれる
///
/// # Returns
/// * `201 Created` - 作成されたユーザー
/// * `400 Bad Request` - 入力検証エラー
/// * `409 Conflict` - メールアドレス重複
/// * `500 Internal Server Error` - 監査ログの書き込み失敗等（ユーザーも作成されない）
pub async fn create_user_with_audit(
    State(state): State<AppState>,
    ValidatedJson((new_user, performed_by)): ValidatedJson<CreateUserWithAuditPayload>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state
        .user_service
        .create_user_with_audit(new_user, &performed_by)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PATCH /users/:id/with-audit - 監査ログ付きユーザー更新
pub async fn update_user_with_audit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson((changes, performed_by)): ValidatedJson<UpdateUserWithAuditPayload>,
) -> Result<Json<User>, AppError> {
    let user = state
        .user_service
        .update_user_with_audit(&id, changes, &performed_by)
        .await?;
    Ok(Json(user))
}

/// GET /users/:id/audit-logs - ユーザーの監査ログ（新しい順）
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    Ok(Json(state.user_service.audit_trail(&id).await?))
}
