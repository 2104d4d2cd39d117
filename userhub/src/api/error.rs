//! APIエラーレスポンス型
//!
//! axum用の共通エラーハンドリング。
//!
//! ハンドラーが返すエラーは `{statusCode, error, message, details?}` を組み立て、
//! レスポンスのextensionに [`ErrorPayload`] として格納する。
//! [`error_envelope`] ミドルウェアがそれを取り出し、`timestamp` / `path` / `method`
//! を付け足した最終的なボディに書き換える。

use std::any::Any;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::common::error::ServiceError;
use crate::config::Environment;

/// 入力検証の違反（フィールド単位）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// フィールド名（JSON上の名前）
    pub field: String,
    /// 違反した制約名（`isEmail`, `isNotEmpty`, `isString`）
    pub constraints: Vec<String>,
}

impl FieldViolation {
    /// 違反を生成
    pub fn new(field: &str, constraints: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            constraints: constraints.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// エラーボディ（エンベロープ付与前）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    /// HTTPステータスコード
    pub status_code: u16,
    /// エラー種別
    pub error: String,
    /// メッセージ
    pub message: String,
    /// 詳細
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// クライアントに返す最終的なエラーボディ
#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    #[serde(flatten)]
    payload: ErrorPayload,
    timestamp: String,
    path: String,
    method: String,
}

/// Axum用のエラーレスポンス型
#[derive(Debug)]
pub enum AppError {
    /// サービス層のエラー
    Service(ServiceError),
    /// ペイロードの検証エラー
    Validation(Vec<FieldViolation>),
    /// JSONとして解釈できないリクエスト
    BadRequest(String),
    /// 未定義のルート
    NotFound(String),
    /// ハンドラー内のパニック
    Panic(Option<String>),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::Service(err)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Service(err) => err.status_code(),
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Panic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// エンベロープ付与前のボディ
    pub fn payload(&self) -> ErrorPayload {
        let status = self.status();
        let (error, message, details) = match self {
            AppError::Service(err) => (
                err.error_type().to_string(),
                err.message().to_string(),
                err.details().cloned(),
            ),
            AppError::Validation(violations) => (
                "VALIDATION_ERROR".to_string(),
                "Validation failed".to_string(),
                serde_json::to_value(violations).ok(),
            ),
            AppError::BadRequest(message) => ("Bad Request".to_string(), message.clone(), None),
            AppError::NotFound(message) => ("Not Found".to_string(), message.clone(), None),
            AppError::Panic(details) => (
                "Internal Server Error".to_string(),
                "An unexpected error occurred".to_string(),
                details.clone().map(Value::String),
            ),
        };

        ErrorPayload {
            status_code: status.as_u16(),
            error,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let payload = self.payload();

        if status.is_server_error() {
            tracing::error!(
                error = %payload.error,
                details = ?payload.details,
                "{}",
                payload.message
            );
        }

        let mut response = (status, Json(payload.clone())).into_response();
        response.extensions_mut().insert(payload);
        response
    }
}

/// エラーレスポンスに `timestamp` / `path` / `method` を付与するミドルウェア
pub async fn error_envelope(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let mut response = next.run(request).await;
    let Some(payload) = response.extensions_mut().remove::<ErrorPayload>() else {
        return response;
    };

    let status = response.status();
    let envelope = ErrorEnvelope {
        payload,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        path,
        method,
    };
    (status, Json(envelope)).into_response()
}

/// 未定義ルートのフォールバック
pub async fn route_not_found(request: Request) -> AppError {
    AppError::NotFound(format!(
        "Cannot {} {}",
        request.method(),
        request.uri().path()
    ))
}

/// パニックを500レスポンスに変換する
///
/// パニックメッセージは開発環境でのみ `details` に含める。
pub fn panic_response(environment: Environment, err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if !environment.is_development() {
        None
    } else if let Some(s) = err.downcast_ref::<String>() {
        Some(s.clone())
    } else if let Some(s) = err.downcast_ref::<&str>() {
        Some(s.to_string())
    } else {
        Some("Unknown panic message".to_string())
    };

    AppError::Panic(details).into_response()
}
