//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! ストア層（[`RepositoryError`], [`AuditLogError`]）のエラーはサービス層で一度だけ
//! [`ServiceError`] に変換され、HTTP層が最終的にステータスコードへ変換する。

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// User repository error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique index on email rejected the write
    #[error("Duplicate email: {0}")]
    DuplicateEmail(String),

    /// Any other store failure (message of the underlying error)
    #[error("Database error: {0}")]
    Database(String),
}

impl RepositoryError {
    /// Error code string as exposed in logs
    ///
    /// [`ServiceError`] への変換時にデバッグログへ出力される。
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Human-readable message without the code prefix
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) | Self::DuplicateEmail(msg) | Self::Database(msg) => msg,
        }
    }

    /// sqlxのエラーをリポジトリエラーに変換する
    ///
    /// ユニーク制約違反は `DuplicateEmail`、それ以外は `Database`。
    /// 行が存在しないケースは呼び出し側で `fetch_optional` の結果から判定する。
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::DuplicateEmail("A user with this email already exists".to_string())
            }
            sqlx::Error::RowNotFound => Self::NotFound("Row not found".to_string()),
            _ => Self::Database(err.to_string()),
        }
    }
}

/// Audit log repository error
///
/// 監査ログの書き込み失敗は常にデータベースエラーとして扱う
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditLogError {
    /// Store failure
    #[error("Database error: {0}")]
    Database(String),
}

impl AuditLogError {
    /// Human-readable message
    pub fn message(&self) -> &str {
        match self {
            Self::Database(msg) => msg,
        }
    }
}

/// User service error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// Business rule or input validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// User does not exist
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Email is already taken
    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    /// Catch-all (store errors, audit log failures, transaction failures)
    #[error("Internal error: {message}")]
    Internal {
        /// Message shown to clients
        message: String,
        /// Underlying error for diagnostics
        details: Option<Value>,
    },
}

impl ServiceError {
    /// 内部エラーを詳細付きで生成
    pub fn internal(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            details: Some(Value::String(details.into())),
        }
    }

    /// Returns the error type string (`VALIDATION_ERROR` etc.)
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::EmailAlreadyExists(_) => "EMAIL_ALREADY_EXISTS",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound(_) => StatusCode::NOT_FOUND,
            Self::EmailAlreadyExists(_) => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg) | Self::UserNotFound(msg) | Self::EmailAlreadyExists(msg) => msg,
            Self::Internal { message, .. } => message,
        }
    }

    /// Diagnostic details, if any
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Internal { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        debug!(code = err.code(), message = err.message(), "Repository error");
        match err {
            RepositoryError::NotFound(msg) => Self::UserNotFound(msg),
            RepositoryError::DuplicateEmail(msg) => Self::EmailAlreadyExists(msg),
            RepositoryError::Database(msg) => Self::internal("An unexpected error occurred", msg),
        }
    }
}

/// Result type alias (user repository)
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias (audit log repository)
pub type AuditLogResult<T> = Result<T, AuditLogError>;

/// Result type alias (user service)
pub type ServiceResult<T> = Result<T, ServiceError>;
