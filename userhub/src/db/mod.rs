//! データベースアクセス層
//!
//! SQLiteベースのデータ永続化

/// ユーザー管理
pub mod users;

/// 監査ログストレージ
pub mod audit_logs;

/// データベースマイグレーション
pub mod migrations;

/// Repository traitパターン（テスタビリティ向上）
pub mod traits;

use crate::common::error::RepositoryError;
use chrono::{DateTime, SecondsFormat, Utc};

/// 日時をDB保存用のRFC 3339文字列（ミリ秒精度）に変換
pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// DBに保存されたRFC 3339文字列を日時に変換
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Database(format!("Invalid timestamp '{}': {}", raw, e)))
}
