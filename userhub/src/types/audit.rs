//! 監査ログの型定義

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 監査対象の操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// ユーザー作成
    Create,
    /// ユーザー更新
    Update,
    /// ユーザー削除
    Delete,
}

impl AuditAction {
    /// AuditActionを文字列に変換
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// 文字列からAuditActionに変換（未知の値は `None`）
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(Self::Create),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 監査ログエントリ（保存済み）
///
/// `details` は保存時にシリアライズされたJSON文字列をそのまま保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    /// レコードID
    pub id: String,
    /// 対象ユーザーID
    pub user_id: String,
    /// 操作
    pub action: AuditAction,
    /// 操作の詳細（JSON文字列）
    pub details: String,
    /// 操作者
    pub performed_by: String,
    /// 作成日時
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    /// `details` をJSONとして解釈する
    pub fn details_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.details)
    }
}

/// 監査ログ作成入力
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditLog {
    /// 対象ユーザーID
    pub user_id: String,
    /// 操作
    pub action: AuditAction,
    /// 操作の詳細
    pub details: Map<String, Value>,
    /// 操作者
    pub performed_by: String,
}
