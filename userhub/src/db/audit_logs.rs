//! 監査ログストレージ
//!
//! 追記専用。更新・削除の操作は提供しない。

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::traits::AuditLogRepository;
use super::{format_timestamp, parse_timestamp};
use crate::common::error::{AuditLogError, AuditLogResult};
use crate::types::{AuditAction, AuditLog, NewAuditLog};

/// SQLite上の監査ログリポジトリ
#[derive(Clone)]
pub struct SqliteAuditLogRepository {
    pool: SqlitePool,
}

impl SqliteAuditLogRepository {
    /// リポジトリを生成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for SqliteAuditLogRepository {
    async fn create_within_transaction(
        &self,
        entry: &NewAuditLog,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> AuditLogResult<AuditLog> {
        let details = serde_json::to_string(&entry.details).map_err(|e| {
            AuditLogError::Database(format!("Failed to serialize audit details: {}", e))
        })?;
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO audit_logs (id, user_id, action, details, performed_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&entry.user_id)
        .bind(entry.action.as_str())
        .bind(&details)
        .bind(&entry.performed_by)
        .bind(format_timestamp(&created_at))
        .execute(&mut **tx)
        .await
        .map_err(|e| AuditLogError::Database(format!("Failed to create audit log: {}", e)))?;

        Ok(AuditLog {
            id,
            user_id: entry.user_id.clone(),
            action: entry.action,
            details,
            performed_by: entry.performed_by.clone(),
            created_at,
        })
    }

    async fn find_by_user_id(&self, user_id: &str) -> AuditLogResult<Vec<AuditLog>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(
            "SELECT id, user_id, action, details, performed_by, created_at
             FROM audit_logs WHERE user_id = ?
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuditLogError::Database(format!("Failed to fetch audit logs: {}", e)))?;

        rows.into_iter().map(AuditLog::try_from).collect()
    }
}

/// sqlx::FromRow用の行構造体
#[derive(Debug, sqlx::FromRow)]
struct AuditLogRow {
    id: String,
    user_id: String,
    action: String,
    details: String,
    performed_by: String,
    created_at: String,
}

impl TryFrom<AuditLogRow> for AuditLog {
    type Error = AuditLogError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        let action = AuditAction::parse(&row.action).ok_or_else(|| {
            AuditLogError::Database(format!("Unknown audit action: {}", row.action))
        })?;
        let created_at = parse_timestamp(&row.created_at)
            .map_err(|e| AuditLogError::Database(e.message().to_string()))?;

        Ok(AuditLog {
            id: row.id,
            user_id: row.user_id,
            action,
            details: row.details,
            performed_by: row.performed_by,
            created_at,
        })
    }
}
