//! ユーザーサービス
//!
//! 業務ルールの検証とリポジトリ呼び出しの調停を行う。
//! 監査ログ付きの作成・更新は、ユーザーの書き込みと監査ログの追記を
//! 1つのストアトランザクションで実行する（両方残るか、どちらも残らない）。

use std::sync::Arc;

use serde_json::{json, Map, Value};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::common::error::{RepositoryError, ServiceError, ServiceResult};
use crate::db::audit_logs::SqliteAuditLogRepository;
use crate::db::traits::{AuditLogRepository, UserRepository};
use crate::db::users::SqliteUserRepository;
use crate::types::{AuditAction, AuditLog, NewAuditLog, NewUser, User, UserChanges, UserFilter};

/// メールアドレスの最大長（文字数）
pub const MAX_EMAIL_LENGTH: usize = 255;

/// ユーザーサービス
#[derive(Clone)]
pub struct UserService {
    pool: SqlitePool,
    users: Arc<dyn UserRepository>,
    audit_logs: Arc<dyn AuditLogRepository>,
}

impl UserService {
    /// リポジトリを指定してサービスを生成
    ///
    /// `pool` は監査ログ付き操作のトランザクション開始に使う。
    pub fn new(
        pool: SqlitePool,
        users: Arc<dyn UserRepository>,
        audit_logs: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            pool,
            users,
            audit_logs,
        }
    }

    /// SQLiteリポジトリでサービスを生成
    pub fn with_sqlite(pool: SqlitePool) -> Self {
        let users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let audit_logs = Arc::new(SqliteAuditLogRepository::new(pool.clone()));
        Self::new(pool, users, audit_logs)
    }

    /// ユーザーを作成
    ///
    /// メールアドレスの重複は事前にも確認するが、最終的にはユニークインデックスが判定する。
    pub async fn create_user(&self, new_user: NewUser) -> ServiceResult<User> {
        validate_new_user(&new_user)?;

        if self.email_in_use(&new_user.email).await? {
            return Err(email_taken());
        }

        let user = self.users.create(&new_user, None).await?;
        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// すべてのユーザーを取得
    pub async fn find_all_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.users.find_all().await?)
    }

    /// IDでユーザーを取得
    pub async fn find_user_by_id(&self, id: &str) -> ServiceResult<User> {
        require_id(id)?;
        Ok(self.users.find_by_id(id).await?)
    }

    /// ユーザーを更新
    ///
    /// 指定されたフィールドのみ検証する。メールアドレスが現在値と異なる場合は重複を再確認する。
    pub async fn update_user(&self, id: &str, changes: UserChanges) -> ServiceResult<User> {
        require_id(id)?;

        let current = self.users.find_by_id(id).await?;

        validate_changes(&changes)?;

        if let Some(email) = changes.effective_email() {
            if email != current.email && self.email_in_use(email).await? {
                return Err(email_taken());
            }
        }

        Ok(self.users.update(id, &changes, None).await?)
    }

    /// ユーザーを削除し、削除したユーザーを返す
    pub async fn delete_user(&self, id: &str) -> ServiceResult<User> {
        require_id(id)?;
        let user = self.users.delete(id).await?;
        info!(user_id = %user.id, "User deleted");
        Ok(user)
    }

    /// ユーザー数を取得
    pub async fn count_users(&self) -> ServiceResult<i64> {
        Ok(self.users.count().await?)
    }

    /// 条件に一致するユーザーを取得
    pub async fn find_users_by<F>(&self, predicate: F) -> ServiceResult<Vec<User>>
    where
        F: Fn(&User) -> bool,
    {
        let users = self.find_all_users().await?;
        Ok(users.into_iter().filter(|user| predicate(user)).collect())
    }

    /// 表示名・メールアドレスの部分一致（大文字小文字を区別しない）で絞り込む
    pub async fn filter_users(&self, filter: &UserFilter) -> ServiceResult<Vec<User>> {
        self.find_users_by(|user| filter.matches(user)).await
    }

    /// 監査ログ付きでユーザーを作成（トランザクション）
    pub async fn create_user_with_audit(
        &self,
        new_user: NewUser,
        performed_by: &str,
    ) -> ServiceResult<User> {
        validate_new_user(&new_user)?;

        let mut tx = self.begin().await?;
        let outcome = self
            .create_with_audit_in(&mut tx, &new_user, performed_by)
            .await;
        let user = finish(tx, outcome, "Failed to create user with audit log").await?;

        info!(user_id = %user.id, performed_by, "User created with audit log");
        Ok(user)
    }

    /// 監査ログ付きでユーザーを更新（トランザクション）
    ///
    /// 変更前の行はトランザクション内で読み直す。事前確認の後に削除されていた場合も
    /// `USER_NOT_FOUND` を返してトランザクションを中断する。
    pub async fn update_user_with_audit(
        &self,
        id: &str,
        changes: UserChanges,
        performed_by: &str,
    ) -> ServiceResult<User> {
        require_id(id)?;
        validate_changes(&changes)?;

        let mut tx = self.begin().await?;
        let outcome = self
            .update_with_audit_in(&mut tx, id, &changes, performed_by)
            .await;
        let user = finish(tx, outcome, "Failed to update user with audit log").await?;

        info!(user_id = %user.id, performed_by, "User updated with audit log");
        Ok(user)
    }

    /// ユーザーの監査ログを新しい順に取得
    pub async fn audit_trail(&self, user_id: &str) -> ServiceResult<Vec<AuditLog>> {
        require_id(user_id)?;

        if !self.users.exists(user_id).await? {
            return Err(user_not_found(user_id));
        }

        self.audit_logs
            .find_by_user_id(user_id)
            .await
            .map_err(|e| ServiceError::internal("Failed to fetch audit logs", e.message()))
    }

    async fn email_in_use(&self, email: &str) -> ServiceResult<bool> {
        match self.users.find_by_email(email).await {
            Ok(_) => Ok(true),
            Err(RepositoryError::NotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// 書き込みトランザクションを開始する
    ///
    /// 最初の文で書き込みロックを取得するため、同時更新は `busy_timeout` の範囲で順番待ちになる。
    async fn begin(&self) -> ServiceResult<Transaction<'static, Sqlite>> {
        debug!("Beginning transaction");
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| ServiceError::internal("Failed to start transaction", e.to_string()))
    }

    async fn create_with_audit_in(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        new_user: &NewUser,
        performed_by: &str,
    ) -> ServiceResult<User> {
        let user = self.users.create(new_user, Some(&mut *tx)).await?;

        let mut details = Map::new();
        details.insert("email".to_string(), Value::String(user.email.clone()));
        details.insert("name".to_string(), Value::String(user.name.clone()));

        let entry = NewAuditLog {
            user_id: user.id.clone(),
            action: AuditAction::Create,
            details,
            performed_by: performed_by.to_string(),
        };
        self.audit_logs
            .create_within_transaction(&entry, &mut *tx)
            .await
            .map_err(|e| ServiceError::internal("Failed to create audit log", e.message()))?;

        Ok(user)
    }

    async fn update_with_audit_in(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
        changes: &UserChanges,
        performed_by: &str,
    ) -> ServiceResult<User> {
        let current = self
            .users
            .find_by_id_within_transaction(id, &mut *tx)
            .await?;

        let updated = self.users.update(id, changes, Some(&mut *tx)).await?;

        let entry = NewAuditLog {
            user_id: id.to_string(),
            action: AuditAction::Update,
            details: change_set(&current, changes),
            performed_by: performed_by.to_string(),
        };
        self.audit_logs
            .create_within_transaction(&entry, &mut *tx)
            .await
            .map_err(|e| ServiceError::internal("Failed to create audit log", e.message()))?;

        Ok(updated)
    }
}

/// 成功時はコミット、失敗時はロールバックしてエラーを返す
///
/// `commit_failure` はコミット失敗時のメッセージ。
async fn finish<T>(
    tx: Transaction<'static, Sqlite>,
    outcome: ServiceResult<T>,
    commit_failure: &str,
) -> ServiceResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| ServiceError::internal(commit_failure, e.to_string()))?;
            debug!("Transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(e) = tx.rollback().await {
                warn!("Failed to roll back transaction: {}", e);
            } else {
                debug!(error_type = err.error_type(), "Transaction rolled back");
            }
            Err(err)
        }
    }
}

/// 変更されたフィールドごとの `{from, to}` を組み立てる
fn change_set(current: &User, changes: &UserChanges) -> Map<String, Value> {
    let mut diff = Map::new();
    if let Some(email) = changes.effective_email() {
        if email != current.email {
            diff.insert(
                "email".to_string(),
                json!({ "from": current.email, "to": email }),
            );
        }
    }
    if let Some(name) = changes.effective_name() {
        if name != current.name {
            diff.insert("name".to_string(), json!({ "from": current.name, "to": name }));
        }
    }
    diff
}

fn user_not_found(id: &str) -> ServiceError {
    ServiceError::UserNotFound(format!("User with id {} not found", id))
}

fn email_taken() -> ServiceError {
    ServiceError::EmailAlreadyExists("A user with this email already exists".to_string())
}

fn require_id(id: &str) -> ServiceResult<()> {
    if id.trim().is_empty() {
        return Err(ServiceError::Validation("User ID is required".to_string()));
    }
    Ok(())
}

fn validate_email_length(email: &str) -> ServiceResult<()> {
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(ServiceError::Validation(format!(
            "Email is too long (max {} characters)",
            MAX_EMAIL_LENGTH
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::Validation("Name cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_new_user(new_user: &NewUser) -> ServiceResult<()> {
    validate_email_length(&new_user.email)?;
    validate_name(&new_user.name)
}

fn validate_changes(changes: &UserChanges) -> ServiceResult<()> {
    if let Some(email) = changes.effective_email() {
        validate_email_length(email)?;
    }
    if let Some(name) = changes.name.as_deref() {
        validate_name(name)?;
    }
    Ok(())
}
