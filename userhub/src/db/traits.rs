//! Repository traitパターン定義
//!
//! DB操作を抽象化し、テスタビリティを向上させるためのtrait群。
//! 書き込み系の操作は呼び出し側が開始したトランザクションを受け取れる。

use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};

use crate::common::error::{AuditLogResult, RepositoryResult};
use crate::types::{AuditLog, NewAuditLog, NewUser, User, UserChanges};

// ---------------------------------------------------------------------------
// UserRepository
// ---------------------------------------------------------------------------

/// ユーザーCRUD操作のRepository trait
///
/// `tx` が渡された場合、書き込みはそのトランザクション上で行い、
/// 入れ子のトランザクションは開始しない。
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザーを作成
    async fn create(
        &self,
        new_user: &NewUser,
        tx: Option<&mut Transaction<'_, Sqlite>>,
    ) -> RepositoryResult<User>;
    /// すべてのユーザーを作成日時の降順で取得
    async fn find_all(&self) -> RepositoryResult<Vec<User>>;
    /// IDでユーザーを検索
    async fn find_by_id(&self, id: &str) -> RepositoryResult<User>;
    /// トランザクション内でIDによりユーザーを検索
    async fn find_by_id_within_transaction(
        &self,
        id: &str,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> RepositoryResult<User>;
    /// メールアドレスでユーザーを検索
    async fn find_by_email(&self, email: &str) -> RepositoryResult<User>;
    /// ユーザーを更新
    async fn update(
        &self,
        id: &str,
        changes: &UserChanges,
        tx: Option<&mut Transaction<'_, Sqlite>>,
    ) -> RepositoryResult<User>;
    /// ユーザーを削除し、削除前の内容を返す
    async fn delete(&self, id: &str) -> RepositoryResult<User>;
    /// ユーザーの存在確認
    async fn exists(&self, id: &str) -> RepositoryResult<bool>;
    /// ユーザー数
    async fn count(&self) -> RepositoryResult<i64>;
}

// ---------------------------------------------------------------------------
// AuditLogRepository
// ---------------------------------------------------------------------------

/// 監査ログのRepository trait
///
/// 書き込みは常に呼び出し側のトランザクション内で行う。
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// 監査ログを追記
    async fn create_within_transaction(
        &self,
        entry: &NewAuditLog,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> AuditLogResult<AuditLog>;
    /// ユーザーの監査ログを新しい順に取得
    async fn find_by_user_id(&self, user_id: &str) -> AuditLogResult<Vec<AuditLog>>;
}
