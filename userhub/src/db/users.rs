//! ユーザーCRUD操作

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::traits::UserRepository;
use super::{format_timestamp, parse_timestamp};
use crate::common::error::{RepositoryError, RepositoryResult};
use crate::types::{NewUser, User, UserChanges};

/// SQLite上のユーザーリポジトリ
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    /// リポジトリを生成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn not_found(id: &str) -> RepositoryError {
    RepositoryError::NotFound(format!("User with id {} not found", id))
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(
        &self,
        new_user: &NewUser,
        tx: Option<&mut Transaction<'_, Sqlite>>,
    ) -> RepositoryResult<User> {
        let id = Uuid::new_v4().to_string();
        let now = format_timestamp(&Utc::now());

        let query = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, email, name, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, email, name, created_at, updated_at",
        )
        .bind(&id)
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&now)
        .bind(&now);

        let row = match tx {
            Some(tx) => query.fetch_one(&mut **tx).await,
            None => query.fetch_one(&self.pool).await,
        }
        .map_err(RepositoryError::from_sqlx)?;

        row.try_into()
    }

    async fn find_all(&self) -> RepositoryResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, created_at, updated_at FROM users
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<User> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?
        .ok_or_else(|| not_found(id))?
        .try_into()
    }

    async fn find_by_id_within_transaction(
        &self,
        id: &str,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> RepositoryResult<User> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(RepositoryError::from_sqlx)?
        .ok_or_else(|| not_found(id))?
        .try_into()
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<User> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, created_at, updated_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?
        .ok_or_else(|| RepositoryError::NotFound(format!("User with email {} not found", email)))?
        .try_into()
    }

    async fn update(
        &self,
        id: &str,
        changes: &UserChanges,
        tx: Option<&mut Transaction<'_, Sqlite>>,
    ) -> RepositoryResult<User> {
        let now = format_timestamp(&Utc::now());

        // 指定されなかった（または空の）フィールドは現在値のまま
        let query = sqlx::query_as::<_, UserRow>(
            "UPDATE users
             SET email = COALESCE(?, email), name = COALESCE(?, name), updated_at = ?
             WHERE id = ?
             RETURNING id, email, name, created_at, updated_at",
        )
        .bind(changes.effective_email())
        .bind(changes.effective_name())
        .bind(&now)
        .bind(id);

        let row = match tx {
            Some(tx) => query.fetch_optional(&mut **tx).await,
            None => query.fetch_optional(&self.pool).await,
        }
        .map_err(RepositoryError::from_sqlx)?;

        row.ok_or_else(|| not_found(id))?.try_into()
    }

    async fn delete(&self, id: &str) -> RepositoryResult<User> {
        sqlx::query_as::<_, UserRow>(
            "DELETE FROM users WHERE id = ?
             RETURNING id, email, name, created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?
        .ok_or_else(|| not_found(id))?
        .try_into()
    }

    async fn exists(&self, id: &str) -> RepositoryResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)?;

        Ok(count > 0)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::from_sqlx)
    }
}

// SQLiteからの行取得用の内部型
#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            id: row.id,
            email: row.email,
            name: row.name,
        })
    }
}
