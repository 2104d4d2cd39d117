//! データベース初期化とマイグレーション実行

use anyhow::Context;
use sqlx::{migrate::MigrateDatabase, sqlite::SqliteConnectOptions, Sqlite, SqlitePool};
use std::str::FromStr;

/// SQLiteデータベース接続プールを作成してマイグレーションを実行
///
/// # Arguments
/// * `database_url` - データベースURL（例: "sqlite:data/userhub.db"）
///
/// # Returns
/// * `Ok(SqlitePool)` - 初期化済みデータベースプール
/// * `Err` - 初期化失敗
pub async fn initialize_database(database_url: &str) -> anyhow::Result<SqlitePool> {
    ensure_parent_dir(database_url)?;

    // データベースファイルが存在しない場合は作成
    if !Sqlite::database_exists(database_url)
        .await
        .with_context(|| format!("Failed to check database {}", database_url))?
    {
        tracing::info!("Creating database: {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .with_context(|| format!("Failed to create database {}", database_url))?;
    }

    let connect_options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL {}", database_url))?
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(connect_options)
        .await
        .with_context(|| format!("Failed to connect to database {}", database_url))?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// マイグレーションを実行（sqlx::migrate!マクロを使用）
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    tracing::info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// SQLiteファイルはディレクトリが存在しないと作成できないため、先に作成しておく
fn ensure_parent_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    // `sqlite::memory:` のような特殊指定はスキップ
    if path.starts_with(':') {
        return Ok(());
    }

    let normalized = path.trim_start_matches("//");
    let path_without_params = normalized.split('?').next().unwrap_or(normalized);
    if let Some(parent) = std::path::Path::new(path_without_params).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }
    Ok(())
}
