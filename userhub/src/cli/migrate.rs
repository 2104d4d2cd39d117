//! migrate サブコマンド
//!
//! マイグレーションを適用して終了します。

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::db::migrations::initialize_database;

/// migrate サブコマンドの引数
#[derive(Args, Debug, Clone, Default)]
pub struct MigrateArgs {
    /// Database URL
    #[arg(long, env = "USERHUB_DATABASE_URL")]
    pub database_url: Option<String>,
}

/// マイグレーションを実行する
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> anyhow::Result<()> {
    let database_url = args
        .database_url
        .clone()
        .unwrap_or_else(|| config.database_url.clone());

    let pool = initialize_database(&database_url).await?;
    pool.close().await;

    info!("Migrations applied to {}", database_url);
    Ok(())
}
