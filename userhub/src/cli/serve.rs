//! serve サブコマンド
//!
//! HTTPサーバーを起動します。

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::db::migrations::initialize_database;
use crate::AppState;

/// serve サブコマンドの引数
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Listen port
    #[arg(short, long, env = "USERHUB_PORT")]
    pub port: Option<u16>,

    /// Bind address
    #[arg(short = 'H', long, env = "USERHUB_HOST")]
    pub host: Option<String>,
}

impl ServeArgs {
    /// フラグで指定された値で設定を上書きする
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config
    }
}

/// データベースを初期化してサーバーを起動する
pub async fn execute(args: &ServeArgs, config: AppConfig) -> anyhow::Result<()> {
    let config = args.apply(config);
    info!(
        environment = %config.environment,
        database_url = %config.database_url,
        "Starting userhub"
    );

    let db_pool = initialize_database(&config.database_url).await?;
    let bind_addr = config.bind_addr();
    let state = AppState::new(db_pool, config);

    crate::server::run(state, &bind_addr).await
}
