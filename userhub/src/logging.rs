//! ロギング初期化
//!
//! 標準出力へのフォーマット出力に加え、`USERHUB_LOG_DIR` が設定されている場合は
//! 日次ローテーションのログファイルにも書き出す。

use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config;

/// ログファイル名のプレフィックス（`userhub.log.YYYY-MM-DD`）
pub const LOG_FILE_PREFIX: &str = "userhub.log";

/// グローバルなtracing subscriberを初期化する
///
/// 2回目以降の呼び出しはエラーを返す。
pub fn init() -> anyhow::Result<()> {
    let filter = env_filter(&config::get_log_level());

    let file_layer = match config::get_log_dir() {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            Some(fmt::layer().with_ansi(false).with_writer(appender))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}

/// フィルタ文字列を解釈する（不正な場合は `info`）
fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"))
}
