//! userhub server
//!
//! ユーザー管理と監査ログ付きトランザクション書き込みを提供するHTTPサーバー

#![warn(missing_docs)]

/// 共通型定義（エラー型）
pub mod common;

/// REST APIハンドラー
pub mod api;

/// データベースアクセス
pub mod db;

/// サービス層（検証とトランザクション境界）
pub mod service;

/// ロギング初期化ユーティリティ
pub mod logging;

/// 設定管理（環境変数ヘルパー）
pub mod config;

/// CLIインターフェース
pub mod cli;

/// axumサーバー起動
pub mod server;

/// 型定義
pub mod types;

use std::sync::Arc;

use config::AppConfig;
use service::UserService;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// ユーザーサービス
    pub user_service: Arc<UserService>,
    /// アプリケーション設定
    pub config: AppConfig,
}

impl AppState {
    /// リポジトリとサービスを組み立てる
    pub fn new(db_pool: sqlx::SqlitePool, config: AppConfig) -> Self {
        let user_service = Arc::new(UserService::with_sqlite(db_pool));
        Self {
            user_service,
            config,
        }
    }
}
