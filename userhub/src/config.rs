//! Configuration management via environment variables
//!
//! Provides helper functions for reading environment variables with fallback
//! to legacy variable names with warning logs, and the [`AppConfig`] assembled
//! from them at startup.

use std::fmt;
use std::path::PathBuf;

/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;
/// Default SQLite database URL
pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/userhub.db";

/// Get an environment variable with fallback to a legacy name
///
/// If the new variable name is set, returns its value.
/// If only the old (legacy) variable name is set, returns its value
/// and logs a deprecation warning.
///
/// # Example
/// ```
/// use userhub::config::get_env_with_fallback;
///
/// let port = get_env_with_fallback("USERHUB_PORT", "PORT");
/// ```
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(new_name: &str, old_name: &str, default: &str) -> String {
    get_env_with_fallback(new_name, old_name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable with fallback, parsing to a specific type
///
/// Falls back to `default` if neither variable is set or parsing fails.
pub fn get_env_with_fallback_parse<T: std::str::FromStr>(
    new_name: &str,
    old_name: &str,
    default: T,
) -> T {
    get_env_with_fallback(new_name, old_name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// 実行環境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// 開発環境（パニック詳細をレスポンスに含める）
    #[default]
    Development,
    /// テスト環境（パニック詳細を隠す）
    Test,
    /// 本番環境（パニック詳細を隠す）
    Production,
}

impl Environment {
    /// 文字列から解釈する（未知の値は開発環境扱い）
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "test" => Self::Test,
            _ => Self::Development,
        }
    }

    /// 開発環境か
    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        };
        f.write_str(name)
    }
}

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// SQLite database URL
    pub database_url: String,
    /// 実行環境
    pub environment: Environment,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            environment: Environment::Development,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: get_env_with_fallback_or("USERHUB_HOST", "HOST", DEFAULT_HOST),
            port: get_env_with_fallback_parse("USERHUB_PORT", "PORT", DEFAULT_PORT),
            database_url: get_env_with_fallback_or(
                "USERHUB_DATABASE_URL",
                "DATABASE_URL",
                DEFAULT_DATABASE_URL,
            ),
            environment: get_env_with_fallback("USERHUB_ENV", "NODE_ENV")
                .map(|value| Environment::parse(&value))
                .unwrap_or_default(),
        }
    }

    /// `host:port` 形式のバインドアドレス
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// ログレベル（フィルタ文字列）を取得
///
/// 環境変数 `USERHUB_LOG_LEVEL`（旧: `RUST_LOG`）から取得し、未設定の場合は `info`。
pub fn get_log_level() -> String {
    get_env_with_fallback_or("USERHUB_LOG_LEVEL", "RUST_LOG", "info")
}

/// ログファイル出力先ディレクトリを取得
///
/// 環境変数 `USERHUB_LOG_DIR` が未設定の場合は標準出力のみ。
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var("USERHUB_LOG_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}
