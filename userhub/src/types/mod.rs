//! 型定義モジュール
//!
//! ドメインエンティティの型定義を提供

/// ユーザー関連の型定義
pub mod user;

/// 監査ログ関連の型定義
pub mod audit;

pub use audit::{AuditAction, AuditLog, NewAuditLog};
pub use user::{NewUser, User, UserChanges, UserFilter};
