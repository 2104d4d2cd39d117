//! サービス層
//!
//! 業務ルールの検証とトランザクション境界を担う

/// ユーザー管理サービス
pub mod users;

pub use users::UserService;
