//! 契約テスト共通サポート

pub mod app;
