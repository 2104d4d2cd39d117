//! ユーザー型定義

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ユーザー
///
/// ストアが所有し、サービス層ではキャッシュしない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// ユーザーID（UUID v4文字列）
    pub id: String,
    /// メールアドレス（一意）
    pub email: String,
    /// 表示名
    pub name: String,
    /// 作成日時
    pub created_at: DateTime<Utc>,
    /// 最終更新日時
    pub updated_at: DateTime<Utc>,
}

/// ユーザー作成入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// メールアドレス
    pub email: String,
    /// 表示名
    pub name: String,
}

impl NewUser {
    /// 入力を生成
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// ユーザー更新入力
///
/// `None` のフィールドは変更しない
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    /// 新しいメールアドレス
    pub email: Option<String>,
    /// 新しい表示名
    pub name: Option<String>,
}

impl UserChanges {
    /// 表示名のみ変更
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            email: None,
            name: Some(name.into()),
        }
    }

    /// メールアドレスのみ変更
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            name: None,
        }
    }

    /// 空文字のメールアドレスは「指定なし」とみなす
    pub fn effective_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|email| !email.is_empty())
    }

    /// 空文字の表示名は「指定なし」とみなす（検証は別途サービス層で行う）
    pub fn effective_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// ユーザー検索条件
///
/// 各条件は大文字小文字を区別しない部分一致で、指定された条件はAND結合される。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// 表示名の部分文字列
    pub name: Option<String>,
    /// メールアドレスの部分文字列
    pub email: Option<String>,
}

impl UserFilter {
    /// ユーザーが条件に一致するか
    pub fn matches(&self, user: &User) -> bool {
        fn contains_ignore_case(haystack: &str, needle: Option<&String>) -> bool {
            match needle.filter(|n| !n.is_empty()) {
                Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
                None => true,
            }
        }

        contains_ignore_case(&user.name, self.name.as_ref())
            && contains_ignore_case(&user.email, self.email.as_ref())
    }
}
