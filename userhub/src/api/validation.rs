//! リクエストペイロードの検証
//!
//! ペイロードはすべてのフィールドを省略可能な状態でデシリアライズし、
//! [`Validate::validate`] でサービス層の入力に変換する。
//! 違反はフィールドごとに `{field, constraints[]}` として集める。

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use super::error::{AppError, FieldViolation};
use crate::types::{NewUser, UserChanges, UserFilter};

const IS_EMAIL: &str = "isEmail";
const IS_NOT_EMPTY: &str = "isNotEmpty";
const IS_STRING: &str = "isString";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex must compile")
});

/// ペイロードをサービス層の入力に変換する
pub trait Validate {
    /// 検証済みの値
    type Output;

    /// 検証して変換する。違反があればすべて返す
    fn validate(self) -> Result<Self::Output, Vec<FieldViolation>>;
}

/// JSONボディを読み取り、[`Validate`] で検証する抽出器
pub struct ValidatedJson<T: Validate>(pub T::Output);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: Validate + DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        payload
            .validate()
            .map(ValidatedJson)
            .map_err(AppError::Validation)
    }
}

/// 違反の収集
#[derive(Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn push(&mut self, field: &str, constraints: &[&str]) {
        if !constraints.is_empty() {
            self.0.push(FieldViolation::new(field, constraints));
        }
    }

    /// 必須のメールアドレス
    fn required_email(&mut self, field: &str, value: Option<Value>) -> Option<String> {
        match value {
            None | Some(Value::Null) => {
                self.push(field, &[IS_EMAIL, IS_NOT_EMPTY]);
                None
            }
            Some(value) => self.email(field, value),
        }
    }

    /// 省略可能なメールアドレス（指定されたときだけ検証）
    fn optional_email(&mut self, field: &str, value: Option<Value>) -> Option<String> {
        match value {
            None | Some(Value::Null) => None,
            Some(value) => self.email(field, value),
        }
    }

    fn email(&mut self, field: &str, value: Value) -> Option<String> {
        match value {
            Value::String(s) if s.is_empty() => {
                self.push(field, &[IS_EMAIL, IS_NOT_EMPTY]);
                None
            }
            Value::String(s) if EMAIL_RE.is_match(&s) => Some(s),
            _ => {
                self.push(field, &[IS_EMAIL]);
                None
            }
        }
    }

    /// 必須の文字列
    fn required_string(&mut self, field: &str, value: Option<Value>) -> Option<String> {
        match value {
            None | Some(Value::Null) => {
                self.push(field, &[IS_STRING, IS_NOT_EMPTY]);
                None
            }
            Some(value) => self.non_empty_string(field, value),
        }
    }

    /// 省略可能な文字列（指定されたときだけ検証）
    fn optional_string(&mut self, field: &str, value: Option<Value>) -> Option<String> {
        match value {
            None | Some(Value::Null) => None,
            Some(value) => self.non_empty_string(field, value),
        }
    }

    fn non_empty_string(&mut self, field: &str, value: Value) -> Option<String> {
        match value {
            Value::String(s) if s.is_empty() => {
                self.push(field, &[IS_NOT_EMPTY]);
                None
            }
            Value::String(s) => Some(s),
            _ => {
                self.push(field, &[IS_STRING]);
                None
            }
        }
    }

    /// 検索条件の文字列（空文字は「指定なし」）
    fn filter_string(&mut self, field: &str, value: Option<Value>) -> Option<String> {
        match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(_) => {
                self.push(field, &[IS_STRING]);
                None
            }
        }
    }

    fn finish<T>(self, output: impl FnOnce() -> T) -> Result<T, Vec<FieldViolation>> {
        if self.0.is_empty() {
            Ok(output())
        } else {
            Err(self.0)
        }
    }
}

/// POST /users
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserPayload {
    /// メールアドレス
    pub email: Option<Value>,
    /// 表示名
    pub name: Option<Value>,
}

impl Validate for CreateUserPayload {
    type Output = NewUser;

    fn validate(self) -> Result<NewUser, Vec<FieldViolation>> {
        let mut v = Violations::default();
        let email = v.required_email("email", self.email);
        let name = v.required_string("name", self.name);
        v.finish(|| NewUser::new(email.unwrap_or_default(), name.unwrap_or_default()))
    }
}

/// PATCH /users/:id
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserPayload {
    /// 新しいメールアドレス
    pub email: Option<Value>,
    /// 新しい表示名
    pub name: Option<Value>,
}

impl Validate for UpdateUserPayload {
    type Output = UserChanges;

    fn validate(self) -> Result<UserChanges, Vec<FieldViolation>> {
        let mut v = Violations::default();
        let email = v.optional_email("email", self.email);
        let name = v.optional_string("name", self.name);
        v.finish(|| UserChanges { email, name })
    }
}

/// POST /users/with-audit
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserWithAuditPayload {
    /// メールアドレス
    pub email: Option<Value>,
    /// 表示名
    pub name: Option<Value>,
    /// 操作者（管理者のメールアドレス、`system` など）
    pub performed_by: Option<Value>,
}

impl Validate for CreateUserWithAuditPayload {
    type Output = (NewUser, String);

    fn validate(self) -> Result<(NewUser, String), Vec<FieldViolation>> {
        let mut v = Violations::default();
        let email = v.required_email("email", self.email);
        let name = v.required_string("name", self.name);
        let performed_by = v.required_string("performedBy", self.performed_by);
        v.finish(|| {
            (
                NewUser::new(email.unwrap_or_default(), name.unwrap_or_default()),
                performed_by.unwrap_or_default(),
            )
        })
    }
}

/// PATCH /users/:id/with-audit
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserWithAuditPayload {
    /// 新しいメールアドレス
    pub email: Option<Value>,
    /// 新しい表示名
    pub name: Option<Value>,
    /// 操作者
    pub performed_by: Option<Value>,
}

impl Validate for UpdateUserWithAuditPayload {
    type Output = (UserChanges, String);

    fn validate(self) -> Result<(UserChanges, String), Vec<FieldViolation>> {
        let mut v = Violations::default();
        let email = v.optional_email("email", self.email);
        let name = v.optional_string("name", self.name);
        let performed_by = v.required_string("performedBy", self.performed_by);
        v.finish(|| (UserChanges { email, name }, performed_by.unwrap_or_default()))
    }
}

/// POST /users/search/filter
#[derive(Debug, Default, Deserialize)]
pub struct FilterUsersPayload {
    /// 表示名の部分文字列
    pub name: Option<Value>,
    /// メールアドレスの部分文字列
    pub email: Option<Value>,
}

impl Validate for FilterUsersPayload {
    type Output = UserFilter;

    fn validate(self) -> Result<UserFilter, Vec<FieldViolation>> {
        let mut v = Violations::default();
        let name = v.filter_string("name", self.name);
        let email = v.filter_string("email", self.email);
        v.finish(|| UserFilter { name, email })
    }
}
