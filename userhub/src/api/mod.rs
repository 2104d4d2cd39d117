//! REST APIハンドラー
//!
//! ルーティングと共通レイヤー（CORS、トレース、パニック捕捉、エラーエンベロープ）

/// エラーレスポンス
pub mod error;

/// ユーザー管理API
pub mod users;

/// リクエストペイロードの検証
pub mod validation;

use std::any::Any;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Environment;
use crate::AppState;

/// APIルーターを作成
pub fn create_app(state: AppState) -> Router {
    let environment = state.config.environment;
    with_common_layers(user_routes(), environment).with_state(state)
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/search/count", get(users::count_users))
        .route("/users/search/filter", post(users::filter_users))
        .route("/users/with-audit", post(users::create_user_with_audit))
        .route(
            "/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/:id/with-audit", patch(users::update_user_with_audit))
        .route("/users/:id/audit-logs", get(users::list_audit_logs))
}

/// フォールバック、パニック捕捉、エラーエンベロープ、トレース、CORSを適用する
///
/// エンベロープはパニック捕捉より外側に置き、500レスポンスにも付与されるようにする。
fn with_common_layers<S>(router: Router<S>, environment: Environment) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .fallback(error::route_not_found)
        .layer(CatchPanicLayer::custom(
            move |err: Box<dyn Any + Send + 'static>| error::panic_response(environment, err),
        ))
        .layer(middleware::from_fn(error::error_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin),
        )
}
