//! Web API 层
//!
//! 薄适配层：把 HTTP 请求翻译为应用层服务调用并序列化结果，
//! 不包含任何业务逻辑。公共路由挂在 /api 下，管理路由挂在
//! /api/admin 下并要求 Bearer 令牌。

pub mod admin_routes;
pub mod error;
pub mod routes;
pub mod state;

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorBody};
pub use state::{AppState, AppStateConfig};

/// 组装完整路由
pub fn router(state: AppState) -> Router {
    let admin = admin_routes::admin_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        admin_routes::require_admin,
    ));

    Router::new()
        .nest("/api", routes::public_routes())
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
