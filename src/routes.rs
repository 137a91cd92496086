//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

use crate::{auth::middleware::jwt_auth_middleware, handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/api/v1/healthcheck", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 认证路由（无需访问令牌）
    let auth_routes = Router::new()
        .route("/api/v1/users/register", post(handlers::auth::register))
        .route("/api/v1/users/login", post(handlers::auth::login))
        .route(
            "/api/v1/users/refresh-token",
            post(handlers::auth::refresh_token),
        );

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/api/v1/users/logout", post(handlers::auth::logout))
        .route(
            "/api/v1/users/change-password",
            post(handlers::auth::change_password),
        )
        .route(
            "/api/v1/users/current-user",
            get(handlers::auth::get_current_user),
        )
        // route_layer：只守护以上路由，不影响合并后的 404 回退
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    let router = Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .layer(RequestBodyLimitLayer::new(state.config.server.body_limit_bytes));

    let router = match cors_layer(state.config.server.cors_origin.as_deref()) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router
        .layer(axum::middleware::from_fn(
            crate::middleware::request_tracking_middleware,
        ))
        .with_state(state)
}

/// 跨域配置：cookie 需要携带凭据，因此只允许单个明确的来源
fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin.map(str::trim).filter(|o| !o.is_empty())?;

    let origin = match HeaderValue::from_str(origin) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(origin = %origin, "Ignoring invalid CORS origin: {}", e);
            return None;
        }
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
    )
}
