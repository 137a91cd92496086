//! JWT 认证中间件
//!
//! 令牌先从 `accessToken` cookie 读取，缺失时再读 `Authorization: Bearer`。

use crate::{
    auth::cookie::{extract_cookie, ACCESS_TOKEN_COOKIE},
    error::{AppError, AuthFailure},
    middleware::AppState,
    models::user::UserResponse,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: UserResponse,
}

impl AuthContext {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthenticated(AuthFailure::MissingToken))
    }
}

/// 从 Authorization 头提取 Bearer 令牌
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// 提取访问令牌：cookie 优先，其次 Bearer
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    extract_cookie(headers, ACCESS_TOKEN_COOKIE).or_else(|| extract_bearer_token(headers))
}

/// 解析访问令牌并加载当前用户
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, AppError> {
    let token = extract_access_token(headers).ok_or(AuthFailure::MissingToken)?;

    let claims = state
        .jwt_service
        .validate_access_token(&token)
        .map_err(AuthFailure::from)?;
    let user_id = claims.user_id().map_err(AuthFailure::from)?;

    let user = state
        .store
        .find_profile_by_id(&user_id)
        .await?
        .ok_or(AuthFailure::PrincipalGone)?;

    Ok(AuthContext { user })
}

/// JWT 认证中间件 - 必须认证
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_context = authenticate(&state, req.headers()).await.map_err(|e| {
        if let AppError::Unauthenticated(reason) = &e {
            tracing::debug!(reason = reason.as_str(), "Request authentication failed");
        }
        e
    })?;

    // 附加到请求扩展
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
