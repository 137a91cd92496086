//! 认证相关的 HTTP 处理器

use crate::{
    auth::{
        cookie::{extract_cookie, REFRESH_TOKEN_COOKIE},
        jwt::TokenPair,
        middleware::AuthContext,
    },
    error::AppError,
    middleware::AppState,
    models::{
        auth::{LoginRequest, LoginResponse, RefreshTokenRequest},
        response::ApiResponse,
        user::{ChangePasswordRequest, RegisterRequest, UserResponse},
    },
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = state.auth_service.register(req).await?;

    Ok(ApiResponse::created(user, "User registered successfully"))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<(HeaderMap, ApiResponse<LoginResponse>), AppError> {
    let response = state.auth_service.login(req).await?;

    let mut headers = HeaderMap::new();
    state.cookie_policy.set_session_cookies(
        &mut headers,
        &response.access_token,
        response.expires_in,
        &response.refresh_token,
        response.refresh_expires_in,
    );

    Ok((headers, ApiResponse::ok(response, "User logged in successfully")))
}

/// 刷新令牌
///
/// 优先读 `refreshToken` cookie，没有时才解析请求体（JSON 或表单）。
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(HeaderMap, ApiResponse<TokenPair>), AppError> {
    let incoming = match extract_cookie(&headers, REFRESH_TOKEN_COOKIE) {
        Some(token) => Some(token),
        None => {
            let content_type = headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            parse_refresh_body(content_type, &body)?.refresh_token
        }
    };

    let token_pair = state.auth_service.refresh_token(incoming.as_deref()).await?;

    let mut response_headers = HeaderMap::new();
    state.cookie_policy.set_session_cookies(
        &mut response_headers,
        &token_pair.access_token,
        token_pair.expires_in,
        &token_pair.refresh_token,
        token_pair.refresh_expires_in,
    );

    Ok((
        response_headers,
        ApiResponse::ok(token_pair, "Access token refreshed"),
    ))
}

/// 登出
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<(HeaderMap, ApiResponse<Value>), AppError> {
    state.auth_service.logout(&auth_context.user_id()).await?;

    let mut headers = HeaderMap::new();
    state.cookie_policy.clear_session_cookies(&mut headers);

    Ok((headers, ApiResponse::ok(json!({}), "User logged out")))
}

/// 修改密码
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<Value>, AppError> {
    state
        .auth_service
        .change_password(&auth_context.user_id(), req)
        .await?;

    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

/// 获取当前用户信息
pub async fn get_current_user(auth_context: AuthContext) -> ApiResponse<UserResponse> {
    ApiResponse::ok(auth_context.user, "Current user fetched successfully")
}

/// 空请求体视为未提供令牌
fn parse_refresh_body(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<RefreshTokenRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RefreshTokenRequest::default());
    }

    let is_form = content_type.is_some_and(|ct| {
        ct.trim_start()
            .to_ascii_lowercase()
            .starts_with("application/x-www-form-urlencoded")
    });
    if is_form {
        let refresh_token = url::form_urlencoded::parse(body)
            .find(|(key, _)| key == "refreshToken" || key == "refresh_token")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty());
        return Ok(RefreshTokenRequest { refresh_token });
    }

    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Invalid refresh request body: {}", e);
        AppError::validation("Invalid request body")
    })
}
