//! 统一错误模型
//! 定义所有错误类型和错误响应格式

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::jwt::TokenError;

/// 未认证的内部原因
///
/// 仅用于日志与指标，客户端看到的始终是同一条消息。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("token missing")]
    MissingToken,

    #[error("token rejected: {0}")]
    InvalidToken(TokenError),

    /// 刷新令牌签名有效，但已不是会话槽中的那一个（轮换后被重放）
    #[error("refresh token reused after rotation")]
    TokenReused,

    /// 并发刷新时条件更新落败
    #[error("refresh token rotated concurrently")]
    RotationConflict,

    /// 令牌签发后用户已不存在
    #[error("principal no longer exists")]
    PrincipalGone,
}

impl AuthFailure {
    /// 指标标签
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::InvalidToken(TokenError::Expired) => "expired",
            AuthFailure::InvalidToken(TokenError::Malformed) => "malformed",
            AuthFailure::InvalidToken(TokenError::SignatureInvalid) => "signature_invalid",
            AuthFailure::InvalidToken(TokenError::WrongKind) => "wrong_kind",
            AuthFailure::TokenReused => "token_reused",
            AuthFailure::RotationConflict => "rotation_conflict",
            AuthFailure::PrincipalGone => "principal_gone",
        }
    }
}

impl From<TokenError> for AuthFailure {
    fn from(e: TokenError) -> Self {
        AuthFailure::InvalidToken(e)
    }
}

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// 凭据错误（密码不正确）
    #[error("Invalid credentials")]
    Unauthorized,

    /// 缺失、过期、伪造或被重放的令牌
    #[error("Unauthenticated: {0}")]
    Unauthenticated(AuthFailure),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized | AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Unauthorized => "Invalid credentials".to_string(),
            AppError::Unauthenticated(_) => "Authentication required".to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    /// 是否属于服务端故障（5xx）
    pub fn is_fatal(&self) -> bool {
        self.status_code().is_server_error()
    }

    // 便捷方法
    pub fn validation(msg: &str) -> Self {
        AppError::Validation(msg.to_string())
    }

    pub fn conflict(msg: &str) -> Self {
        AppError::Conflict(msg.to_string())
    }

    pub fn not_found(msg: &str) -> Self {
        AppError::NotFound(msg.to_string())
    }
}

impl From<AuthFailure> for AppError {
    fn from(reason: AuthFailure) -> Self {
        AppError::Unauthenticated(reason)
    }
}

/// 错误响应 DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
    pub request_id: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = crate::middleware::current_request_id()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                message: self.user_message(),
                request_id,
            },
        };

        // 记录错误日志（内部原因只进日志）
        if self.is_fatal() {
            tracing::error!(
                code = self.code(),
                message = %self,
                request_id = %error_response.error.request_id,
                "Application error"
            );
        } else {
            tracing::warn!(
                code = self.code(),
                message = %self,
                request_id = %error_response.error.request_id,
                "Request rejected"
            );
        }

        (status, Json(error_response)).into_response()
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}
