//! 错误处理单元测试
//!
//! 测试应用错误类型的各种行为

use axum::{http::StatusCode, response::IntoResponse};
use http_body_util::BodyExt;
use vidtube::{
    auth::TokenError,
    error::{AppError, AuthFailure},
};

// ==================== 错误状态码测试 ====================

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        AppError::Unauthenticated(AuthFailure::TokenReused).status_code(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(AppError::NotFound("resource".to_string()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Validation("error".to_string()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::Conflict("dup".to_string()).status_code(), StatusCode::CONFLICT);
}

#[test]
fn test_fatal_errors_are_500() {
    for error in [
        AppError::Database(sqlx::Error::RowNotFound),
        AppError::Config("Invalid config".to_string()),
        AppError::Internal("Something went wrong".to_string()),
    ] {
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.is_fatal());
    }

    assert!(!AppError::Unauthorized.is_fatal());
}

// ==================== 用户消息测试 ====================

#[test]
fn test_user_messages_no_sensitive_info() {
    // 数据库错误不应该暴露技术细节
    let message = AppError::Database(sqlx::Error::RowNotFound).user_message();
    assert_eq!(message, "Database error occurred");
    assert!(!message.to_lowercase().contains("sqlx"));
    assert!(!message.to_lowercase().contains("row"));

    let message = AppError::Internal("secret stack trace".to_string()).user_message();
    assert!(!message.contains("secret"));
}

#[test]
fn test_auth_failure_reason_only_in_display() {
    let error = AppError::Unauthenticated(AuthFailure::InvalidToken(TokenError::Expired));

    // 内部原因进日志
    assert!(error.to_string().contains("expired"));
    // 客户端只看到统一消息
    assert_eq!(error.user_message(), "Authentication required");
}

#[test]
fn test_auth_failure_metric_labels() {
    assert_eq!(AuthFailure::MissingToken.as_str(), "missing_token");
    assert_eq!(AuthFailure::TokenReused.as_str(), "token_reused");
    assert_eq!(AuthFailure::RotationConflict.as_str(), "rotation_conflict");
    assert_eq!(
        AuthFailure::from(TokenError::WrongKind).as_str(),
        "wrong_kind"
    );
}

// ==================== 响应格式测试 ====================

#[tokio::test]
async fn test_error_response_body() {
    let response = AppError::Unauthenticated(AuthFailure::PrincipalGone).into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["error"]["code"], 401);
    assert_eq!(json["error"]["message"], "Authentication required");
    assert!(json["error"]["request_id"].is_string());
    assert!(!bytes.windows(9).any(|w| w == b"principal"));
}

#[tokio::test]
async fn test_conflict_response_body() {
    let response = AppError::conflict("User with this email or username already exists").into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["error"]["code"], 409);
    assert_eq!(
        json["error"]["message"],
        "User with this email or username already exists"
    );
}

#[test]
fn test_config_error_conversion() {
    let error: AppError = config::ConfigError::Message("bad".to_string()).into();
    assert!(matches!(error, AppError::Config(_)));
}
