//! Authentication-related models

use serde::{Deserialize, Serialize};

use super::user::UserResponse;

/// Login request; either identifier may be used
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    #[serde(skip)]
    pub refresh_expires_in: u64,
}

/// Token refresh request (body fallback when no cookie is sent)
#[derive(Debug, Default, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
}
