//! 认证服务：注册、登录、登出、令牌刷新、修改密码
//!
//! 所有会话状态都在存储层的单一会话槽里，服务本身不持有可变状态。

use std::sync::Arc;

use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    auth::{
        jwt::{JwtService, TokenPair},
        password::PasswordHasher,
    },
    error::{AppError, AuthFailure},
    models::{
        auth::{LoginRequest, LoginResponse},
        user::{ChangePasswordRequest, NewUser, RegisterRequest, UserPatch, UserResponse},
    },
    repository::{hash_token, CredentialStore, DUPLICATE_USER},
};

const USER_NOT_FOUND: &str = "User does not exist";
const AVATAR_REQUIRED: &str = "Please provide an avatar image!";

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    jwt_service: Arc<JwtService>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        jwt_service: Arc<JwtService>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            store,
            jwt_service,
            hasher,
        }
    }

    /// 用户注册
    pub async fn register(&self, mut req: RegisterRequest) -> Result<UserResponse, AppError> {
        req.full_name = req.full_name.trim().to_string();
        req.email = req.email.trim().to_string();
        req.username = req.username.trim().to_lowercase();
        req.avatar = req.avatar.trim().to_string();

        if [&req.full_name, &req.email, &req.username, &req.password]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(AppError::validation("Please fill in all fields"));
        }

        // 头像引用必填，封面可选
        if req.avatar.is_empty() {
            return Err(AppError::validation(AVATAR_REQUIRED));
        }

        req.validate().map_err(validation_error)?;

        // 先查重再创建；存储层的唯一约束兜底并发注册
        if self
            .store
            .find_by_identity_or_contact(Some(&req.username), Some(&req.email))
            .await?
            .is_some()
        {
            return Err(AppError::conflict(DUPLICATE_USER));
        }

        let password_hash = self.hasher.hash(&req.password)?;

        let user = self
            .store
            .create(NewUser {
                username: req.username,
                email: req.email,
                full_name: req.full_name,
                avatar: req.avatar,
                cover_image: req.cover_image,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(UserResponse::from(user))
    }

    /// 用户登录
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let username = req
            .username
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let email = req
            .email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        if username.is_none() && email.is_none() {
            return Err(AppError::validation("username or email is required"));
        }
        if req.password.is_empty() {
            return Err(AppError::validation("password is required"));
        }

        let user = match self
            .store
            .find_by_identity_or_contact(username.as_deref(), email)
            .await?
        {
            Some(user) => user,
            None => {
                metrics::counter!("auth_login_total", "outcome" => "not_found").increment(1);
                return Err(AppError::not_found(USER_NOT_FOUND));
            }
        };

        // 验证密码
        if !self.hasher.verify(&req.password, &user.password_hash) {
            metrics::counter!("auth_login_total", "outcome" => "invalid_credentials").increment(1);
            tracing::warn!(user_id = %user.id, "Login failed: invalid credentials");
            return Err(AppError::Unauthorized);
        }

        // 生成令牌，覆盖会话槽（旧刷新令牌随之失效）
        let token_pair = self.jwt_service.generate_token_pair(&user.id)?;

        let user = self
            .store
            .update_fields(
                &user.id,
                UserPatch::refresh_token(Some(hash_token(&token_pair.refresh_token))),
            )
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

        metrics::counter!("auth_login_total", "outcome" => "success").increment(1);
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            user: UserResponse::from(user),
            access_token: token_pair.access_token,
            refresh_token: token_pair.refresh_token,
            expires_in: token_pair.expires_in,
            refresh_expires_in: token_pair.refresh_expires_in,
        })
    }

    /// 刷新令牌
    ///
    /// 每次刷新既认证调用方，又让刚用过的刷新令牌失效。
    pub async fn refresh_token(&self, incoming: Option<&str>) -> Result<TokenPair, AppError> {
        let token = incoming
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| reject_refresh(AuthFailure::MissingToken))?;

        let claims = self
            .jwt_service
            .validate_refresh_token(token)
            .map_err(|e| reject_refresh(e.into()))?;
        let user_id = claims.user_id().map_err(|e| reject_refresh(e.into()))?;

        let user = self
            .store
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

        let presented = hash_token(token);
        if user.refresh_token_hash.as_deref() != Some(presented.as_str()) {
            // 签名有效但不在会话槽中：轮换后被重放，或已登出
            metrics::counter!("auth_refresh_token_reuse_total").increment(1);
            tracing::warn!(user_id = %user.id, "Refresh token reuse detected");
            return Err(reject_refresh(AuthFailure::TokenReused));
        }

        let token_pair = self.jwt_service.generate_token_pair(&user.id)?;

        let rotated = self
            .store
            .swap_refresh_token(&user.id, &presented, &hash_token(&token_pair.refresh_token))
            .await?;

        if !rotated {
            tracing::warn!(user_id = %user.id, "Concurrent refresh lost the rotation race");
            return Err(reject_refresh(AuthFailure::RotationConflict));
        }

        metrics::counter!("auth_refresh_total", "outcome" => "success").increment(1);
        tracing::info!(user_id = %user.id, "Refresh token rotated");

        Ok(token_pair)
    }

    /// 登出（清空会话槽，重复登出不报错）
    pub async fn logout(&self, user_id: &Uuid) -> Result<(), AppError> {
        self.store
            .update_fields(user_id, UserPatch::refresh_token(None))
            .await?;

        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// 修改密码
    ///
    /// 现有刷新令牌保持有效。
    pub async fn change_password(
        &self,
        user_id: &Uuid,
        req: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        if req.old_password.is_empty() || req.new_password.trim().is_empty() {
            return Err(AppError::validation("Old and new password are required"));
        }

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

        if !self.hasher.verify(&req.old_password, &user.password_hash) {
            tracing::warn!(user_id = %user_id, "Password change rejected: wrong current password");
            return Err(AppError::Unauthorized);
        }

        let new_password_hash = self.hasher.hash(&req.new_password)?;

        self.store
            .update_fields(user_id, UserPatch::password(new_password_hash))
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}

fn reject_refresh(reason: AuthFailure) -> AppError {
    metrics::counter!("auth_refresh_total", "outcome" => reason.as_str()).increment(1);
    AppError::Unauthenticated(reason)
}

/// 取第一条校验消息作为客户端提示
fn validation_error(errors: ValidationErrors) -> AppError {
    let message = errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid input".to_string());

    AppError::Validation(message)
}
