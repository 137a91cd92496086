//! User domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// User account as stored, including the secret columns.
///
/// Never serialized; every outward shape goes through [`UserResponse`].
#[derive(Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub watch_history: Vec<Uuid>,

    // Credentials
    pub password_hash: String,
    /// SHA-256 digest of the one outstanding refresh token (the session slot)
    pub refresh_token_hash: Option<String>,

    // Metadata
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_session(&self) -> bool {
        self.refresh_token_hash.is_some()
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("has_session", &self.has_session())
            .finish_non_exhaustive()
    }
}

/// User response (without sensitive data)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub watch_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar,
            cover_image: user.cover_image,
            watch_history: user.watch_history,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Fields needed to create a user record
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub password_hash: String,
}

/// Partial update; `None` leaves a column untouched.
///
/// `refresh_token_hash` is doubly optional: `Some(None)` clears the session slot.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub password_hash: Option<String>,
    pub refresh_token_hash: Option<Option<String>>,
}

impl UserPatch {
    pub fn password(hash: String) -> Self {
        Self {
            password_hash: Some(hash),
            ..Default::default()
        }
    }

    pub fn refresh_token(hash: Option<String>) -> Self {
        Self {
            refresh_token_hash: Some(hash),
            ..Default::default()
        }
    }
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default, alias = "fullName")]
    pub full_name: String,
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Reference returned by the media upload service (required)
    #[serde(default)]
    #[validate(url(message = "avatar must be a URL"))]
    pub avatar: String,
    #[serde(default, alias = "coverImage")]
    #[validate(url(message = "cover_image must be a URL"))]
    pub cover_image: Option<String>,
}

/// Change password request
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default, alias = "oldPassword")]
    pub old_password: String,
    #[serde(default, alias = "newPassword")]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            full_name: "Alice".to_string(),
            avatar: None,
            cover_image: None,
            watch_history: vec![],
            password_hash: "$argon2id$v=19$secret".to_string(),
            refresh_token_hash: Some("deadbeef".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_response_strips_secrets() {
        let json = serde_json::to_string(&UserResponse::from(sample_user())).unwrap();
        assert!(json.contains("alice@x.com"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("deadbeef"));
        assert!(!json.contains("password"));
        assert!(!json.contains("refresh"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", sample_user());
        assert!(!debug.contains("argon2"));
        assert!(!debug.contains("deadbeef"));
    }

    #[test]
    fn test_register_request_email_validation() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "fullName": "Alice",
            "email": "not-an-email",
            "username": "alice",
            "password": "S1"
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "full_name": "Alice",
            "email": "alice@x.com",
            "username": "alice",
            "password": "S1",
            "avatar": "https://cdn.example.com/a.png"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }
}
