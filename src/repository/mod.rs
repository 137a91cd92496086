//! Credential store layer
//!
//! The session manager only talks to [`CredentialStore`]; Postgres and in-memory
//! implementations live beside it.

pub mod memory;
pub mod user_repo;

pub use memory::InMemoryUserRepository;
pub use user_repo::PgUserRepository;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::user::{NewUser, User, UserPatch, UserResponse},
};

/// Persistent principal records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look a user up by username, email, or either. Both `None` finds nothing.
    async fn find_by_identity_or_contact(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError>;

    /// Full record, secret columns included
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError>;

    /// Masked read: never loads the password hash or the session slot
    async fn find_profile_by_id(&self, id: &Uuid) -> Result<Option<UserResponse>, AppError>;

    /// Insert a new user. Duplicate username/email yields `AppError::Conflict`.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    async fn update_fields(&self, id: &Uuid, patch: UserPatch) -> Result<Option<User>, AppError>;

    /// Set the session slot to `new` only if it currently holds `expected`.
    ///
    /// Returns `false` when the slot no longer matches.
    async fn swap_refresh_token(
        &self,
        id: &Uuid,
        expected: &str,
        new: &str,
    ) -> Result<bool, AppError>;

    async fn health_check(&self) -> StoreHealth;
}

/// Readiness of a credential store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreHealth {
    Healthy,
    /// Short, client-safe reason
    Unhealthy(String),
}

impl StoreHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, StoreHealth::Healthy)
    }
}

/// Digest stored in the session slot instead of the raw refresh token
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub(crate) const DUPLICATE_USER: &str = "User with this email or username already exists";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_health() {
        assert!(StoreHealth::Healthy.is_healthy());
        assert!(!StoreHealth::Unhealthy("users table unavailable".to_string()).is_healthy());
    }

    #[test]
    fn test_hash_token_is_stable_and_distinct() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_eq!(hash_token("abc").len(), 64);
    }
}
