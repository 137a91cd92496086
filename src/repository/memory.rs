//! In-memory credential store
//!
//! Same uniqueness and compare-and-swap semantics as the Postgres store, kept
//! under one lock. Used by the `memory` backend and by tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, StoreHealth, DUPLICATE_USER};
use crate::{
    error::AppError,
    models::user::{NewUser, User, UserPatch, UserResponse},
};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user outright (account deletion lives outside the core)
    pub async fn remove(&self, id: &Uuid) -> bool {
        self.users.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryUserRepository {
    async fn find_by_identity_or_contact(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;

        Ok(users
            .values()
            .find(|u| {
                username.is_some_and(|name| u.username == name)
                    || email.is_some_and(|mail| u.email == mail)
            })
            .cloned())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_profile_by_id(&self, id: &Uuid) -> Result<Option<UserResponse>, AppError> {
        Ok(self.users.read().await.get(id).cloned().map(UserResponse::from))
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;

        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::conflict(DUPLICATE_USER));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: Some(user.avatar),
            cover_image: user.cover_image,
            watch_history: Vec::new(),
            password_hash: user.password_hash,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };

        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_fields(&self, id: &Uuid, patch: UserPatch) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;

        let Some(user) = users.get_mut(id) else {
            return Ok(None);
        };

        if let Some(hash) = patch.password_hash {
            user.password_hash = hash;
        }
        if let Some(slot) = patch.refresh_token_hash {
            user.refresh_token_hash = slot;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn swap_refresh_token(
        &self,
        id: &Uuid,
        expected: &str,
        new: &str,
    ) -> Result<bool, AppError> {
        let mut users = self.users.write().await;

        match users.get_mut(id) {
            Some(user) if user.refresh_token_hash.as_deref() == Some(expected) => {
                user.refresh_token_hash = Some(new.to_string());
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn health_check(&self) -> StoreHealth {
        StoreHealth::Healthy
    }
}
