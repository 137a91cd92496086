//! User repository (数据库访问层)

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, StoreHealth, DUPLICATE_USER};
use crate::{
    error::AppError,
    models::user::{NewUser, User, UserPatch, UserResponse},
};

const PROFILE_COLUMNS: &str = "id, username, email, full_name, avatar, cover_image, watch_history, created_at, updated_at";

pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgUserRepository {
    /// 根据用户名或邮箱查找用户
    async fn find_by_identity_or_contact(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        if username.is_none() && email.is_none() {
            return Ok(None);
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NOT NULL AND username = $1)
               OR ($2::text IS NOT NULL AND email = $2)
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 根据 ID 查找用户
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// 根据 ID 查找用户（不含密码哈希与刷新令牌）
    async fn find_profile_by_id(&self, id: &Uuid) -> Result<Option<UserResponse>, AppError> {
        let profile = sqlx::query_as::<_, UserResponse>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(profile)
    }

    /// 创建用户
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, full_name, avatar, cover_image, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar)
        .bind(&user.cover_image)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            // 先查后插存在竞态，由唯一约束兜底
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::conflict(DUPLICATE_USER)
            }
            _ => AppError::Database(e),
        })?;

        Ok(created)
    }

    /// 更新字段
    async fn update_fields(&self, id: &Uuid, patch: UserPatch) -> Result<Option<User>, AppError> {
        let touch_slot = patch.refresh_token_hash.is_some();

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                password_hash = COALESCE($2, password_hash),
                refresh_token_hash = CASE WHEN $3 THEN $4 ELSE refresh_token_hash END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.password_hash)
        .bind(touch_slot)
        .bind(patch.refresh_token_hash.flatten())
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 条件更新会话槽（比较并交换）
    async fn swap_refresh_token(
        &self,
        id: &Uuid,
        expected: &str,
        new: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $3, updated_at = NOW()
            WHERE id = $1 AND refresh_token_hash = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(new)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 探测 users 表可读；错误细节只进日志
    async fn health_check(&self) -> StoreHealth {
        match sqlx::query("SELECT 1 FROM users LIMIT 1")
            .fetch_optional(&self.db)
            .await
        {
            Ok(_) => StoreHealth::Healthy,
            Err(e) => {
                tracing::warn!(error = %e, "Credential store health check failed");
                StoreHealth::Unhealthy(health_reason(&e).to_string())
            }
        }
    }
}

fn health_reason(e: &sqlx::Error) -> &'static str {
    match e {
        sqlx::Error::PoolTimedOut => "connection pool exhausted",
        sqlx::Error::PoolClosed => "connection pool closed",
        sqlx::Error::Database(_) => "users table unavailable",
        _ => "credential store unreachable",
    }
}
