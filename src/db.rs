//! 凭据存储后端装配
//! `memory` 后端用进程内用户表，`postgres` 后端建立连接池并在启动时迁移 users 表

use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::DatabaseConfig,
    error::AppError,
    repository::{CredentialStore, InMemoryUserRepository, PgUserRepository},
};

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    /// 大小写不敏感；未知名称返回 None
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(StoreBackend::Postgres),
            "memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

/// 按配置打开凭据存储
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn CredentialStore>, AppError> {
    let backend = StoreBackend::parse(&config.backend).ok_or_else(|| {
        AppError::Config(format!("Invalid database backend: {}", config.backend))
    })?;

    match backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory credential store; users and sessions are lost on restart");
            Ok(Arc::new(InMemoryUserRepository::new()))
        }
        StoreBackend::Postgres => {
            let pool = connect_pool(config).await?;
            migrate(&pool).await?;
            Ok(Arc::new(PgUserRepository::new(pool)))
        }
    }
}

/// 创建 PostgreSQL 连接池
///
/// 每次登录、刷新和鉴权都会访问 users 表，取连接前先探活，避免把失效连接
/// 的错误当成认证失败返回给客户端。
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(config.url.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Credential store connection failed");
            AppError::Database(e)
        })?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Credential store pool ready"
    );

    Ok(pool)
}

/// 执行 users 表迁移
pub async fn migrate(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        tracing::error!(error = %e, "Users schema migration failed");
        AppError::Internal(format!("users schema migration failed: {}", e))
    })?;

    tracing::info!("Users schema up to date");
    Ok(())
}
