//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use crate::db::StoreBackend;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:8000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
    /// 请求体大小上限（字节）
    pub body_limit_bytes: usize,
    /// 允许跨域的前端地址（可选，启用时携带凭据）
    #[serde(default)]
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 存储后端: postgres, memory
    pub backend: String,
    /// 数据库连接 URL（使用 Secret 包装，防止日志泄露）
    pub url: Secret<String>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout_secs: u64,
    /// 连接最大生命周期（秒）
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// 访问令牌签名密钥
    pub access_token_secret: Secret<String>,
    /// 访问令牌过期时间（秒）
    pub access_token_exp_secs: u64,
    /// 刷新令牌签名密钥（必须与访问令牌密钥不同）
    pub refresh_token_secret: Secret<String>,
    /// 刷新令牌过期时间（秒）
    pub refresh_token_exp_secs: u64,
    /// Argon2 内存开销（KiB）
    pub argon2_memory_kib: u32,
    /// Argon2 迭代次数
    pub argon2_iterations: u32,
    /// Argon2 并行度
    pub argon2_parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    /// 是否只在 HTTPS 下发送（本地开发可关闭）
    pub secure: bool,
    /// SameSite 策略: strict, lax, none
    pub same_site: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub cookie: CookieConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置（签名密钥没有默认值，必须显式提供）
        settings = settings
            .set_default("server.addr", "0.0.0.0:8000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("server.body_limit_bytes", 32 * 1024)?
            .set_default("database.backend", "postgres")?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.access_token_exp_secs", 900)?
            .set_default("security.refresh_token_exp_secs", 864000)?
            .set_default("security.argon2_memory_kib", 65536)?
            .set_default("security.argon2_iterations", 3)?
            .set_default("security.argon2_parallelism", 4)?
            .set_default("cookie.secure", true)?
            .set_default("cookie.same_site", "strict")?;

        // 从环境变量加载配置（前缀为 VIDTUBE_）
        settings = settings.add_source(
            Environment::with_prefix("VIDTUBE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证存储后端
        match StoreBackend::parse(&self.database.backend) {
            Some(StoreBackend::Postgres) => {
                if self.database.url.expose_secret().is_empty() {
                    return Err(ConfigError::Message(
                        "database.url is required for the postgres backend".to_string(),
                    ));
                }
            }
            Some(StoreBackend::Memory) => {}
            None => {
                return Err(ConfigError::Message(format!(
                    "Invalid database backend: {}. Must be one of: postgres, memory",
                    self.database.backend
                )))
            }
        }

        // 验证数据库连接池配置
        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        // 验证签名密钥长度（至少 32 字符）且两个密钥互不相同
        let access_secret = self.security.access_token_secret.expose_secret();
        let refresh_secret = self.security.refresh_token_secret.expose_secret();

        if access_secret.len() < 32 || refresh_secret.len() < 32 {
            return Err(ConfigError::Message(
                "Token secrets must be at least 32 characters long".to_string(),
            ));
        }

        if access_secret == refresh_secret {
            return Err(ConfigError::Message(
                "access_token_secret and refresh_token_secret must differ".to_string(),
            ));
        }

        // 验证令牌过期时间
        if self.security.access_token_exp_secs < 60 || self.security.access_token_exp_secs > 86400 {
            return Err(ConfigError::Message(
                "access_token_exp_secs must be between 60 and 86400 (1 minute to 24 hours)"
                    .to_string(),
            ));
        }

        if self.security.refresh_token_exp_secs < 3600
            || self.security.refresh_token_exp_secs > 2592000
        {
            return Err(ConfigError::Message(
                "refresh_token_exp_secs must be between 3600 and 2592000 (1 hour to 30 days)"
                    .to_string(),
            ));
        }

        if self.security.refresh_token_exp_secs <= self.security.access_token_exp_secs {
            return Err(ConfigError::Message(
                "refresh_token_exp_secs must be greater than access_token_exp_secs".to_string(),
            ));
        }

        // 验证 Cookie 策略
        match self.cookie.same_site.to_lowercase().as_str() {
            "strict" | "lax" => {}
            "none" => {
                // 浏览器拒绝 SameSite=None 且无 Secure 的 Cookie
                if !self.cookie.secure {
                    return Err(ConfigError::Message(
                        "cookie.same_site=none requires cookie.secure=true".to_string(),
                    ));
                }
            }
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid cookie same_site: {}. Must be one of: strict, lax, none",
                    self.cookie.same_site
                )))
            }
        }

        Ok(())
    }
}
