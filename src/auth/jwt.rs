//! JWT token generation and validation
//! Implements access token + refresh token pattern with one signing secret per kind

use crate::{config::AppConfig, error::AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Which class of token is being minted or checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Why a token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token malformed")]
    Malformed,

    #[error("token signature invalid")]
    SignatureInvalid,

    #[error("token kind mismatch")]
    WrongKind,
}

/// JWT claims shared by both token kinds
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Token type (access or refresh)
    pub typ: TokenKind,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID, keeps two tokens minted in the same second distinct
    pub jti: String,
}

impl Claims {
    /// Principal id carried by the token
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Malformed)
    }
}

/// Token pair response
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64, // seconds until access token expires
    pub refresh_expires_in: u64,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// JWT service
pub struct JwtService {
    access_keys: KeyPair,
    refresh_keys: KeyPair,
    access_token_exp_secs: u64,
    refresh_token_exp_secs: u64,
    validation: Validation,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let access_secret = config.security.access_token_secret.expose_secret();
        let refresh_secret = config.security.refresh_token_secret.expose_secret();

        // Ensure secrets are at least 32 bytes for HS256
        if access_secret.len() < 32 || refresh_secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        // A shared secret would let an access token pass as a refresh token
        if access_secret == refresh_secret {
            return Err(AppError::Config(
                "Access and refresh token secrets must differ".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Ok(Self {
            access_keys: KeyPair::from_secret(access_secret),
            refresh_keys: KeyPair::from_secret(refresh_secret),
            access_token_exp_secs: config.security.access_token_exp_secs,
            refresh_token_exp_secs: config.security.refresh_token_exp_secs,
            validation,
        })
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access_keys,
            TokenKind::Refresh => &self.refresh_keys,
        }
    }

    /// Configured lifetime of a token kind
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        let secs = match kind {
            TokenKind::Access => self.access_token_exp_secs,
            TokenKind::Refresh => self.refresh_token_exp_secs,
        };
        Duration::seconds(secs as i64)
    }

    /// Sign a token of the given kind for a principal
    pub fn issue(&self, kind: TokenKind, user_id: &Uuid, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            typ: kind,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.keys(kind).encoding).map_err(|e| {
            tracing::error!(kind = kind.as_str(), "Failed to encode token: {:?}", e);
            AppError::Internal(format!("Failed to encode {} token", kind.as_str()))
        })
    }

    /// Generate access token
    pub fn generate_access_token(&self, user_id: &Uuid) -> Result<String, AppError> {
        self.issue(TokenKind::Access, user_id, self.ttl(TokenKind::Access))
    }

    /// Generate refresh token
    pub fn generate_refresh_token(&self, user_id: &Uuid) -> Result<String, AppError> {
        self.issue(TokenKind::Refresh, user_id, self.ttl(TokenKind::Refresh))
    }

    /// Generate token pair
    pub fn generate_token_pair(&self, user_id: &Uuid) -> Result<TokenPair, AppError> {
        let access_token = self.generate_access_token(user_id)?;
        let refresh_token = self.generate_refresh_token(user_id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_token_exp_secs,
            refresh_expires_in: self.refresh_token_exp_secs,
        })
    }

    /// Check signature, expiry and kind of a token
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(kind = kind.as_str(), "Token validation failed: {:?}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                    _ => TokenError::Malformed,
                }
            })?
            .claims;

        if claims.typ != kind {
            tracing::debug!(
                "Token type mismatch: expected '{}', got '{}'",
                kind.as_str(),
                claims.typ.as_str()
            );
            return Err(TokenError::WrongKind);
        }

        Ok(claims)
    }

    /// Validate access token specifically
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, TokenKind::Access)
    }

    /// Validate refresh token specifically
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, TokenKind::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CookieConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig,
    };
    use secrecy::Secret;

    fn test_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                addr: "127.0.0.1:8000".to_string(),
                graceful_shutdown_timeout_secs: 30,
                body_limit_bytes: 32 * 1024,
                cors_origin: None,
            },
            database: DatabaseConfig {
                backend: "memory".to_string(),
                url: Secret::new(String::new()),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_secs: 30,
                idle_timeout_secs: 600,
                max_lifetime_secs: 1800,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
            security: SecurityConfig {
                access_token_secret: Secret::new("access_secret_key_32_characters_long!".to_string()),
                access_token_exp_secs: 900,
                refresh_token_secret: Secret::new(
                    "refresh_secret_key_32_characters_long!".to_string(),
                ),
                refresh_token_exp_secs: 604800,
                argon2_memory_kib: 1024,
                argon2_iterations: 1,
                argon2_parallelism: 1,
            },
            cookie: CookieConfig {
                secure: true,
                same_site: "strict".to_string(),
            },
        }
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let service = JwtService::from_config(&test_config()).unwrap();
        let user_id = Uuid::new_v4();

        let token = service.generate_access_token(&user_id).unwrap();

        let claims = service.validate_access_token(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.typ, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_generate_and_validate_refresh_token() {
        let service = JwtService::from_config(&test_config()).unwrap();
        let user_id = Uuid::new_v4();

        let token = service.generate_refresh_token(&user_id).unwrap();

        let claims = service.validate_refresh_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.typ, TokenKind::Refresh);
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let service = JwtService::from_config(&test_config()).unwrap();
        let user_id = Uuid::new_v4();

        let access_token = service.generate_access_token(&user_id).unwrap();
        assert_eq!(
            service.validate_refresh_token(&access_token).unwrap_err(),
            TokenError::SignatureInvalid
        );

        let refresh_token = service.generate_refresh_token(&user_id).unwrap();
        assert_eq!(
            service.validate_access_token(&refresh_token).unwrap_err(),
            TokenError::SignatureInvalid
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::from_config(&test_config()).unwrap();
        let token = service
            .issue(TokenKind::Access, &Uuid::new_v4(), Duration::seconds(-30))
            .unwrap();

        assert_eq!(service.validate_access_token(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_invalid_token_fails() {
        let service = JwtService::from_config(&test_config()).unwrap();
        assert_eq!(service.validate_access_token("invalid_token").unwrap_err(), TokenError::Malformed);
        assert_eq!(service.validate_refresh_token("").unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn test_pair_tokens_are_unique() {
        let service = JwtService::from_config(&test_config()).unwrap();
        let user_id = Uuid::new_v4();

        let first = service.generate_token_pair(&user_id).unwrap();
        let second = service.generate_token_pair(&user_id).unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
        assert_ne!(first.access_token, second.access_token);
    }

    #[test]
    fn test_shared_secret_rejected() {
        let mut config = test_config();
        config.security.refresh_token_secret = config.security.access_token_secret.clone();
        assert!(JwtService::from_config(&config).is_err());
    }
}
