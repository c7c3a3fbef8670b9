//! Password hashing and bearer token service.

use anyhow::{Context, Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, User};

/// Well-formed Argon2id hash with default parameters that matches no password.
/// Verified against when a login email is unknown so both failure paths cost
/// the same.
pub const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Bearer token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Signed token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authentication service trait for credential and token operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Hash a password for storage.
    async fn hash_password(&self, password: &str) -> Result<String>;

    /// Check a password against a stored hash. Malformed hashes never match.
    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool>;

    /// Sign a bearer token for a user.
    fn issue_token(&self, user: &User) -> Result<IssuedToken>;

    /// Validate a bearer token and return its claims.
    fn verify_token(&self, token: &str) -> Result<Claims>;
}

/// Argon2id + HS256 JWT implementation of AuthService.
pub struct JwtAuthService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDelta,
}

impl JwtAuthService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: TimeDelta::hours(ttl_hours),
        }
    }
}

#[async_trait]
impl AuthService for JwtAuthService {
    async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| anyhow!("Failed to hash password: {}", e))
        })
        .await
        .context("Password hash task panicked")?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || {
            let Ok(parsed) = PasswordHash::new(&hash) else {
                tracing::warn!("Stored password hash is malformed");
                return false;
            };
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .await
        .context("Password verify task panicked")
    }

    fn issue_token(&self, user: &User) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .context("Failed to encode token")?;

        Ok(IssuedToken { token, expires_at })
    }

    fn verify_token(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| {
                tracing::debug!("Token validation failed: {}", e);
                anyhow!("invalid token: {}", e)
            })?;
        Ok(data.claims)
    }
}
