//! # pw-auth-simple
//!
//! Argon2 + HS256 JWT implementation of `AuthProvider`.
//! Handles password storage and stateless session tokens.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pw_core::error::{AppError, Result};
use pw_core::models::{Claims, User};
use pw_core::traits::AuthProvider;
use secrecy::{ExposeSecret, SecretString};

pub struct SimpleAuthProvider {
    /// HMAC key for session tokens
    jwt_secret: SecretString,
    token_ttl: Duration,
}

impl SimpleAuthProvider {
    /// Accepts the signing secret (e.g., from configuration) and token lifetime.
    pub fn new(jwt_secret: SecretString, token_ttl_hours: i64) -> Self {
        Self {
            jwt_secret,
            token_ttl: Duration::hours(token_ttl_hours),
        }
    }
}

impl AuthProvider for SimpleAuthProvider {
    /// Argon2id with a fresh random salt, encoded as a PHC string.
    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn issue_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            adm: user.is_admin,
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.expose_secret().as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    fn verify_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.expose_secret().as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            log::debug!("rejected session token: {e}");
            AppError::Unauthorized("invalid or expired token".into())
        })
    }
}
