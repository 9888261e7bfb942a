// src/auth/token.rs
//! Access tokens as issued by the backend's credential service: HS256 JWTs
//! with audience `authenticated` and the user id as subject.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BackendError, BackendResult};

pub const TOKEN_AUDIENCE: &str = "authenticated";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: String,
    /// Database role of the bearer, `authenticated` for signed-in users.
    pub role: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct TokenVerifier {
    secret: String,
    ttl_seconds: i64,
}

impl TokenVerifier {
    pub fn new(secret: impl Into<String>, ttl_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Signs a token the same way the hosted credential service does.
    pub fn issue(&self, user_id: Uuid, email: &str) -> BackendResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role: TOKEN_AUDIENCE.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            exp: now + self.ttl_seconds,
            iat: now,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| BackendError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> BackendResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[TOKEN_AUDIENCE]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| BackendError::Unauthorized(format!("Invalid access token: {}", e)))
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}
