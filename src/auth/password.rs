// src/auth/password.rs
//! Credential storage for the local backend: Argon2id hashes in PHC format.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::{BackendError, BackendResult};

/// Shortest password the sign-up form accepts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn hash_password(password: &str) -> BackendResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| BackendError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> BackendResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| BackendError::Internal(format!("Stored password hash is invalid: {}", e)))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(BackendError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

pub fn validate_password_strength(password: &str) -> BackendResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(BackendError::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
