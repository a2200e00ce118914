//! # Authentication
//!
//! Email/password and public-key identities. The TUI only sees the
//! [`AuthService`] trait; hashing and key normalization live here so any
//! backing store can share them.

use std::fmt;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::core::model::User;
use crate::core::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    UserNotFound,
    EmailTaken,
    KeyTaken,
    Store(StoreError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "invalid email or password"),
            AuthError::UserNotFound => write!(f, "user not found"),
            AuthError::EmailTaken => write!(f, "email already registered"),
            AuthError::KeyTaken => write!(f, "SSH key already registered"),
            AuthError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        AuthError::Store(e)
    }
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register_with_email(&self, email: &str, password: &str) -> Result<User, AuthError>;
    async fn login_with_email(&self, email: &str, password: &str) -> Result<User, AuthError>;
    async fn register_with_public_key(&self, key: &str) -> Result<User, AuthError>;
    async fn login_with_public_key(&self, key: &str) -> Result<User, AuthError>;
}

// ============================================================================
// Helpers
// ============================================================================

/// Canonical key text: `<type> <base64>`, comment and whitespace dropped.
pub fn normalize_public_key(key: &str) -> String {
    key.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
}

/// Lowercased, trimmed email used for lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `salt$sha256(salt + password)` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, password) == hash,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let stored = hash_password("hunter22");
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
        assert!(!verify_password("hunter22", "garbage"));
    }

    #[test]
    fn test_password_hash_is_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn test_normalize_public_key_drops_comment() {
        assert_eq!(
            normalize_public_key("  ssh-ed25519 AAAAC3Nz  me@laptop\n"),
            "ssh-ed25519 AAAAC3Nz"
        );
    }

    #[test]
    fn test_auth_error_messages() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "invalid email or password");
        assert_eq!(AuthError::KeyTaken.to_string(), "SSH key already registered");
    }
}
