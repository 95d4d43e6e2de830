//! Tenant-scoped user accounts.

pub mod commands;
pub mod queries;
pub mod repository;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::cqrs::Mediator;
use crate::domain::DomainError;
use crate::messaging::EventPublisher;

pub use commands::{CreateUser, DeleteUser, UpdateUser, UserChanges};
pub use queries::{GetUser, ListUsers};
pub use repository::{MemoryUserRepository, PgUserRepository, UserRepository};

pub const DEFAULT_ROLE: &str = "user";
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub tenant_id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated, lower-cased email address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Accepts `local@domain.tld`: no whitespace, a single `@`, and a dot
    /// with text on both sides somewhere after the `@`.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.is_empty() {
            return Err(DomainError::validation("email", "Email is required"));
        }

        let invalid = || DomainError::validation("email", "Please provide a valid email address");

        if raw.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let (local, domain) = raw.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.contains('@') {
            return Err(invalid());
        }

        let has_inner_dot = domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
        if !has_inner_dot {
            return Err(invalid());
        }

        Ok(Email(raw.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Roles must be a non-empty list of non-empty names
pub(crate) fn validate_roles(roles: Vec<String>) -> Result<Vec<String>, DomainError> {
    if roles.is_empty() {
        return Err(DomainError::validation("roles", "At least one role is required"));
    }
    if roles.iter().any(|r| r.trim().is_empty()) {
        return Err(DomainError::validation("roles", "Each role must be a non-empty string"));
    }
    Ok(roles)
}

pub(crate) fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::Hashing(e.to_string()))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

/// Command and query handlers for users
#[derive(Clone)]
pub struct UserHandlers {
    repository: Arc<dyn UserRepository>,
    events: Arc<dyn EventPublisher>,
}

impl UserHandlers {
    pub fn new(repository: Arc<dyn UserRepository>, events: Arc<dyn EventPublisher>) -> Self {
        Self { repository, events }
    }

    pub fn register(self, mediator: &mut Mediator) {
        mediator
            .register_command::<CreateUser, _>(self.clone())
            .register_command::<UpdateUser, _>(self.clone())
            .register_command::<DeleteUser, _>(self.clone())
            .register_query::<GetUser, _>(self.clone())
            .register_query::<ListUsers, _>(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_lower_cased() {
        let email = Email::parse("John.Doe@Example.COM").unwrap();
        assert_eq!(email.as_str(), "john.doe@example.com");
    }

    #[test]
    fn email_rejects_malformed_addresses() {
        for raw in ["", "plain", "a@b", "a@.com", "a@com.", "@x.com", "a b@x.com", "a@b@c.com"] {
            assert!(Email::parse(raw).is_err(), "{} should be rejected", raw);
        }
        assert!(Email::parse("a@b.co").is_ok());
        assert!(Email::parse("first.last@sub.domain.org").is_ok());
    }

    #[test]
    fn roles_must_be_non_empty() {
        assert!(validate_roles(vec![]).is_err());
        assert!(validate_roles(vec!["".to_string()]).is_err());
        assert_eq!(validate_roles(vec!["admin".to_string()]).unwrap(), vec!["admin"]);
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("secret123").unwrap();
        assert_ne!(hash, "secret123");
        assert!(verify_password("secret123", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("secret123", "not-a-hash"));
    }
}
