//! User model and password hashing.

use anyhow::Result;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::{Permission, Role};

/// User record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Normalized (trimmed, lowercase) email address, unique.
    pub email: String,
    #[serde(skip_serializing, default)]
    pub pass: String,
    pub role: Role,
    pub created: DateTime<Utc>,
    pub login: Option<DateTime<Utc>>,
}

impl User {
    /// Build a new user, hashing the password with Argon2id.
    pub fn new(email: &str, password: &str, role: Role) -> Result<Self> {
        Ok(Self {
            id: Uuid::now_v7(),
            email: email.to_string(),
            pass: hash_password(password)?,
            role,
            created: Utc::now(),
            login: None,
        })
    }

    /// Check whether this user's role grants `permission`.
    pub fn can(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    /// Verify a password against this user's hash.
    pub fn verify_password(&self, password: &str) -> bool {
        if self.pass.is_empty() {
            return false;
        }

        let Ok(parsed_hash) = PasswordHash::new(&self.pass) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn verify_password_round_trip() {
        let user = User::new("ada@example.com", "correct horse", Role::Editor).unwrap();
        assert!(user.verify_password("correct horse"));
        assert!(!user.verify_password("wrong"));
    }

    #[test]
    fn empty_or_corrupt_hash_never_verifies() {
        let mut user = User::new("ada@example.com", "pw123456", Role::Reader).unwrap();
        user.pass = String::new();
        assert!(!user.verify_password(""));
        user.pass = "not-a-hash".to_string();
        assert!(!user.verify_password("pw123456"));
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User::new("ada@example.com", "pw123456", Role::Admin).unwrap();
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("pass").is_none());
        assert_eq!(value["role"], "admin");
    }

    #[test]
    fn permissions_follow_role() {
        let reader = User::new("r@example.com", "pw123456", Role::Reader).unwrap();
        assert!(reader.can(Permission::ViewArticles));
        assert!(!reader.can(Permission::EditArticles));
    }
}
