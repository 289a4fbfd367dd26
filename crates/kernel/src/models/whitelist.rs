//! Signup whitelist.
//!
//! Only email addresses on the whitelist may create an account. Each entry
//! carries the role the account receives on signup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::Role;

/// Whitelist record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// Normalized email address.
    pub email: String,
    pub role: Role,
    pub created: DateTime<Utc>,
}

impl WhitelistEntry {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            email: normalize_email(email),
            role,
            created: Utc::now(),
        }
    }
}

/// Normalize an email address for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal syntactic check: one `@` with a non-empty local part and a
/// dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
        assert_eq!(
            WhitelistEntry::new("Ada@Example.com", Role::Editor).email,
            "ada@example.com"
        );
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@localhost"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("a da@example.com"));
    }
}
