//! Authentication, sessions and the signup whitelist.
//!
//! Signup is closed: an email must be on the whitelist, and the new account
//! receives the role recorded on its whitelist entry. The session only
//! stores the user id under [`SESSION_USER_ID`]; the user record is loaded
//! on every request so role changes take effect immediately.

use std::sync::Arc;

use thiserror::Error;
use tower_sessions::Session;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::whitelist::{is_valid_email, normalize_email};
use crate::models::{Permission, Role, User, WhitelistEntry};
use crate::store::{StoreError, UserStore, WhitelistStore};

/// Session key for user ID.
pub const SESSION_USER_ID: &str = "user_id";

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("this email address is not allowed to sign up")]
    NotWhitelisted,

    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("invalid email address")]
    InvalidEmail,

    #[error("password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    WeakPassword,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("authentication required")]
    Unauthenticated,

    #[error("missing permission: {0}")]
    Forbidden(Permission),

    #[error("session error")]
    Session(#[from] tower_sessions::session::Error),

    #[error("store error")]
    Store(#[from] StoreError),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

/// The auth and session provider.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    whitelist: Arc<dyn WhitelistStore>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, whitelist: Arc<dyn WhitelistStore>) -> Self {
        Self { users, whitelist }
    }

    /// Create an account for a whitelisted email.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }

        let Some(entry) = self.whitelist.find(&email).await? else {
            warn!(email = %email, "signup rejected: not whitelisted");
            return Err(AuthError::NotWhitelisted);
        };

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let user = User::new(&email, password, entry.role)?;
        let user = match self.users.create(user).await {
            Ok(user) => user,
            Err(StoreError::Conflict(_)) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, role = %user.role, "user signed up");
        Ok(user)
    }

    /// Check credentials. Unknown emails and wrong passwords produce the
    /// same error.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !user.verify_password(password) {
            warn!(user_id = %user.id, "failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        self.users.touch_login(user.id).await?;
        info!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    /// Bind `user` to the session, rotating the session id.
    pub async fn log_in(&self, session: &Session, user: &User) -> Result<(), AuthError> {
        session.cycle_id().await?;
        session.insert(SESSION_USER_ID, user.id).await?;
        Ok(())
    }

    /// Destroy the session.
    pub async fn log_out(&self, session: &Session) -> Result<(), AuthError> {
        session.flush().await?;
        Ok(())
    }

    /// The user bound to the session, if any.
    ///
    /// A session pointing at a deleted user counts as logged out.
    pub async fn current_user(&self, session: &Session) -> Result<Option<User>, AuthError> {
        let Some(id) = session.get::<Uuid>(SESSION_USER_ID).await? else {
            return Ok(None);
        };
        Ok(self.users.find_by_id(id).await?)
    }

    /// The session's user, provided their role grants `permission`.
    pub async fn require(
        &self,
        session: &Session,
        permission: Permission,
    ) -> Result<User, AuthError> {
        let user = self
            .current_user(session)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if !user.can(permission) {
            return Err(AuthError::Forbidden(permission));
        }
        Ok(user)
    }

    /// Add an email to the whitelist, or change the role of an existing
    /// entry.
    pub async fn whitelist_add(
        &self,
        email: &str,
        role: Role,
    ) -> Result<WhitelistEntry, AuthError> {
        let entry = WhitelistEntry::new(email, role);
        if !is_valid_email(&entry.email) {
            return Err(AuthError::InvalidEmail);
        }
        let entry = self.whitelist.add(entry).await?;
        info!(email = %entry.email, role = %entry.role, "whitelist entry saved");
        Ok(entry)
    }

    /// Add an email only if it is not already whitelisted.
    pub async fn whitelist_seed(&self, email: &str, role: Role) -> Result<(), AuthError> {
        if self.whitelist.find(&normalize_email(email)).await?.is_none() {
            self.whitelist_add(email, role).await?;
        }
        Ok(())
    }

    pub async fn whitelist_remove(&self, email: &str) -> Result<bool, AuthError> {
        let email = normalize_email(email);
        let removed = self.whitelist.remove(&email).await?;
        if removed {
            info!(email = %email, "whitelist entry removed");
        }
        Ok(removed)
    }

    pub async fn whitelist_list(&self) -> Result<Vec<WhitelistEntry>, AuthError> {
        Ok(self.whitelist.list().await?)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.users.list().await?)
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) -> Result<Option<User>, AuthError> {
        let user = self.users.set_role(user_id, role).await?;
        if let Some(user) = &user {
            info!(user_id = %user.id, role = %role, "user role changed");
        }
        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::{MemoryUserStore, MemoryWhitelistStore};

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryWhitelistStore::new()),
        )
    }

    #[tokio::test]
    async fn signup_requires_whitelist() {
        let auth = service();
        let err = auth.sign_up("ada@example.com", "long enough").await.unwrap_err();
        assert!(matches!(err, AuthError::NotWhitelisted));
    }

    #[tokio::test]
    async fn signup_takes_role_from_whitelist() {
        let auth = service();
        auth.whitelist_add("Ada@Example.com", Role::Editor).await.unwrap();

        let user = auth.sign_up(" ada@example.com ", "long enough").await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, Role::Editor);
    }

    #[tokio::test]
    async fn signup_rejects_short_password_and_duplicates() {
        let auth = service();
        auth.whitelist_add("ada@example.com", Role::Reader).await.unwrap();

        let err = auth.sign_up("ada@example.com", "short").await.unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword));

        auth.sign_up("ada@example.com", "long enough").await.unwrap();
        let err = auth.sign_up("ada@example.com", "long enough").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn sign_in_checks_password() {
        let auth = service();
        auth.whitelist_add("ada@example.com", Role::Reader).await.unwrap();
        auth.sign_up("ada@example.com", "long enough").await.unwrap();

        let user = auth.sign_in("ADA@example.com", "long enough").await.unwrap();
        assert_eq!(user.email, "ada@example.com");

        let err = auth.sign_in("ada@example.com", "wrong password").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = auth.sign_in("nobody@example.com", "long enough").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn whitelist_rejects_invalid_email() {
        let auth = service();
        let err = auth.whitelist_add("not-an-email", Role::Reader).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail));
    }

    #[tokio::test]
    async fn seed_does_not_downgrade() {
        let auth = service();
        auth.whitelist_add("ada@example.com", Role::Admin).await.unwrap();
        auth.whitelist_seed("ada@example.com", Role::Reader).await.unwrap();

        let entries = auth.whitelist_list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].role, Role::Admin);
    }

    #[tokio::test]
    async fn set_role_on_missing_user() {
        let auth = service();
        assert!(auth.set_role(Uuid::now_v7(), Role::Admin).await.unwrap().is_none());
    }
}
