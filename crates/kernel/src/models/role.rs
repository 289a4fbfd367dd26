//! Roles and the permissions they grant.
//!
//! The role set is fixed: every user has exactly one of admin, editor or
//! reader, stored as lowercase text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A user's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Reader,
}

/// Something a role may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewArticles,
    EditArticles,
    PublishArticles,
    ManageUsers,
    ManageWhitelist,
}

/// Error for role names that are not admin, editor or reader.
#[derive(Debug, Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

const EDITOR_PERMISSIONS: &[Permission] = &[
    Permission::ViewArticles,
    Permission::EditArticles,
    Permission::PublishArticles,
];

const READER_PERMISSIONS: &[Permission] = &[Permission::ViewArticles];

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Editor, Role::Reader];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Reader => "reader",
        }
    }

    /// Check whether this role grants `permission`.
    ///
    /// Admins have every permission.
    pub fn has_permission(self, permission: Permission) -> bool {
        match self {
            Role::Admin => true,
            Role::Editor => EDITOR_PERMISSIONS.contains(&permission),
            Role::Reader => READER_PERMISSIONS.contains(&permission),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "reader" => Ok(Role::Reader),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Permission::ViewArticles,
        Permission::EditArticles,
        Permission::PublishArticles,
        Permission::ManageUsers,
        Permission::ManageWhitelist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ViewArticles => "view articles",
            Permission::EditArticles => "edit articles",
            Permission::PublishArticles => "publish articles",
            Permission::ManageUsers => "manage users",
            Permission::ManageWhitelist => "manage whitelist",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
