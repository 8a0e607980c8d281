//! # User Types
//!
//! Accounts are keyed by the email the identity service vouches for.

use crate::id::DocumentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role attached to a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Moderator,
    #[default]
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Moderator => "Moderator",
            Role::Student => "Student",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Admin" => Some(Role::Admin),
            "Moderator" => Some(Role::Moderator),
            "Student" => Some(Role::Student),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_logged_in: DateTime<Utc>,
}

/// Profile fields a client sends when logging in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl User {
    /// A first-time login: always a student
    pub fn first_login(email: impl Into<String>, profile: LoginProfile, at: DateTime<Utc>) -> Self {
        Self {
            id: DocumentId::new(),
            email: email.into(),
            name: profile.name,
            image: profile.image,
            role: Role::Student,
            created_at: at,
            last_logged_in: at,
        }
    }
}

/// Result of a login upsert
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Created(User),
    Updated(User),
}

impl LoginOutcome {
    pub fn user(&self) -> &User {
        match self {
            LoginOutcome::Created(user) | LoginOutcome::Updated(user) => user,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, LoginOutcome::Created(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_login_is_student() {
        let now = Utc::now();
        let user = User::first_login("s@x.io", LoginProfile::default(), now);
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.created_at, user.last_logged_in);
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"Admin\"");
        assert_eq!(Role::parse("Moderator"), Some(Role::Moderator));
        assert_eq!(Role::parse("admin"), None);
    }
}
