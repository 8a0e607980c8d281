//! # Access Policy
//!
//! One decision function shared by every guarded route: the caller's stored
//! user record must exist and carry exactly the role the route names.

use crate::user::{Role, User};
use thiserror::Error;

/// Rejection produced by [`authorize`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{required} only actions")]
pub struct AccessDenied {
    pub required: Role,
    /// Role the caller actually holds, if they have an account
    pub actual: Option<Role>,
}

/// Decide whether `user` may perform an action reserved for `required`
pub fn authorize(user: Option<&User>, required: Role) -> Result<(), AccessDenied> {
    match user {
        Some(user) if user.role == required => Ok(()),
        other => Err(AccessDenied {
            required,
            actual: other.map(|u| u.role),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::LoginProfile;
    use chrono::Utc;

    fn user_with(role: Role) -> User {
        let mut user = User::first_login("u@x.io", LoginProfile::default(), Utc::now());
        user.role = role;
        user
    }

    #[test]
    fn test_matching_role_allowed() {
        assert!(authorize(Some(&user_with(Role::Admin)), Role::Admin).is_ok());
        assert!(authorize(Some(&user_with(Role::Moderator)), Role::Moderator).is_ok());
    }

    #[test]
    fn test_roles_do_not_nest() {
        let denied = authorize(Some(&user_with(Role::Admin)), Role::Moderator).unwrap_err();
        assert_eq!(denied.actual, Some(Role::Admin));
        assert_eq!(denied.required, Role::Moderator);
    }

    #[test]
    fn test_unknown_user_denied() {
        let denied = authorize(None, Role::Admin).unwrap_err();
        assert_eq!(denied.actual, None);
        assert_eq!(denied.to_string(), "Admin only actions");
    }
}
