use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

pub const USERNAME_LEN: RangeInclusive<usize> = 3..=64;
pub const NAME_LEN: RangeInclusive<usize> = 1..=100;
/// bcrypt ignores input past 72 bytes.
pub const PASSWORD_LEN: RangeInclusive<usize> = 6..=72;

/// Stored user row. Deliberately not `Serialize`: responses go through
/// [`ProfileView`] or [`RegisteredUser`].
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// bcrypt hash
    pub password: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Public projection of a user for `GET /profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for ProfileView {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Projection returned after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for RegisteredUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Columns to overwrite; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.password_hash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 1,
            username: "ada".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: "$2b$04$hash".to_string(),
        }
    }

    #[test]
    fn profile_view_omits_password_and_id() {
        let value = serde_json::to_value(ProfileView::from(user())).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 3);
        assert!(value.get("password").is_none());
        assert!(value.get("id").is_none());
    }

    #[test]
    fn debug_output_redacts_hash() {
        let rendered = format!("{:?}", user());
        assert!(!rendered.contains("$2b$"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn empty_patch() {
        assert!(UserPatch::default().is_empty());
        let patch = UserPatch {
            first_name: Some("Ada".to_string()),
            ..UserPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
