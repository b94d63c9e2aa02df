//! User model
//!
//! This module defines the User entity and the input types used for
//! registration and account updates. Passwords are always hashed with
//! argon2 before they reach this type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// Note: The password should already be hashed before calling this function.
    /// Use `services::password::hash_password()` to hash the password.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user owns content authored by `author_id`
    pub fn owns(&self, author_id: i64) -> bool {
        self.id == author_id
    }

    /// Local part of the email address, used as the default display name
    pub fn email_local_part(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
}

/// Input for updating a user
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New username (optional)
    pub username: Option<String>,
    /// New email (optional)
    pub email: Option<String>,
    /// New password (optional, will be hashed)
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "testuser".to_string(),
            "test@example.com".to_string(),
            "hashed_password".to_string(),
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.username, "testuser");
        assert_eq!(user.email, "test@example.com");
    }

    #[test]
    fn test_user_owns() {
        let mut user = User::new(
            "author".to_string(),
            "author@test.com".to_string(),
            "hash".to_string(),
        );
        user.id = 2;

        assert!(user.owns(2));
        assert!(!user.owns(1));
        assert!(!user.owns(999));
    }

    #[test]
    fn test_email_local_part() {
        let user = User::new(
            "jamie".to_string(),
            "jamie@example.com".to_string(),
            "hash".to_string(),
        );
        assert_eq!(user.email_local_part(), "jamie");

        let odd = User::new("odd".to_string(), "no-at-sign".to_string(), "hash".to_string());
        assert_eq!(odd.email_local_part(), "no-at-sign");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new(
            "testuser".to_string(),
            "test@example.com".to_string(),
            "secret_hash".to_string(),
        );
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret_hash"));
    }
}
