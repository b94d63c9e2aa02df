//! User service
//!
//! Business logic for accounts and authentication:
//! - Registration with username/email uniqueness and password rules
//! - Login with username or email, returning a session token
//! - Session validation and logout
//!
//! Invalid credentials always produce the same authentication error,
//! regardless of whether the user exists or the password was wrong.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User};
use crate::services::password::{hash_password, verify_password};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Minimum accepted password length
const MIN_PASSWORD_LENGTH: usize = 8;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing accounts and sessions
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_ttl_days: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            user_repo,
            session_repo,
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
        }
    }

    /// Create a new user service with a custom session lifetime
    pub fn with_session_ttl(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_ttl_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_ttl_days,
        }
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// - `ValidationError` for empty username/email, malformed email, or a
    ///   password shorter than 8 characters
    /// - `UserExists` when the username or email is already taken
    /// - `InternalError` for database errors
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(input.username, input.email, password_hash);

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = created.id, username = %created.username, "User registered");
        Ok(created)
    }

    /// Login with username or email plus password
    ///
    /// Returns a new session on success. Any invalid credential yields the
    /// same `AuthenticationError`.
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let user = self
            .find_user_by_username_or_email(&input.username_or_email)
            .await?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid username or password".to_string())
            })?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid username or password".to_string(),
            ));
        }

        let session = self.create_session(user.id).await?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(session)
    }

    /// Logout (invalidate the session)
    ///
    /// Deleting an unknown session is not an error.
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// Validate a session token and return the associated user
    ///
    /// Returns `None` for unknown or expired tokens; expired sessions are
    /// deleted on the way out.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;

        Ok(user)
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;

        Ok(count)
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    fn validate_register_input(&self, input: &RegisterInput) -> Result<(), UserServiceError> {
        if input.username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }

        if input.email.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Email cannot be empty".to_string(),
            ));
        }

        if !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        if input.password.len() < MIN_PASSWORD_LENGTH {
            return Err(UserServiceError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        Ok(())
    }

    async fn find_user_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, UserServiceError> {
        if let Some(user) = self
            .user_repo
            .get_by_username(username_or_email)
            .await
            .context("Failed to get user by username")?
        {
            return Ok(Some(user));
        }

        let user = self
            .user_repo
            .get_by_email(username_or_email)
            .await
            .context("Failed to get user by email")?;

        Ok(user)
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_ttl_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    /// Create a new registration input
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

impl LoginInput {
    /// Create a new login input
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, UserService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let service = UserService::new(user_repo, session_repo);

        (pool, service)
    }

    #[tokio::test]
    async fn test_register_success() {
        let (_pool, service) = setup_test_service().await;

        let input = RegisterInput::new("alice", "alice@example.com", "password123");
        let user = service.register(input).await.expect("Failed to register");

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_fails() {
        let (_pool, service) = setup_test_service().await;

        service
            .register(RegisterInput::new("alice", "a1@example.com", "password123"))
            .await
            .unwrap();

        let result = service
            .register(RegisterInput::new("alice", "a2@example.com", "password456"))
            .await;

        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_fails() {
        let (_pool, service) = setup_test_service().await;

        service
            .register(RegisterInput::new("alice", "same@example.com", "password123"))
            .await
            .unwrap();

        let result = service
            .register(RegisterInput::new("bob", "same@example.com", "password456"))
            .await;

        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_register_short_password_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .register(RegisterInput::new("alice", "alice@example.com", "short"))
            .await;

        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_register_invalid_email_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .register(RegisterInput::new("alice", "not-an-email", "password123"))
            .await;

        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_login_with_username_and_email() {
        let (_pool, service) = setup_test_service().await;

        service
            .register(RegisterInput::new("alice", "alice@example.com", "password123"))
            .await
            .unwrap();

        let session = service
            .login(LoginInput::new("alice", "password123"))
            .await
            .expect("Login by username failed");
        assert!(!session.id.is_empty());
        assert!(!session.is_expired());

        let session = service
            .login(LoginInput::new("alice@example.com", "password123"))
            .await
            .expect("Login by email failed");
        assert!(!session.is_expired());
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails() {
        let (_pool, service) = setup_test_service().await;

        service
            .register(RegisterInput::new("alice", "alice@example.com", "password123"))
            .await
            .unwrap();

        let result = service.login(LoginInput::new("alice", "wrongpassword")).await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_login_unknown_user_fails_identically() {
        let (_pool, service) = setup_test_service().await;

        let result = service.login(LoginInput::new("nobody", "password123")).await;
        let message = match result {
            Err(UserServiceError::AuthenticationError(m)) => m,
            other => panic!("Expected AuthenticationError, got {:?}", other.map(|s| s.id)),
        };

        // Same message as a wrong password, so callers cannot enumerate accounts
        assert_eq!(message, "Invalid username or password");
    }

    #[tokio::test]
    async fn test_validate_session_roundtrip() {
        let (_pool, service) = setup_test_service().await;

        let registered = service
            .register(RegisterInput::new("alice", "alice@example.com", "password123"))
            .await
            .unwrap();
        let session = service
            .login(LoginInput::new("alice", "password123"))
            .await
            .unwrap();

        let user = service
            .validate_session(&session.id)
            .await
            .unwrap()
            .expect("Session should be valid");

        assert_eq!(user.id, registered.id);
    }

    #[tokio::test]
    async fn test_validate_expired_session_returns_none() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        // -1 day expiration, so sessions are born expired
        let service = UserService::with_session_ttl(user_repo, session_repo, -1);

        service
            .register(RegisterInput::new("alice", "alice@example.com", "password123"))
            .await
            .unwrap();
        let session = service
            .login(LoginInput::new("alice", "password123"))
            .await
            .unwrap();

        assert!(session.is_expired());
        let result = service.validate_session(&session.id).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let (_pool, service) = setup_test_service().await;

        service
            .register(RegisterInput::new("alice", "alice@example.com", "password123"))
            .await
            .unwrap();
        let session = service
            .login(LoginInput::new("alice", "password123"))
            .await
            .unwrap();

        service.logout(&session.id).await.expect("Failed to logout");

        let result = service.validate_session(&session.id).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let service = UserService::with_session_ttl(user_repo, session_repo, -1);

        service
            .register(RegisterInput::new("alice", "alice@example.com", "password123"))
            .await
            .unwrap();
        service
            .login(LoginInput::new("alice", "password123"))
            .await
            .unwrap();

        let count = service.cleanup_expired_sessions().await.unwrap();
        assert_eq!(count, 1);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::{hash_password, verify_password};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    async fn setup_property_test_service() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        UserService::new(user_repo, session_repo)
    }

    fn unique_suffix() -> u64 {
        TEST_COUNTER.fetch_add(1, Ordering::SeqCst)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// For any valid credentials, login returns a token that validates
        /// back to the same user.
        #[test]
        fn property_auth_roundtrip(
            username in "[a-z]{3,10}",
            email_prefix in "[a-z]{3,10}",
            password in "[a-zA-Z0-9!@#$%^&*]{8,20}"
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let service = setup_property_test_service().await;
                let suffix = unique_suffix();

                let unique_username = format!("{}_{}", username, suffix);
                let unique_email = format!("{}_{}@example.com", email_prefix, suffix);

                let registered = service
                    .register(RegisterInput::new(
                        unique_username.clone(),
                        unique_email,
                        password.clone(),
                    ))
                    .await
                    .expect("Registration should succeed");

                let session = service
                    .login(LoginInput::new(unique_username, password))
                    .await
                    .expect("Login should succeed with valid credentials");

                let validated = service
                    .validate_session(&session.id)
                    .await
                    .expect("Session validation should not error")
                    .expect("Session should be valid");

                prop_assert_eq!(validated.id, registered.id);
                prop_assert_eq!(validated.username, registered.username);
                Ok(())
            });
            result?;
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// For any password, the stored hash differs from the plaintext,
        /// round-trips through verification, and salts uniquely.
        #[test]
        fn property_password_secure_storage(
            password in "[a-zA-Z0-9!@#$%^&*()_+-=]{8,50}"
        ) {
            let hash = hash_password(&password).expect("Password hashing should succeed");

            prop_assert_ne!(&hash, &password);
            prop_assert!(hash.starts_with("$argon2id$"));

            let verified = verify_password(&password, &hash)
                .expect("Password verification should not error");
            prop_assert!(verified);

            let wrong = format!("{}wrong", password);
            let wrong_verified = verify_password(&wrong, &hash)
                .expect("Password verification should not error");
            prop_assert!(!wrong_verified);

            let hash2 = hash_password(&password).expect("Second hashing should succeed");
            prop_assert_ne!(&hash, &hash2);
        }
    }
}
