//! Profile repository
//!
//! Database operations for user profiles. The `preferences` column is a
//! JSON text blob; malformed stored blobs decode to the default
//! preference shape instead of failing the row.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Preferences, UpdateProfileInput, UserProfile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

/// Profile repository trait
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Get a profile by its owning user ID
    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<UserProfile>>;

    /// Create a profile with default preferences
    async fn create(&self, user_id: i64, display_name: &str) -> Result<UserProfile>;

    /// Apply a partial update; returns the updated row, or None if absent
    async fn update(&self, user_id: i64, input: &UpdateProfileInput) -> Result<Option<UserProfile>>;
}

/// SQLx-based profile repository implementation
///
/// Supports both SQLite and PostgreSQL databases.
pub struct SqlxProfileRepository {
    pool: DynDatabasePool,
}

impl SqlxProfileRepository {
    /// Create a new SQLx profile repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProfileRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProfileRepository for SqlxProfileRepository {
    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<UserProfile>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_profile_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Postgres => {
                get_profile_postgres(self.pool.as_postgres().unwrap(), user_id).await
            }
        }
    }

    async fn create(&self, user_id: i64, display_name: &str) -> Result<UserProfile> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_profile_sqlite(self.pool.as_sqlite().unwrap(), user_id, display_name).await
            }
            DatabaseDriver::Postgres => {
                create_profile_postgres(self.pool.as_postgres().unwrap(), user_id, display_name)
                    .await
            }
        }
    }

    async fn update(
        &self,
        user_id: i64,
        input: &UpdateProfileInput,
    ) -> Result<Option<UserProfile>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_profile_sqlite(self.pool.as_sqlite().unwrap(), user_id, input).await
            }
            DatabaseDriver::Postgres => {
                update_profile_postgres(self.pool.as_postgres().unwrap(), user_id, input).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_profile_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Option<UserProfile>> {
    let row = sqlx::query(
        "SELECT user_id, display_name, bio, avatar_url, preferences, created_at, updated_at \
         FROM user_profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get profile")?;

    match row {
        Some(row) => Ok(Some(row_to_profile_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn create_profile_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    display_name: &str,
) -> Result<UserProfile> {
    let now = Utc::now();
    let preferences = serde_json::to_string(&Preferences::default())
        .context("Failed to serialize default preferences")?;

    sqlx::query(
        r#"
        INSERT INTO user_profiles (user_id, display_name, preferences, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(display_name)
    .bind(&preferences)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create profile")?;

    get_profile_sqlite(pool, user_id)
        .await?
        .context("Created profile not found")
}

async fn update_profile_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    input: &UpdateProfileInput,
) -> Result<Option<UserProfile>> {
    let existing = match get_profile_sqlite(pool, user_id).await? {
        Some(profile) => profile,
        None => return Ok(None),
    };

    let merged = merge_update(&existing, input);
    let preferences = serde_json::to_string(&merged.preferences)
        .context("Failed to serialize preferences")?;

    sqlx::query(
        r#"
        UPDATE user_profiles
        SET display_name = ?, bio = ?, avatar_url = ?, preferences = ?, updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(&merged.display_name)
    .bind(&merged.bio)
    .bind(&merged.avatar_url)
    .bind(&preferences)
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update profile")?;

    get_profile_sqlite(pool, user_id).await
}

fn row_to_profile_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<UserProfile> {
    let preferences: String = row.get("preferences");

    Ok(UserProfile {
        user_id: row.get("user_id"),
        display_name: row.get("display_name"),
        bio: row.get("bio"),
        avatar_url: row.get("avatar_url"),
        preferences: serde_json::from_str(&preferences).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// PostgreSQL implementations
// ============================================================================

async fn get_profile_postgres(pool: &PgPool, user_id: i64) -> Result<Option<UserProfile>> {
    let row = sqlx::query(
        "SELECT user_id, display_name, bio, avatar_url, preferences, created_at, updated_at \
         FROM user_profiles WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get profile")?;

    match row {
        Some(row) => Ok(Some(row_to_profile_postgres(&row)?)),
        None => Ok(None),
    }
}

async fn create_profile_postgres(
    pool: &PgPool,
    user_id: i64,
    display_name: &str,
) -> Result<UserProfile> {
    let now = Utc::now();
    let preferences = serde_json::to_string(&Preferences::default())
        .context("Failed to serialize default preferences")?;

    let row = sqlx::query(
        r#"
        INSERT INTO user_profiles (user_id, display_name, preferences, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING user_id, display_name, bio, avatar_url, preferences, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(display_name)
    .bind(&preferences)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to create profile")?;

    row_to_profile_postgres(&row)
}

async fn update_profile_postgres(
    pool: &PgPool,
    user_id: i64,
    input: &UpdateProfileInput,
) -> Result<Option<UserProfile>> {
    let existing = match get_profile_postgres(pool, user_id).await? {
        Some(profile) => profile,
        None => return Ok(None),
    };

    let merged = merge_update(&existing, input);
    let preferences = serde_json::to_string(&merged.preferences)
        .context("Failed to serialize preferences")?;

    let row = sqlx::query(
        r#"
        UPDATE user_profiles
        SET display_name = $1, bio = $2, avatar_url = $3, preferences = $4, updated_at = $5
        WHERE user_id = $6
        RETURNING user_id, display_name, bio, avatar_url, preferences, created_at, updated_at
        "#,
    )
    .bind(&merged.display_name)
    .bind(&merged.bio)
    .bind(&merged.avatar_url)
    .bind(&preferences)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("Failed to update profile")?;

    Ok(Some(row_to_profile_postgres(&row)?))
}

fn row_to_profile_postgres(row: &sqlx::postgres::PgRow) -> Result<UserProfile> {
    let preferences: String = row.get("preferences");

    Ok(UserProfile {
        user_id: row.get("user_id"),
        display_name: row.get("display_name"),
        bio: row.get("bio"),
        avatar_url: row.get("avatar_url"),
        preferences: serde_json::from_str(&preferences).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// Shared helpers
// ============================================================================

fn merge_update(existing: &UserProfile, input: &UpdateProfileInput) -> UserProfile {
    let mut merged = existing.clone();
    if let Some(display_name) = &input.display_name {
        merged.display_name = display_name.clone();
    }
    if let Some(bio) = &input.bio {
        merged.bio = Some(bio.clone());
    }
    if let Some(avatar_url) = &input.avatar_url {
        merged.avatar_url = Some(avatar_url.clone());
    }
    if let Some(preferences) = &input.preferences {
        merged.preferences = preferences.clone();
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::Theme;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxProfileRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxProfileRepository::new(pool.clone());
        (pool, repo)
    }

    async fn create_test_user(pool: &DynDatabasePool, id: i64) {
        let now = Utc::now();
        let sqlite_pool = pool.as_sqlite().unwrap();
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(format!("user{}", id))
        .bind(format!("user{}@example.com", id))
        .bind("hash")
        .bind(now)
        .bind(now)
        .execute(sqlite_pool)
        .await
        .expect("Failed to create test user");
    }

    #[tokio::test]
    async fn test_create_profile_with_default_preferences() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let created = repo.create(1, "alice").await.expect("Failed to create profile");

        assert_eq!(created.user_id, 1);
        assert_eq!(created.display_name, "alice");
        assert!(created.bio.is_none());
        assert_eq!(created.preferences, Preferences::default());
    }

    #[tokio::test]
    async fn test_get_missing_profile_returns_none() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_user_id(42).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_profile_fields() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;
        repo.create(1, "alice").await.unwrap();

        let input = UpdateProfileInput {
            display_name: Some("Alice A.".to_string()),
            bio: Some("Hello there".to_string()),
            ..Default::default()
        };
        let updated = repo
            .update(1, &input)
            .await
            .unwrap()
            .expect("Profile not found");

        assert_eq!(updated.display_name, "Alice A.");
        assert_eq!(updated.bio.as_deref(), Some("Hello there"));
        // Preferences untouched by a partial update
        assert_eq!(updated.preferences, Preferences::default());
    }

    #[tokio::test]
    async fn test_update_preferences_replaces_blob() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;
        repo.create(1, "alice").await.unwrap();

        let mut prefs = Preferences::default();
        prefs.theme = Theme::Dark;
        prefs.notifications = false;

        let input = UpdateProfileInput {
            preferences: Some(prefs.clone()),
            ..Default::default()
        };
        let updated = repo.update(1, &input).await.unwrap().unwrap();

        assert_eq!(updated.preferences, prefs);
    }

    #[tokio::test]
    async fn test_update_missing_profile_returns_none() {
        let (_pool, repo) = setup_test_repo().await;

        let input = UpdateProfileInput {
            bio: Some("no one home".to_string()),
            ..Default::default()
        };
        let result = repo.update(99, &input).await.unwrap();
        assert!(result.is_none());
    }
}
