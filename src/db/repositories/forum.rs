//! Forum repository
//!
//! Read-side operations for the forum boards. Forums are seeded by the
//! migrations; the application only lists them and resolves slugs. The
//! summaries carry topic/post counts and latest activity via subqueries.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Forum, ForumSummary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

const FORUM_SUMMARY_SQL_SQLITE: &str = r#"
SELECT f.id, f.slug, f.title, f.description, f.is_private, f.created_at,
       (SELECT COUNT(*) FROM forum_topics t WHERE t.forum_id = f.id) AS topic_count,
       (SELECT COUNT(*) FROM forum_posts p
          JOIN forum_topics t ON t.id = p.topic_id
         WHERE t.forum_id = f.id) AS post_count,
       (SELECT MAX(p.created_at) FROM forum_posts p
          JOIN forum_topics t ON t.id = p.topic_id
         WHERE t.forum_id = f.id) AS latest_post_at
FROM forums f
ORDER BY f.created_at ASC, f.id ASC
"#;

/// Forum repository trait
#[async_trait]
pub trait ForumRepository: Send + Sync {
    /// List all forums with activity aggregates, oldest board first
    async fn list(&self) -> Result<Vec<ForumSummary>>;

    /// Get forum by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Forum>>;

    /// Get forum by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Forum>>;
}

/// SQLx-based forum repository implementation
///
/// Supports both SQLite and PostgreSQL databases.
pub struct SqlxForumRepository {
    pool: DynDatabasePool,
}

impl SqlxForumRepository {
    /// Create a new SQLx forum repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ForumRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ForumRepository for SqlxForumRepository {
    async fn list(&self) -> Result<Vec<ForumSummary>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_forums_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Postgres => list_forums_postgres(self.pool.as_postgres().unwrap()).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Forum>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_forum_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Postgres => {
                get_forum_by_id_postgres(self.pool.as_postgres().unwrap(), id).await
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Forum>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_forum_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Postgres => {
                get_forum_by_slug_postgres(self.pool.as_postgres().unwrap(), slug).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_forums_sqlite(pool: &SqlitePool) -> Result<Vec<ForumSummary>> {
    let rows = sqlx::query(FORUM_SUMMARY_SQL_SQLITE)
        .fetch_all(pool)
        .await
        .context("Failed to list forums")?;

    Ok(rows
        .iter()
        .map(|row| ForumSummary {
            forum: row_to_forum_sqlite(row),
            topic_count: row.get("topic_count"),
            post_count: row.get("post_count"),
            latest_post_at: row.get("latest_post_at"),
        })
        .collect())
}

async fn get_forum_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Forum>> {
    let row = sqlx::query(
        "SELECT id, slug, title, description, is_private, created_at FROM forums WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get forum by ID")?;

    Ok(row.as_ref().map(row_to_forum_sqlite))
}

async fn get_forum_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Forum>> {
    let row = sqlx::query(
        "SELECT id, slug, title, description, is_private, created_at FROM forums WHERE slug = ?",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get forum by slug")?;

    Ok(row.as_ref().map(row_to_forum_sqlite))
}

fn row_to_forum_sqlite(row: &sqlx::sqlite::SqliteRow) -> Forum {
    Forum {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        is_private: row.get("is_private"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// PostgreSQL implementations
// ============================================================================

async fn list_forums_postgres(pool: &PgPool) -> Result<Vec<ForumSummary>> {
    // Same shape as the SQLite query; subqueries are portable here
    let rows = sqlx::query(FORUM_SUMMARY_SQL_SQLITE)
        .fetch_all(pool)
        .await
        .context("Failed to list forums")?;

    Ok(rows
        .iter()
        .map(|row| ForumSummary {
            forum: row_to_forum_postgres(row),
            topic_count: row.get("topic_count"),
            post_count: row.get("post_count"),
            latest_post_at: row.get("latest_post_at"),
        })
        .collect())
}

async fn get_forum_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<Forum>> {
    let row = sqlx::query(
        "SELECT id, slug, title, description, is_private, created_at FROM forums WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get forum by ID")?;

    Ok(row.as_ref().map(row_to_forum_postgres))
}

async fn get_forum_by_slug_postgres(pool: &PgPool, slug: &str) -> Result<Option<Forum>> {
    let row = sqlx::query(
        "SELECT id, slug, title, description, is_private, created_at FROM forums WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get forum by slug")?;

    Ok(row.as_ref().map(row_to_forum_postgres))
}

fn row_to_forum_postgres(row: &sqlx::postgres::PgRow) -> Forum {
    Forum {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        is_private: row.get("is_private"),
        created_at: row.get("created_at"),
    }
}
