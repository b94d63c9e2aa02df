//! Topic repository
//!
//! Database operations for forum topics. Listings return summaries with
//! reply aggregates; pinned topics sort before the rest, newest first
//! within each group.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateTopicInput, ForumTopic, TopicSummary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

const TOPIC_COLUMNS: &str =
    "id, forum_id, author_id, title, content, is_pinned, is_locked, created_at, updated_at";

/// Topic repository trait
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// List topics in a forum with reply aggregates, pinned first then newest
    async fn list_by_forum(&self, forum_id: i64) -> Result<Vec<TopicSummary>>;

    /// Get topic by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<ForumTopic>>;

    /// Create a new topic
    async fn create(
        &self,
        forum_id: i64,
        author_id: i64,
        input: &CreateTopicInput,
    ) -> Result<ForumTopic>;

    /// Most recent topics started by an author
    async fn recent_by_author(&self, author_id: i64, limit: i64) -> Result<Vec<ForumTopic>>;

    /// Set the pinned flag; returns false if the topic is absent
    async fn set_pinned(&self, id: i64, pinned: bool) -> Result<bool>;

    /// Set the locked flag; returns false if the topic is absent
    async fn set_locked(&self, id: i64, locked: bool) -> Result<bool>;
}

/// SQLx-based topic repository implementation
///
/// Supports both SQLite and PostgreSQL databases.
pub struct SqlxTopicRepository {
    pool: DynDatabasePool,
}

impl SqlxTopicRepository {
    /// Create a new SQLx topic repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TopicRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TopicRepository for SqlxTopicRepository {
    async fn list_by_forum(&self, forum_id: i64) -> Result<Vec<TopicSummary>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_topics_sqlite(self.pool.as_sqlite().unwrap(), forum_id).await
            }
            DatabaseDriver::Postgres => {
                list_topics_postgres(self.pool.as_postgres().unwrap(), forum_id).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ForumTopic>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_topic_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Postgres => {
                get_topic_by_id_postgres(self.pool.as_postgres().unwrap(), id).await
            }
        }
    }

    async fn create(
        &self,
        forum_id: i64,
        author_id: i64,
        input: &CreateTopicInput,
    ) -> Result<ForumTopic> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_topic_sqlite(self.pool.as_sqlite().unwrap(), forum_id, author_id, input)
                    .await
            }
            DatabaseDriver::Postgres => {
                create_topic_postgres(self.pool.as_postgres().unwrap(), forum_id, author_id, input)
                    .await
            }
        }
    }

    async fn recent_by_author(&self, author_id: i64, limit: i64) -> Result<Vec<ForumTopic>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                recent_by_author_sqlite(self.pool.as_sqlite().unwrap(), author_id, limit).await
            }
            DatabaseDriver::Postgres => {
                recent_by_author_postgres(self.pool.as_postgres().unwrap(), author_id, limit).await
            }
        }
    }

    async fn set_pinned(&self, id: i64, pinned: bool) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_flag_sqlite(self.pool.as_sqlite().unwrap(), id, "is_pinned", pinned).await
            }
            DatabaseDriver::Postgres => {
                set_flag_postgres(self.pool.as_postgres().unwrap(), id, "is_pinned", pinned).await
            }
        }
    }

    async fn set_locked(&self, id: i64, locked: bool) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_flag_sqlite(self.pool.as_sqlite().unwrap(), id, "is_locked", locked).await
            }
            DatabaseDriver::Postgres => {
                set_flag_postgres(self.pool.as_postgres().unwrap(), id, "is_locked", locked).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_topics_sqlite(pool: &SqlitePool, forum_id: i64) -> Result<Vec<TopicSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.forum_id, t.author_id, t.title, t.content,
               t.is_pinned, t.is_locked, t.created_at, t.updated_at,
               (SELECT COUNT(*) FROM forum_posts p WHERE p.topic_id = t.id) AS reply_count,
               (SELECT MAX(p.created_at) FROM forum_posts p WHERE p.topic_id = t.id)
                   AS latest_reply_at,
               (SELECT COALESCE(pr.display_name, u.username)
                  FROM forum_posts p
                  JOIN users u ON u.id = p.author_id
                  LEFT JOIN user_profiles pr ON pr.user_id = u.id
                 WHERE p.topic_id = t.id
                 ORDER BY p.created_at DESC, p.id DESC
                 LIMIT 1) AS latest_reply_author
        FROM forum_topics t
        WHERE t.forum_id = ?
        ORDER BY t.is_pinned DESC, t.created_at DESC, t.id DESC
        "#,
    )
    .bind(forum_id)
    .fetch_all(pool)
    .await
    .context("Failed to list topics")?;

    Ok(rows
        .iter()
        .map(|row| TopicSummary {
            topic: row_to_topic_sqlite(row),
            reply_count: row.get("reply_count"),
            latest_reply_at: row.get("latest_reply_at"),
            latest_reply_author: row.get("latest_reply_author"),
        })
        .collect())
}

async fn get_topic_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<ForumTopic>> {
    let sql = format!("SELECT {} FROM forum_topics WHERE id = ?", TOPIC_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get topic by ID")?;

    Ok(row.as_ref().map(row_to_topic_sqlite))
}

async fn create_topic_sqlite(
    pool: &SqlitePool,
    forum_id: i64,
    author_id: i64,
    input: &CreateTopicInput,
) -> Result<ForumTopic> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO forum_topics (forum_id, author_id, title, content, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(forum_id)
    .bind(author_id)
    .bind(&input.title)
    .bind(&input.content)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create topic")?;

    let id = result.last_insert_rowid();
    get_topic_by_id_sqlite(pool, id)
        .await?
        .context("Created topic not found")
}

async fn recent_by_author_sqlite(
    pool: &SqlitePool,
    author_id: i64,
    limit: i64,
) -> Result<Vec<ForumTopic>> {
    let sql = format!(
        "SELECT {} FROM forum_topics WHERE author_id = ? \
         ORDER BY created_at DESC, id DESC LIMIT ?",
        TOPIC_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(author_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list topics by author")?;

    Ok(rows.iter().map(row_to_topic_sqlite).collect())
}

async fn set_flag_sqlite(pool: &SqlitePool, id: i64, column: &str, value: bool) -> Result<bool> {
    // column is a compile-time constant ("is_pinned" or "is_locked")
    let sql = format!("UPDATE forum_topics SET {} = ?, updated_at = ? WHERE id = ?", column);
    let result = sqlx::query(&sql)
        .bind(value)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to set topic {}", column))?;

    Ok(result.rows_affected() > 0)
}

fn row_to_topic_sqlite(row: &sqlx::sqlite::SqliteRow) -> ForumTopic {
    ForumTopic {
        id: row.get("id"),
        forum_id: row.get("forum_id"),
        author_id: row.get("author_id"),
        title: row.get("title"),
        content: row.get("content"),
        is_pinned: row.get("is_pinned"),
        is_locked: row.get("is_locked"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// PostgreSQL implementations
// ============================================================================

async fn list_topics_postgres(pool: &PgPool, forum_id: i64) -> Result<Vec<TopicSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.forum_id, t.author_id, t.title, t.content,
               t.is_pinned, t.is_locked, t.created_at, t.updated_at,
               (SELECT COUNT(*) FROM forum_posts p WHERE p.topic_id = t.id) AS reply_count,
               (SELECT MAX(p.created_at) FROM forum_posts p WHERE p.topic_id = t.id)
                   AS latest_reply_at,
               (SELECT COALESCE(pr.display_name, u.username)
                  FROM forum_posts p
                  JOIN users u ON u.id = p.author_id
                  LEFT JOIN user_profiles pr ON pr.user_id = u.id
                 WHERE p.topic_id = t.id
                 ORDER BY p.created_at DESC, p.id DESC
                 LIMIT 1) AS latest_reply_author
        FROM forum_topics t
        WHERE t.forum_id = $1
        ORDER BY t.is_pinned DESC, t.created_at DESC, t.id DESC
        "#,
    )
    .bind(forum_id)
    .fetch_all(pool)
    .await
    .context("Failed to list topics")?;

    Ok(rows
        .iter()
        .map(|row| TopicSummary {
            topic: row_to_topic_postgres(row),
            reply_count: row.get("reply_count"),
            latest_reply_at: row.get("latest_reply_at"),
            latest_reply_author: row.get("latest_reply_author"),
        })
        .collect())
}

async fn get_topic_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<ForumTopic>> {
    let sql = format!("SELECT {} FROM forum_topics WHERE id = $1", TOPIC_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get topic by ID")?;

    Ok(row.as_ref().map(row_to_topic_postgres))
}

async fn create_topic_postgres(
    pool: &PgPool,
    forum_id: i64,
    author_id: i64,
    input: &CreateTopicInput,
) -> Result<ForumTopic> {
    let now = Utc::now();
    let sql = format!(
        r#"
        INSERT INTO forum_topics (forum_id, author_id, title, content, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {}
        "#,
        TOPIC_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(forum_id)
        .bind(author_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("Failed to create topic")?;

    Ok(row_to_topic_postgres(&row))
}

async fn recent_by_author_postgres(
    pool: &PgPool,
    author_id: i64,
    limit: i64,
) -> Result<Vec<ForumTopic>> {
    let sql = format!(
        "SELECT {} FROM forum_topics WHERE author_id = $1 \
         ORDER BY created_at DESC, id DESC LIMIT $2",
        TOPIC_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(author_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list topics by author")?;

    Ok(rows.iter().map(row_to_topic_postgres).collect())
}

async fn set_flag_postgres(pool: &PgPool, id: i64, column: &str, value: bool) -> Result<bool> {
    let sql = format!(
        "UPDATE forum_topics SET {} = $1, updated_at = $2 WHERE id = $3",
        column
    );
    let result = sqlx::query(&sql)
        .bind(value)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to set topic {}", column))?;

    Ok(result.rows_affected() > 0)
}

fn row_to_topic_postgres(row: &sqlx::postgres::PgRow) -> ForumTopic {
    ForumTopic {
        id: row.get("id"),
        forum_id: row.get("forum_id"),
        author_id: row.get("author_id"),
        title: row.get("title"),
        content: row.get("content"),
        is_pinned: row.get("is_pinned"),
        is_locked: row.get("is_locked"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
