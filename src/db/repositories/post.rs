//! Post repository
//!
//! Database operations for forum replies. Posts within a topic list in
//! chronological order.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreatePostInput, ForumPost};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

const POST_COLUMNS: &str = "id, topic_id, author_id, content, created_at";

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// List posts in a topic, oldest first
    async fn list_by_topic(&self, topic_id: i64) -> Result<Vec<ForumPost>>;

    /// Create a new post
    async fn create(
        &self,
        topic_id: i64,
        author_id: i64,
        input: &CreatePostInput,
    ) -> Result<ForumPost>;

    /// Count posts in a topic
    async fn count_by_topic(&self, topic_id: i64) -> Result<i64>;

    /// Most recent posts by an author
    async fn recent_by_author(&self, author_id: i64, limit: i64) -> Result<Vec<ForumPost>>;
}

/// SQLx-based post repository implementation
///
/// Supports both SQLite and PostgreSQL databases.
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn list_by_topic(&self, topic_id: i64) -> Result<Vec<ForumPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_posts_sqlite(self.pool.as_sqlite().unwrap(), topic_id).await
            }
            DatabaseDriver::Postgres => {
                list_posts_postgres(self.pool.as_postgres().unwrap(), topic_id).await
            }
        }
    }

    async fn create(
        &self,
        topic_id: i64,
        author_id: i64,
        input: &CreatePostInput,
    ) -> Result<ForumPost> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_post_sqlite(self.pool.as_sqlite().unwrap(), topic_id, author_id, input)
                    .await
            }
            DatabaseDriver::Postgres => {
                create_post_postgres(self.pool.as_postgres().unwrap(), topic_id, author_id, input)
                    .await
            }
        }
    }

    async fn count_by_topic(&self, topic_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_posts_sqlite(self.pool.as_sqlite().unwrap(), topic_id).await
            }
            DatabaseDriver::Postgres => {
                count_posts_postgres(self.pool.as_postgres().unwrap(), topic_id).await
            }
        }
    }

    async fn recent_by_author(&self, author_id: i64, limit: i64) -> Result<Vec<ForumPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                recent_by_author_sqlite(self.pool.as_sqlite().unwrap(), author_id, limit).await
            }
            DatabaseDriver::Postgres => {
                recent_by_author_postgres(self.pool.as_postgres().unwrap(), author_id, limit).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_posts_sqlite(pool: &SqlitePool, topic_id: i64) -> Result<Vec<ForumPost>> {
    let sql = format!(
        "SELECT {} FROM forum_posts WHERE topic_id = ? ORDER BY created_at ASC, id ASC",
        POST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(topic_id)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    Ok(rows.iter().map(row_to_post_sqlite).collect())
}

async fn create_post_sqlite(
    pool: &SqlitePool,
    topic_id: i64,
    author_id: i64,
    input: &CreatePostInput,
) -> Result<ForumPost> {
    let result = sqlx::query(
        "INSERT INTO forum_posts (topic_id, author_id, content, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(topic_id)
    .bind(author_id)
    .bind(&input.content)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to create post")?;

    let id = result.last_insert_rowid();
    let sql = format!("SELECT {} FROM forum_posts WHERE id = ?", POST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Created post not found")?;

    Ok(row_to_post_sqlite(&row))
}

async fn count_posts_sqlite(pool: &SqlitePool, topic_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM forum_posts WHERE topic_id = ?")
        .bind(topic_id)
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;

    Ok(row.get("count"))
}

async fn recent_by_author_sqlite(
    pool: &SqlitePool,
    author_id: i64,
    limit: i64,
) -> Result<Vec<ForumPost>> {
    let sql = format!(
        "SELECT {} FROM forum_posts WHERE author_id = ? \
         ORDER BY created_at DESC, id DESC LIMIT ?",
        POST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(author_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list posts by author")?;

    Ok(rows.iter().map(row_to_post_sqlite).collect())
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> ForumPost {
    ForumPost {
        id: row.get("id"),
        topic_id: row.get("topic_id"),
        author_id: row.get("author_id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// PostgreSQL implementations
// ============================================================================

async fn list_posts_postgres(pool: &PgPool, topic_id: i64) -> Result<Vec<ForumPost>> {
    let sql = format!(
        "SELECT {} FROM forum_posts WHERE topic_id = $1 ORDER BY created_at ASC, id ASC",
        POST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(topic_id)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    Ok(rows.iter().map(row_to_post_postgres).collect())
}

async fn create_post_postgres(
    pool: &PgPool,
    topic_id: i64,
    author_id: i64,
    input: &CreatePostInput,
) -> Result<ForumPost> {
    let sql = format!(
        "INSERT INTO forum_posts (topic_id, author_id, content, created_at) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        POST_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(topic_id)
        .bind(author_id)
        .bind(&input.content)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .context("Failed to create post")?;

    Ok(row_to_post_postgres(&row))
}

async fn count_posts_postgres(pool: &PgPool, topic_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM forum_posts WHERE topic_id = $1")
        .bind(topic_id)
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;

    Ok(row.get("count"))
}

async fn recent_by_author_postgres(
    pool: &PgPool,
    author_id: i64,
    limit: i64,
) -> Result<Vec<ForumPost>> {
    let sql = format!(
        "SELECT {} FROM forum_posts WHERE author_id = $1 \
         ORDER BY created_at DESC, id DESC LIMIT $2",
        POST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(author_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list posts by author")?;

    Ok(rows.iter().map(row_to_post_postgres).collect())
}

fn row_to_post_postgres(row: &sqlx::postgres::PgRow) -> ForumPost {
    ForumPost {
        id: row.get("id"),
        topic_id: row.get("topic_id"),
        author_id: row.get("author_id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::forum::{ForumRepository, SqlxForumRepository};
    use crate::db::repositories::topic::{SqlxTopicRepository, TopicRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateTopicInput;

    async fn setup() -> (DynDatabasePool, SqlxPostRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        create_test_user(&pool, 1).await;

        let forums = SqlxForumRepository::new(pool.clone());
        let forum = forums
            .get_by_slug("general-support")
            .await
            .unwrap()
            .expect("Seeded forum missing");

        let topics = SqlxTopicRepository::new(pool.clone());
        let topic = topics
            .create(
                forum.id,
                1,
                &CreateTopicInput {
                    title: "Thread".to_string(),
                    content: "Opening post".to_string(),
                },
            )
            .await
            .unwrap();

        let repo = SqlxPostRepository::new(pool.clone());
        (pool, repo, topic.id)
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

    fn post_input(content: &str) -> CreatePostInput {
        CreatePostInput {
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_posts_in_order() {
        let (_pool, repo, topic_id) = setup().await;

        repo.create(topic_id, 1, &post_input("First reply")).await.unwrap();
        repo.create(topic_id, 1, &post_input("Second reply")).await.unwrap();

        let posts = repo.list_by_topic(topic_id).await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].content, "First reply");
        assert_eq!(posts[1].content, "Second reply");
    }

    #[tokio::test]
    async fn test_count_by_topic() {
        let (_pool, repo, topic_id) = setup().await;

        assert_eq!(repo.count_by_topic(topic_id).await.unwrap(), 0);
        repo.create(topic_id, 1, &post_input("Reply")).await.unwrap();
        assert_eq!(repo.count_by_topic(topic_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_post_on_missing_topic_fails() {
        let (_pool, repo, _topic_id) = setup().await;

        let result = repo.create(999, 1, &post_input("Orphan")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_recent_by_author() {
        let (pool, repo, topic_id) = setup().await;
        create_test_user(&pool, 2).await;

        repo.create(topic_id, 1, &post_input("Mine")).await.unwrap();
        repo.create(topic_id, 2, &post_input("Theirs")).await.unwrap();

        let recent = repo.recent_by_author(1, 5).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].content, "Mine");
    }
}
