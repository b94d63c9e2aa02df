//! Resource repository
//!
//! Database operations for the resource library.
//!
//! This module provides:
//! - `ResourceRepository` trait defining the interface for resource data access
//! - `SqlxResourceRepository` implementing the trait for SQLite and PostgreSQL
//!
//! The `tags`, `metadata`, and `citations` columns are JSON text, parsed by
//! the row mappers so both drivers share the same row handling.

use crate::config::DatabaseDriver;
use crate::db::repositories::{parse_json_object, parse_string_list, to_json_text};
use crate::db::DynDatabasePool;
use crate::models::{
    CreateResourceInput, ListParams, PagedResult, Resource, ResourceKind, ResourceStatus,
    UpdateResourceInput,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

const RESOURCE_COLUMNS: &str = "id, title, description, content, content_html, kind, tags, \
     author_id, status, metadata, citations, views, downloads, created_at, updated_at";

/// Resource repository trait
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Create a new resource, returning the stored row
    async fn create(&self, input: &CreateResourceInput, content_html: &str) -> Result<Resource>;

    /// Get resource by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Resource>>;

    /// List published resources, optionally filtered by kind, newest first
    async fn list_published(
        &self,
        kind: Option<ResourceKind>,
        params: &ListParams,
    ) -> Result<PagedResult<Resource>>;

    /// List all resources by an author, newest first
    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Resource>>;

    /// Apply a partial update; returns the updated row, or None if absent
    async fn update(&self, id: i64, input: &UpdateResourceInput) -> Result<Option<Resource>>;

    /// Delete a resource; returns true if a row was removed
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Search published resources by case-insensitive title/description match
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Resource>>;

    /// Increment the view counter; returns false if the resource is absent
    async fn increment_views(&self, id: i64) -> Result<bool>;

    /// Increment the download counter; returns false if the resource is absent
    async fn increment_downloads(&self, id: i64) -> Result<bool>;
}

/// SQLx-based resource repository implementation
///
/// Supports both SQLite and PostgreSQL databases.
pub struct SqlxResourceRepository {
    pool: DynDatabasePool,
}

impl SqlxResourceRepository {
    /// Create a new SQLx resource repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ResourceRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ResourceRepository for SqlxResourceRepository {
    async fn create(&self, input: &CreateResourceInput, content_html: &str) -> Result<Resource> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_resource_sqlite(self.pool.as_sqlite().unwrap(), input, content_html).await
            }
            DatabaseDriver::Postgres => {
                create_resource_postgres(self.pool.as_postgres().unwrap(), input, content_html)
                    .await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Resource>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_resource_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Postgres => {
                get_resource_by_id_postgres(self.pool.as_postgres().unwrap(), id).await
            }
        }
    }

    async fn list_published(
        &self,
        kind: Option<ResourceKind>,
        params: &ListParams,
    ) -> Result<PagedResult<Resource>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_published_sqlite(self.pool.as_sqlite().unwrap(), kind, params).await
            }
            DatabaseDriver::Postgres => {
                list_published_postgres(self.pool.as_postgres().unwrap(), kind, params).await
            }
        }
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Resource>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_author_sqlite(self.pool.as_sqlite().unwrap(), author_id).await
            }
            DatabaseDriver::Postgres => {
                list_by_author_postgres(self.pool.as_postgres().unwrap(), author_id).await
            }
        }
    }

    async fn update(&self, id: i64, input: &UpdateResourceInput) -> Result<Option<Resource>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_resource_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Postgres => {
                update_resource_postgres(self.pool.as_postgres().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_resource_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Postgres => {
                delete_resource_postgres(self.pool.as_postgres().unwrap(), id).await
            }
        }
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Resource>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                search_resources_sqlite(self.pool.as_sqlite().unwrap(), query, limit).await
            }
            DatabaseDriver::Postgres => {
                search_resources_postgres(self.pool.as_postgres().unwrap(), query, limit).await
            }
        }
    }

    async fn increment_views(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                increment_counter_sqlite(self.pool.as_sqlite().unwrap(), id, "views").await
            }
            DatabaseDriver::Postgres => {
                increment_counter_postgres(self.pool.as_postgres().unwrap(), id, "views").await
            }
        }
    }

    async fn increment_downloads(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                increment_counter_sqlite(self.pool.as_sqlite().unwrap(), id, "downloads").await
            }
            DatabaseDriver::Postgres => {
                increment_counter_postgres(self.pool.as_postgres().unwrap(), id, "downloads").await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_resource_sqlite(
    pool: &SqlitePool,
    input: &CreateResourceInput,
    content_html: &str,
) -> Result<Resource> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();
    let metadata = input.metadata.clone().unwrap_or_else(|| serde_json::json!({}));

    let result = sqlx::query(
        r#"
        INSERT INTO resources
            (title, description, content, content_html, kind, tags, author_id,
             status, metadata, citations, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.content)
    .bind(content_html)
    .bind(input.kind.as_str())
    .bind(to_json_text(&input.tags))
    .bind(input.author_id)
    .bind(status.as_str())
    .bind(metadata.to_string())
    .bind(to_json_text(&input.citations))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create resource")?;

    let id = result.last_insert_rowid();
    get_resource_by_id_sqlite(pool, id)
        .await?
        .context("Created resource not found")
}

async fn get_resource_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Resource>> {
    let sql = format!("SELECT {} FROM resources WHERE id = ?", RESOURCE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get resource by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_resource_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_published_sqlite(
    pool: &SqlitePool,
    kind: Option<ResourceKind>,
    params: &ListParams,
) -> Result<PagedResult<Resource>> {
    let (rows, total) = match kind {
        Some(kind) => {
            let sql = format!(
                "SELECT {} FROM resources WHERE status = 'published' AND kind = ? \
                 ORDER BY created_at DESC LIMIT ? OFFSET ?",
                RESOURCE_COLUMNS
            );
            let rows = sqlx::query(&sql)
                .bind(kind.as_str())
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(pool)
                .await
                .context("Failed to list resources")?;

            let count_row = sqlx::query(
                "SELECT COUNT(*) as count FROM resources WHERE status = 'published' AND kind = ?",
            )
            .bind(kind.as_str())
            .fetch_one(pool)
            .await
            .context("Failed to count resources")?;
            let total: i64 = count_row.get("count");
            (rows, total)
        }
        None => {
            let sql = format!(
                "SELECT {} FROM resources WHERE status = 'published' \
                 ORDER BY created_at DESC LIMIT ? OFFSET ?",
                RESOURCE_COLUMNS
            );
            let rows = sqlx::query(&sql)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(pool)
                .await
                .context("Failed to list resources")?;

            let count_row =
                sqlx::query("SELECT COUNT(*) as count FROM resources WHERE status = 'published'")
                    .fetch_one(pool)
                    .await
                    .context("Failed to count resources")?;
            let total: i64 = count_row.get("count");
            (rows, total)
        }
    };

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(row_to_resource_sqlite(row)?);
    }

    Ok(PagedResult::new(items, total, params))
}

async fn list_by_author_sqlite(pool: &SqlitePool, author_id: i64) -> Result<Vec<Resource>> {
    let sql = format!(
        "SELECT {} FROM resources WHERE author_id = ? ORDER BY created_at DESC",
        RESOURCE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(author_id)
        .fetch_all(pool)
        .await
        .context("Failed to list resources by author")?;

    rows.iter().map(row_to_resource_sqlite).collect()
}

async fn update_resource_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateResourceInput,
) -> Result<Option<Resource>> {
    let existing = match get_resource_by_id_sqlite(pool, id).await? {
        Some(resource) => resource,
        None => return Ok(None),
    };

    let merged = merge_update(&existing, input);

    sqlx::query(
        r#"
        UPDATE resources
        SET title = ?, description = ?, content = ?, content_html = ?, kind = ?,
            tags = ?, status = ?, metadata = ?, citations = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&merged.title)
    .bind(&merged.description)
    .bind(&merged.content)
    .bind(&merged.content_html)
    .bind(merged.kind.as_str())
    .bind(to_json_text(&merged.tags))
    .bind(merged.status.as_str())
    .bind(merged.metadata.to_string())
    .bind(to_json_text(&merged.citations))
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update resource")?;

    get_resource_by_id_sqlite(pool, id).await
}

async fn delete_resource_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM resources WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete resource")?;

    Ok(result.rows_affected() > 0)
}

async fn search_resources_sqlite(
    pool: &SqlitePool,
    query: &str,
    limit: i64,
) -> Result<Vec<Resource>> {
    let pattern = format!("%{}%", super::escape_like(&query.to_lowercase()));
    let sql = format!(
        "SELECT {} FROM resources \
         WHERE status = 'published' \
           AND (LOWER(title) LIKE ? ESCAPE '\\' OR LOWER(description) LIKE ? ESCAPE '\\') \
         ORDER BY created_at DESC LIMIT ?",
        RESOURCE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to search resources")?;

    rows.iter().map(row_to_resource_sqlite).collect()
}

async fn increment_counter_sqlite(pool: &SqlitePool, id: i64, column: &str) -> Result<bool> {
    // column is a compile-time constant ("views" or "downloads"), never user input
    let sql = format!(
        "UPDATE resources SET {column} = {column} + 1 WHERE id = ?",
        column = column
    );
    let result = sqlx::query(&sql)
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to increment resource {}", column))?;

    Ok(result.rows_affected() > 0)
}

fn row_to_resource_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Resource> {
    let kind: String = row.get("kind");
    let status: String = row.get("status");
    let tags: String = row.get("tags");
    let metadata: String = row.get("metadata");
    let citations: String = row.get("citations");

    Ok(Resource {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        kind: ResourceKind::from_str(&kind)
            .with_context(|| format!("Invalid resource kind: {}", kind))?,
        tags: parse_string_list(&tags),
        author_id: row.get("author_id"),
        status: ResourceStatus::from_str(&status)
            .with_context(|| format!("Invalid resource status: {}", status))?,
        metadata: parse_json_object(&metadata),
        citations: parse_string_list(&citations),
        views: row.get("views"),
        downloads: row.get("downloads"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// PostgreSQL implementations
// ============================================================================

async fn create_resource_postgres(
    pool: &PgPool,
    input: &CreateResourceInput,
    content_html: &str,
) -> Result<Resource> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();
    let metadata = input.metadata.clone().unwrap_or_else(|| serde_json::json!({}));

    let sql = format!(
        r#"
        INSERT INTO resources
            (title, description, content, content_html, kind, tags, author_id,
             status, metadata, citations, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {}
        "#,
        RESOURCE_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.content)
        .bind(content_html)
        .bind(input.kind.as_str())
        .bind(to_json_text(&input.tags))
        .bind(input.author_id)
        .bind(status.as_str())
        .bind(metadata.to_string())
        .bind(to_json_text(&input.citations))
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("Failed to create resource")?;

    row_to_resource_postgres(&row)
}

async fn get_resource_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<Resource>> {
    let sql = format!("SELECT {} FROM resources WHERE id = $1", RESOURCE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get resource by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_resource_postgres(&row)?)),
        None => Ok(None),
    }
}

async fn list_published_postgres(
    pool: &PgPool,
    kind: Option<ResourceKind>,
    params: &ListParams,
) -> Result<PagedResult<Resource>> {
    let (rows, total) = match kind {
        Some(kind) => {
            let sql = format!(
                "SELECT {} FROM resources WHERE status = 'published' AND kind = $1 \
                 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                RESOURCE_COLUMNS
            );
            let rows = sqlx::query(&sql)
                .bind(kind.as_str())
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(pool)
                .await
                .context("Failed to list resources")?;

            let count_row = sqlx::query(
                "SELECT COUNT(*) as count FROM resources WHERE status = 'published' AND kind = $1",
            )
            .bind(kind.as_str())
            .fetch_one(pool)
            .await
            .context("Failed to count resources")?;
            let total: i64 = count_row.get("count");
            (rows, total)
        }
        None => {
            let sql = format!(
                "SELECT {} FROM resources WHERE status = 'published' \
                 ORDER BY created_at DESC LIMIT $1 OFFSET $2",
                RESOURCE_COLUMNS
            );
            let rows = sqlx::query(&sql)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(pool)
                .await
                .context("Failed to list resources")?;

            let count_row =
                sqlx::query("SELECT COUNT(*) as count FROM resources WHERE status = 'published'")
                    .fetch_one(pool)
                    .await
                    .context("Failed to count resources")?;
            let total: i64 = count_row.get("count");
            (rows, total)
        }
    };

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(row_to_resource_postgres(row)?);
    }

    Ok(PagedResult::new(items, total, params))
}

async fn list_by_author_postgres(pool: &PgPool, author_id: i64) -> Result<Vec<Resource>> {
    let sql = format!(
        "SELECT {} FROM resources WHERE author_id = $1 ORDER BY created_at DESC",
        RESOURCE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(author_id)
        .fetch_all(pool)
        .await
        .context("Failed to list resources by author")?;

    rows.iter().map(row_to_resource_postgres).collect()
}

async fn update_resource_postgres(
    pool: &PgPool,
    id: i64,
    input: &UpdateResourceInput,
) -> Result<Option<Resource>> {
    let existing = match get_resource_by_id_postgres(pool, id).await? {
        Some(resource) => resource,
        None => return Ok(None),
    };

    let merged = merge_update(&existing, input);

    let sql = format!(
        r#"
        UPDATE resources
        SET title = $1, description = $2, content = $3, content_html = $4, kind = $5,
            tags = $6, status = $7, metadata = $8, citations = $9, updated_at = $10
        WHERE id = $11
        RETURNING {}
        "#,
        RESOURCE_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(&merged.title)
        .bind(&merged.description)
        .bind(&merged.content)
        .bind(&merged.content_html)
        .bind(merged.kind.as_str())
        .bind(to_json_text(&merged.tags))
        .bind(merged.status.as_str())
        .bind(merged.metadata.to_string())
        .bind(to_json_text(&merged.citations))
        .bind(Utc::now())
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to update resource")?;

    Ok(Some(row_to_resource_postgres(&row)?))
}

async fn delete_resource_postgres(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM resources WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete resource")?;

    Ok(result.rows_affected() > 0)
}

async fn search_resources_postgres(pool: &PgPool, query: &str, limit: i64) -> Result<Vec<Resource>> {
    let pattern = format!("%{}%", super::escape_like(query));
    let sql = format!(
        "SELECT {} FROM resources \
         WHERE status = 'published' \
           AND (title ILIKE $1 ESCAPE '\\' OR description ILIKE $1 ESCAPE '\\') \
         ORDER BY created_at DESC LIMIT $2",
        RESOURCE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to search resources")?;

    rows.iter().map(row_to_resource_postgres).collect()
}

async fn increment_counter_postgres(pool: &PgPool, id: i64, column: &str) -> Result<bool> {
    let sql = format!(
        "UPDATE resources SET {column} = {column} + 1 WHERE id = $1",
        column = column
    );
    let result = sqlx::query(&sql)
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to increment resource {}", column))?;

    Ok(result.rows_affected() > 0)
}

fn row_to_resource_postgres(row: &sqlx::postgres::PgRow) -> Result<Resource> {
    let kind: String = row.get("kind");
    let status: String = row.get("status");
    let tags: String = row.get("tags");
    let metadata: String = row.get("metadata");
    let citations: String = row.get("citations");

    Ok(Resource {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        kind: ResourceKind::from_str(&kind)
            .with_context(|| format!("Invalid resource kind: {}", kind))?,
        tags: parse_string_list(&tags),
        author_id: row.get("author_id"),
        status: ResourceStatus::from_str(&status)
            .with_context(|| format!("Invalid resource status: {}", status))?,
        metadata: parse_json_object(&metadata),
        citations: parse_string_list(&citations),
        views: row.get("views"),
        downloads: row.get("downloads"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Overlay the optional update fields onto an existing resource
fn merge_update(existing: &Resource, input: &UpdateResourceInput) -> Resource {
    let mut merged = existing.clone();
    if let Some(title) = &input.title {
        merged.title = title.clone();
    }
    if let Some(description) = &input.description {
        merged.description = description.clone();
    }
    if let Some(content) = &input.content {
        merged.content = content.clone();
    }
    if let Some(content_html) = &input.content_html {
        merged.content_html = content_html.clone();
    }
    if let Some(kind) = input.kind {
        merged.kind = kind;
    }
    if let Some(tags) = &input.tags {
        merged.tags = tags.clone();
    }
    if let Some(status) = input.status {
        merged.status = status;
    }
    if let Some(metadata) = &input.metadata {
        merged.metadata = metadata.clone();
    }
    if let Some(citations) = &input.citations {
        merged.citations = citations.clone();
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxResourceRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxResourceRepository::new(pool.clone());
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

    fn test_input(title: &str, kind: ResourceKind) -> CreateResourceInput {
        CreateResourceInput::new(
            title.to_string(),
            "A short description".to_string(),
            "# Heading\n\nSome content.".to_string(),
            kind,
            1,
        )
    }

    #[tokio::test]
    async fn test_create_and_get_resource() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let input = test_input("Focus basics", ResourceKind::Article)
            .with_tags(vec!["focus".to_string(), "basics".to_string()]);
        let created = repo
            .create(&input, "<h1>Heading</h1>")
            .await
            .expect("Failed to create resource");

        assert!(created.id > 0);
        assert_eq!(created.title, "Focus basics");
        assert_eq!(created.kind, ResourceKind::Article);
        assert_eq!(created.status, ResourceStatus::Draft);
        assert_eq!(created.tags, vec!["focus", "basics"]);
        assert_eq!(created.views, 0);
        assert_eq!(created.downloads, 0);

        let fetched = repo
            .get_by_id(created.id)
            .await
            .unwrap()
            .expect("Resource not found");
        assert_eq!(fetched.title, created.title);
        assert_eq!(fetched.content_html, "<h1>Heading</h1>");
    }

    #[tokio::test]
    async fn test_list_published_excludes_drafts() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        repo.create(&test_input("Draft one", ResourceKind::Article), "<p></p>")
            .await
            .unwrap();
        repo.create(
            &test_input("Published one", ResourceKind::Article)
                .with_status(ResourceStatus::Published),
            "<p></p>",
        )
        .await
        .unwrap();

        let page = repo
            .list_published(None, &ListParams::default())
            .await
            .expect("Failed to list");

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Published one");
    }

    #[tokio::test]
    async fn test_list_published_kind_filter() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        repo.create(
            &test_input("Guide", ResourceKind::Guide).with_status(ResourceStatus::Published),
            "<p></p>",
        )
        .await
        .unwrap();
        repo.create(
            &test_input("Video", ResourceKind::Video).with_status(ResourceStatus::Published),
            "<p></p>",
        )
        .await
        .unwrap();

        let page = repo
            .list_published(Some(ResourceKind::Guide), &ListParams::default())
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].kind, ResourceKind::Guide);
    }

    #[tokio::test]
    async fn test_update_resource() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let created = repo
            .create(&test_input("Original", ResourceKind::Article), "<p></p>")
            .await
            .unwrap();

        let update = UpdateResourceInput::new()
            .with_title("Updated".to_string())
            .with_status(ResourceStatus::Published);
        let updated = repo
            .update(created.id, &update)
            .await
            .unwrap()
            .expect("Resource not found");

        assert_eq!(updated.title, "Updated");
        assert_eq!(updated.status, ResourceStatus::Published);
        // Unchanged fields survive
        assert_eq!(updated.description, created.description);
    }

    #[tokio::test]
    async fn test_update_missing_resource_returns_none() {
        let (_pool, repo) = setup_test_repo().await;

        let update = UpdateResourceInput::new().with_title("Nope".to_string());
        let result = repo.update(999, &update).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_resource() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let created = repo
            .create(&test_input("Doomed", ResourceKind::Article), "<p></p>")
            .await
            .unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(!repo.delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_search_matches_title_and_description() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        repo.create(
            &test_input("Pomodoro technique", ResourceKind::Guide)
                .with_status(ResourceStatus::Published),
            "<p></p>",
        )
        .await
        .unwrap();
        repo.create(
            &test_input("Unrelated", ResourceKind::Article).with_status(ResourceStatus::Published),
            "<p></p>",
        )
        .await
        .unwrap();

        let results = repo.search("pomodoro", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Pomodoro technique");

        // Case-insensitive
        let results = repo.search("POMODORO", 10).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        repo.create(
            &test_input("Pomodoro technique", ResourceKind::Guide)
                .with_status(ResourceStatus::Published),
            "<p></p>",
        )
        .await
        .unwrap();
        repo.create(
            &test_input("100% focus plan", ResourceKind::Article)
                .with_status(ResourceStatus::Published),
            "<p></p>",
        )
        .await
        .unwrap();

        // A bare "%" is a literal character, not match-everything
        let results = repo.search("%", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "100% focus plan");

        // "_" must not act as a single-character wildcard
        assert!(repo.search("P_modoro", 10).await.unwrap().is_empty());

        assert!(repo.search("\\", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_increment_counters() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let created = repo
            .create(&test_input("Counted", ResourceKind::Worksheet), "<p></p>")
            .await
            .unwrap();

        assert!(repo.increment_views(created.id).await.unwrap());
        assert!(repo.increment_views(created.id).await.unwrap());
        assert!(repo.increment_downloads(created.id).await.unwrap());

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.views, 2);
        assert_eq!(fetched.downloads, 1);

        // Missing resource reports false rather than erroring
        assert!(!repo.increment_views(999).await.unwrap());
    }
}
