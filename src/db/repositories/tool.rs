//! Tool repository
//!
//! Database operations for the tool directory and its reviews. Review
//! creation updates the tool's rating aggregates in the same transaction
//! so `rating_sum` / `rating_count` always match the review rows.

use crate::config::DatabaseDriver;
use crate::db::repositories::{parse_string_list, to_json_text};
use crate::db::DynDatabasePool;
use crate::models::{
    CreateReviewInput, CreateToolInput, ListParams, PagedResult, Tool, ToolReview, ToolStatus,
    UpdateToolInput,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

const TOOL_COLUMNS: &str = "id, name, description, categories, url, is_free, features, \
     setup_guide, integration_guide, author_id, status, rating_sum, rating_count, \
     created_at, updated_at";

const REVIEW_COLUMNS: &str = "id, tool_id, user_id, rating, review, helpful_count, created_at";

/// Tool repository trait
#[async_trait]
pub trait ToolRepository: Send + Sync {
    /// Create a new tool listing
    async fn create(&self, input: &CreateToolInput) -> Result<Tool>;

    /// Get tool by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tool>>;

    /// List active tools, optionally filtered by category, newest first
    async fn list_active(
        &self,
        category: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<Tool>>;

    /// List all tools by a submitting author, newest first
    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Tool>>;

    /// Apply a partial update; returns the updated row, or None if absent
    async fn update(&self, id: i64, input: &UpdateToolInput) -> Result<Option<Tool>>;

    /// Delete a tool; returns true if a row was removed
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List reviews for a tool, newest first
    async fn list_reviews(&self, tool_id: i64) -> Result<Vec<ToolReview>>;

    /// Get the review a user left on a tool, if any
    async fn get_review_by_tool_and_user(
        &self,
        tool_id: i64,
        user_id: i64,
    ) -> Result<Option<ToolReview>>;

    /// Insert a review and fold its rating into the tool's aggregates
    async fn create_review(
        &self,
        tool_id: i64,
        user_id: i64,
        input: &CreateReviewInput,
    ) -> Result<ToolReview>;

    /// Increment a review's helpful counter; returns false if absent
    async fn increment_helpful(&self, review_id: i64) -> Result<bool>;
}

/// SQLx-based tool repository implementation
///
/// Supports both SQLite and PostgreSQL databases.
pub struct SqlxToolRepository {
    pool: DynDatabasePool,
}

impl SqlxToolRepository {
    /// Create a new SQLx tool repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ToolRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ToolRepository for SqlxToolRepository {
    async fn create(&self, input: &CreateToolInput) -> Result<Tool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_tool_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Postgres => {
                create_tool_postgres(self.pool.as_postgres().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tool>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_tool_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Postgres => {
                get_tool_by_id_postgres(self.pool.as_postgres().unwrap(), id).await
            }
        }
    }

    async fn list_active(
        &self,
        category: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<Tool>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_active_sqlite(self.pool.as_sqlite().unwrap(), category, params).await
            }
            DatabaseDriver::Postgres => {
                list_active_postgres(self.pool.as_postgres().unwrap(), category, params).await
            }
        }
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Tool>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_author_sqlite(self.pool.as_sqlite().unwrap(), author_id).await
            }
            DatabaseDriver::Postgres => {
                list_by_author_postgres(self.pool.as_postgres().unwrap(), author_id).await
            }
        }
    }

    async fn update(&self, id: i64, input: &UpdateToolInput) -> Result<Option<Tool>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_tool_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Postgres => {
                update_tool_postgres(self.pool.as_postgres().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_tool_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Postgres => {
                delete_tool_postgres(self.pool.as_postgres().unwrap(), id).await
            }
        }
    }

    async fn list_reviews(&self, tool_id: i64) -> Result<Vec<ToolReview>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_reviews_sqlite(self.pool.as_sqlite().unwrap(), tool_id).await
            }
            DatabaseDriver::Postgres => {
                list_reviews_postgres(self.pool.as_postgres().unwrap(), tool_id).await
            }
        }
    }

    async fn get_review_by_tool_and_user(
        &self,
        tool_id: i64,
        user_id: i64,
    ) -> Result<Option<ToolReview>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_review_sqlite(self.pool.as_sqlite().unwrap(), tool_id, user_id).await
            }
            DatabaseDriver::Postgres => {
                get_review_postgres(self.pool.as_postgres().unwrap(), tool_id, user_id).await
            }
        }
    }

    async fn create_review(
        &self,
        tool_id: i64,
        user_id: i64,
        input: &CreateReviewInput,
    ) -> Result<ToolReview> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_review_sqlite(self.pool.as_sqlite().unwrap(), tool_id, user_id, input).await
            }
            DatabaseDriver::Postgres => {
                create_review_postgres(self.pool.as_postgres().unwrap(), tool_id, user_id, input)
                    .await
            }
        }
    }

    async fn increment_helpful(&self, review_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                increment_helpful_sqlite(self.pool.as_sqlite().unwrap(), review_id).await
            }
            DatabaseDriver::Postgres => {
                increment_helpful_postgres(self.pool.as_postgres().unwrap(), review_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_tool_sqlite(pool: &SqlitePool, input: &CreateToolInput) -> Result<Tool> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO tools
            (name, description, categories, url, is_free, features, setup_guide,
             integration_guide, author_id, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(to_json_text(&input.categories))
    .bind(&input.url)
    .bind(input.is_free)
    .bind(to_json_text(&input.features))
    .bind(&input.setup_guide)
    .bind(&input.integration_guide)
    .bind(input.author_id)
    .bind(status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create tool")?;

    let id = result.last_insert_rowid();
    get_tool_by_id_sqlite(pool, id)
        .await?
        .context("Created tool not found")
}

async fn get_tool_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Tool>> {
    let sql = format!("SELECT {} FROM tools WHERE id = ?", TOOL_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tool by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_tool_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_active_sqlite(
    pool: &SqlitePool,
    category: Option<&str>,
    params: &ListParams,
) -> Result<PagedResult<Tool>> {
    // Categories are stored as a JSON string array; match the quoted element
    let (rows, total) = match category {
        Some(category) => {
            let pattern = format!("%\"{}\"%", super::escape_like(category));
            let sql = format!(
                "SELECT {} FROM tools WHERE status = 'active' AND categories LIKE ? ESCAPE '\\' \
                 ORDER BY created_at DESC LIMIT ? OFFSET ?",
                TOOL_COLUMNS
            );
            let rows = sqlx::query(&sql)
                .bind(&pattern)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(pool)
                .await
                .context("Failed to list tools")?;

            let count_row = sqlx::query(
                "SELECT COUNT(*) as count FROM tools \
                 WHERE status = 'active' AND categories LIKE ? ESCAPE '\\'",
            )
            .bind(&pattern)
            .fetch_one(pool)
            .await
            .context("Failed to count tools")?;
            let total: i64 = count_row.get("count");
            (rows, total)
        }
        None => {
            let sql = format!(
                "SELECT {} FROM tools WHERE status = 'active' \
                 ORDER BY created_at DESC LIMIT ? OFFSET ?",
                TOOL_COLUMNS
            );
            let rows = sqlx::query(&sql)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(pool)
                .await
                .context("Failed to list tools")?;

            let count_row =
                sqlx::query("SELECT COUNT(*) as count FROM tools WHERE status = 'active'")
                    .fetch_one(pool)
                    .await
                    .context("Failed to count tools")?;
            let total: i64 = count_row.get("count");
            (rows, total)
        }
    };

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(row_to_tool_sqlite(row)?);
    }

    Ok(PagedResult::new(items, total, params))
}

async fn list_by_author_sqlite(pool: &SqlitePool, author_id: i64) -> Result<Vec<Tool>> {
    let sql = format!(
        "SELECT {} FROM tools WHERE author_id = ? ORDER BY created_at DESC",
        TOOL_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(author_id)
        .fetch_all(pool)
        .await
        .context("Failed to list tools by author")?;

    rows.iter().map(row_to_tool_sqlite).collect()
}

async fn update_tool_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateToolInput,
) -> Result<Option<Tool>> {
    let existing = match get_tool_by_id_sqlite(pool, id).await? {
        Some(tool) => tool,
        None => return Ok(None),
    };

    let merged = merge_update(&existing, input);

    sqlx::query(
        r#"
        UPDATE tools
        SET name = ?, description = ?, categories = ?, url = ?, is_free = ?,
            features = ?, setup_guide = ?, integration_guide = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&merged.name)
    .bind(&merged.description)
    .bind(to_json_text(&merged.categories))
    .bind(&merged.url)
    .bind(merged.is_free)
    .bind(to_json_text(&merged.features))
    .bind(&merged.setup_guide)
    .bind(&merged.integration_guide)
    .bind(merged.status.as_str())
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update tool")?;

    get_tool_by_id_sqlite(pool, id).await
}

async fn delete_tool_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tools WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tool")?;

    Ok(result.rows_affected() > 0)
}

async fn list_reviews_sqlite(pool: &SqlitePool, tool_id: i64) -> Result<Vec<ToolReview>> {
    let sql = format!(
        "SELECT {} FROM tool_reviews WHERE tool_id = ? ORDER BY created_at DESC",
        REVIEW_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(tool_id)
        .fetch_all(pool)
        .await
        .context("Failed to list reviews")?;

    Ok(rows.iter().map(row_to_review_sqlite).collect())
}

async fn get_review_sqlite(
    pool: &SqlitePool,
    tool_id: i64,
    user_id: i64,
) -> Result<Option<ToolReview>> {
    let sql = format!(
        "SELECT {} FROM tool_reviews WHERE tool_id = ? AND user_id = ?",
        REVIEW_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(tool_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get review")?;

    Ok(row.as_ref().map(row_to_review_sqlite))
}

async fn create_review_sqlite(
    pool: &SqlitePool,
    tool_id: i64,
    user_id: i64,
    input: &CreateReviewInput,
) -> Result<ToolReview> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO tool_reviews (tool_id, user_id, rating, review, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(tool_id)
    .bind(user_id)
    .bind(input.rating)
    .bind(&input.review)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create review")?;

    let review_id = result.last_insert_rowid();

    sqlx::query(
        "UPDATE tools SET rating_sum = rating_sum + ?, rating_count = rating_count + 1 \
         WHERE id = ?",
    )
    .bind(input.rating as i64)
    .bind(tool_id)
    .execute(&mut *tx)
    .await
    .context("Failed to update tool rating aggregates")?;

    tx.commit().await.context("Failed to commit review")?;

    let sql = format!("SELECT {} FROM tool_reviews WHERE id = ?", REVIEW_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(review_id)
        .fetch_one(pool)
        .await
        .context("Created review not found")?;

    Ok(row_to_review_sqlite(&row))
}

async fn increment_helpful_sqlite(pool: &SqlitePool, review_id: i64) -> Result<bool> {
    let result =
        sqlx::query("UPDATE tool_reviews SET helpful_count = helpful_count + 1 WHERE id = ?")
            .bind(review_id)
            .execute(pool)
            .await
            .context("Failed to increment helpful count")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_tool_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Tool> {
    let status: String = row.get("status");
    let categories: String = row.get("categories");
    let features: String = row.get("features");

    Ok(Tool {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        categories: parse_string_list(&categories),
        url: row.get("url"),
        is_free: row.get("is_free"),
        features: parse_string_list(&features),
        setup_guide: row.get("setup_guide"),
        integration_guide: row.get("integration_guide"),
        author_id: row.get("author_id"),
        status: ToolStatus::from_str(&status)
            .with_context(|| format!("Invalid tool status: {}", status))?,
        rating_sum: row.get("rating_sum"),
        rating_count: row.get("rating_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_review_sqlite(row: &sqlx::sqlite::SqliteRow) -> ToolReview {
    ToolReview {
        id: row.get("id"),
        tool_id: row.get("tool_id"),
        user_id: row.get("user_id"),
        rating: row.get("rating"),
        review: row.get("review"),
        helpful_count: row.get("helpful_count"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// PostgreSQL implementations
// ============================================================================

async fn create_tool_postgres(pool: &PgPool, input: &CreateToolInput) -> Result<Tool> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();

    let sql = format!(
        r#"
        INSERT INTO tools
            (name, description, categories, url, is_free, features, setup_guide,
             integration_guide, author_id, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {}
        "#,
        TOOL_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(&input.name)
        .bind(&input.description)
        .bind(to_json_text(&input.categories))
        .bind(&input.url)
        .bind(input.is_free)
        .bind(to_json_text(&input.features))
        .bind(&input.setup_guide)
        .bind(&input.integration_guide)
        .bind(input.author_id)
        .bind(status.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("Failed to create tool")?;

    row_to_tool_postgres(&row)
}

async fn get_tool_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<Tool>> {
    let sql = format!("SELECT {} FROM tools WHERE id = $1", TOOL_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tool by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_tool_postgres(&row)?)),
        None => Ok(None),
    }
}

async fn list_active_postgres(
    pool: &PgPool,
    category: Option<&str>,
    params: &ListParams,
) -> Result<PagedResult<Tool>> {
    let (rows, total) = match category {
        Some(category) => {
            let pattern = format!("%\"{}\"%", super::escape_like(category));
            let sql = format!(
                "SELECT {} FROM tools WHERE status = 'active' AND categories LIKE $1 ESCAPE '\\' \
                 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                TOOL_COLUMNS
            );
            let rows = sqlx::query(&sql)
                .bind(&pattern)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(pool)
                .await
                .context("Failed to list tools")?;

            let count_row = sqlx::query(
                "SELECT COUNT(*) as count FROM tools \
                 WHERE status = 'active' AND categories LIKE $1 ESCAPE '\\'",
            )
            .bind(&pattern)
            .fetch_one(pool)
            .await
            .context("Failed to count tools")?;
            let total: i64 = count_row.get("count");
            (rows, total)
        }
        None => {
            let sql = format!(
                "SELECT {} FROM tools WHERE status = 'active' \
                 ORDER BY created_at DESC LIMIT $1 OFFSET $2",
                TOOL_COLUMNS
            );
            let rows = sqlx::query(&sql)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(pool)
                .await
                .context("Failed to list tools")?;

            let count_row =
                sqlx::query("SELECT COUNT(*) as count FROM tools WHERE status = 'active'")
                    .fetch_one(pool)
                    .await
                    .context("Failed to count tools")?;
            let total: i64 = count_row.get("count");
            (rows, total)
        }
    };

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(row_to_tool_postgres(row)?);
    }

    Ok(PagedResult::new(items, total, params))
}

async fn list_by_author_postgres(pool: &PgPool, author_id: i64) -> Result<Vec<Tool>> {
    let sql = format!(
        "SELECT {} FROM tools WHERE author_id = $1 ORDER BY created_at DESC",
        TOOL_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(author_id)
        .fetch_all(pool)
        .await
        .context("Failed to list tools by author")?;

    rows.iter().map(row_to_tool_postgres).collect()
}

async fn update_tool_postgres(
    pool: &PgPool,
    id: i64,
    input: &UpdateToolInput,
) -> Result<Option<Tool>> {
    let existing = match get_tool_by_id_postgres(pool, id).await? {
        Some(tool) => tool,
        None => return Ok(None),
    };

    let merged = merge_update(&existing, input);

    let sql = format!(
        r#"
        UPDATE tools
        SET name = $1, description = $2, categories = $3, url = $4, is_free = $5,
            features = $6, setup_guide = $7, integration_guide = $8, status = $9, updated_at = $10
        WHERE id = $11
        RETURNING {}
        "#,
        TOOL_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(&merged.name)
        .bind(&merged.description)
        .bind(to_json_text(&merged.categories))
        .bind(&merged.url)
        .bind(merged.is_free)
        .bind(to_json_text(&merged.features))
        .bind(&merged.setup_guide)
        .bind(&merged.integration_guide)
        .bind(merged.status.as_str())
        .bind(Utc::now())
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to update tool")?;

    Ok(Some(row_to_tool_postgres(&row)?))
}

async fn delete_tool_postgres(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tools WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tool")?;

    Ok(result.rows_affected() > 0)
}

async fn list_reviews_postgres(pool: &PgPool, tool_id: i64) -> Result<Vec<ToolReview>> {
    let sql = format!(
        "SELECT {} FROM tool_reviews WHERE tool_id = $1 ORDER BY created_at DESC",
        REVIEW_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(tool_id)
        .fetch_all(pool)
        .await
        .context("Failed to list reviews")?;

    Ok(rows.iter().map(row_to_review_postgres).collect())
}

async fn get_review_postgres(
    pool: &PgPool,
    tool_id: i64,
    user_id: i64,
) -> Result<Option<ToolReview>> {
    let sql = format!(
        "SELECT {} FROM tool_reviews WHERE tool_id = $1 AND user_id = $2",
        REVIEW_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(tool_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get review")?;

    Ok(row.as_ref().map(row_to_review_postgres))
}

async fn create_review_postgres(
    pool: &PgPool,
    tool_id: i64,
    user_id: i64,
    input: &CreateReviewInput,
) -> Result<ToolReview> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let sql = format!(
        r#"
        INSERT INTO tool_reviews (tool_id, user_id, rating, review, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        REVIEW_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(tool_id)
        .bind(user_id)
        .bind(input.rating)
        .bind(&input.review)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create review")?;

    sqlx::query(
        "UPDATE tools SET rating_sum = rating_sum + $1, rating_count = rating_count + 1 \
         WHERE id = $2",
    )
    .bind(input.rating as i64)
    .bind(tool_id)
    .execute(&mut *tx)
    .await
    .context("Failed to update tool rating aggregates")?;

    tx.commit().await.context("Failed to commit review")?;

    Ok(row_to_review_postgres(&row))
}

async fn increment_helpful_postgres(pool: &PgPool, review_id: i64) -> Result<bool> {
    let result =
        sqlx::query("UPDATE tool_reviews SET helpful_count = helpful_count + 1 WHERE id = $1")
            .bind(review_id)
            .execute(pool)
            .await
            .context("Failed to increment helpful count")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_tool_postgres(row: &sqlx::postgres::PgRow) -> Result<Tool> {
    let status: String = row.get("status");
    let categories: String = row.get("categories");
    let features: String = row.get("features");

    Ok(Tool {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        categories: parse_string_list(&categories),
        url: row.get("url"),
        is_free: row.get("is_free"),
        features: parse_string_list(&features),
        setup_guide: row.get("setup_guide"),
        integration_guide: row.get("integration_guide"),
        author_id: row.get("author_id"),
        status: ToolStatus::from_str(&status)
            .with_context(|| format!("Invalid tool status: {}", status))?,
        rating_sum: row.get("rating_sum"),
        rating_count: row.get("rating_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_review_postgres(row: &sqlx::postgres::PgRow) -> ToolReview {
    ToolReview {
        id: row.get("id"),
        tool_id: row.get("tool_id"),
        user_id: row.get("user_id"),
        rating: row.get("rating"),
        review: row.get("review"),
        helpful_count: row.get("helpful_count"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn merge_update(existing: &Tool, input: &UpdateToolInput) -> Tool {
    let mut merged = existing.clone();
    if let Some(name) = &input.name {
        merged.name = name.clone();
    }
    if let Some(description) = &input.description {
        merged.description = description.clone();
    }
    if let Some(categories) = &input.categories {
        merged.categories = categories.clone();
    }
    if let Some(url) = &input.url {
        merged.url = url.clone();
    }
    if let Some(is_free) = input.is_free {
        merged.is_free = is_free;
    }
    if let Some(features) = &input.features {
        merged.features = features.clone();
    }
    if let Some(setup_guide) = &input.setup_guide {
        merged.setup_guide = setup_guide.clone();
    }
    if let Some(integration_guide) = &input.integration_guide {
        merged.integration_guide = Some(integration_guide.clone());
    }
    if let Some(status) = input.status {
        merged.status = status;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxToolRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxToolRepository::new(pool.clone());
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

    fn test_input(name: &str) -> CreateToolInput {
        CreateToolInput {
            name: name.to_string(),
            description: "A helpful tool".to_string(),
            categories: vec!["time-management".to_string()],
            url: "https://example.com".to_string(),
            is_free: true,
            features: vec!["timers".to_string()],
            setup_guide: "Install it".to_string(),
            integration_guide: None,
            author_id: 1,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_tool() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let created = repo.create(&test_input("Focus Timer")).await.unwrap();

        assert!(created.id > 0);
        assert_eq!(created.name, "Focus Timer");
        assert_eq!(created.status, ToolStatus::Active);
        assert_eq!(created.categories, vec!["time-management"]);
        assert_eq!(created.rating_sum, 0);
        assert_eq!(created.rating_count, 0);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, created.name);
    }

    #[tokio::test]
    async fn test_list_active_category_filter() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        repo.create(&test_input("Timer")).await.unwrap();

        let mut other = test_input("Blocker");
        other.categories = vec!["distraction-blocking".to_string()];
        repo.create(&other).await.unwrap();

        let mut inactive = test_input("Old Timer");
        inactive.status = Some(ToolStatus::Inactive);
        repo.create(&inactive).await.unwrap();

        let all = repo.list_active(None, &ListParams::default()).await.unwrap();
        assert_eq!(all.total, 2);

        let filtered = repo
            .list_active(Some("time-management"), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(filtered.total, 1);
        assert_eq!(filtered.items[0].name, "Timer");
    }

    #[tokio::test]
    async fn test_list_active_category_wildcards_are_literal() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        repo.create(&test_input("Timer")).await.unwrap();

        // "%" must not match every tool
        let filtered = repo
            .list_active(Some("%"), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(filtered.total, 0);

        // "_" must not stand in for an arbitrary character
        let filtered = repo
            .list_active(Some("time_management"), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(filtered.total, 0);

        let filtered = repo
            .list_active(Some("time-management"), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(filtered.total, 1);
    }

    #[tokio::test]
    async fn test_update_tool() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;
        let created = repo.create(&test_input("Timer")).await.unwrap();

        let input = UpdateToolInput {
            description: Some("Better description".to_string()),
            status: Some(ToolStatus::Deprecated),
            ..Default::default()
        };
        let updated = repo.update(created.id, &input).await.unwrap().unwrap();

        assert_eq!(updated.description, "Better description");
        assert_eq!(updated.status, ToolStatus::Deprecated);
        assert_eq!(updated.name, "Timer");
    }

    #[tokio::test]
    async fn test_create_review_updates_aggregates() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;
        create_test_user(&pool, 2).await;
        let tool = repo.create(&test_input("Timer")).await.unwrap();

        let input = CreateReviewInput {
            rating: 4,
            review: "Works well".to_string(),
        };
        let review = repo.create_review(tool.id, 2, &input).await.unwrap();

        assert_eq!(review.rating, 4);
        assert_eq!(review.helpful_count, 0);

        let fetched = repo.get_by_id(tool.id).await.unwrap().unwrap();
        assert_eq!(fetched.rating_sum, 4);
        assert_eq!(fetched.rating_count, 1);
        assert_eq!(fetched.average_rating(), 4.0);
    }

    #[tokio::test]
    async fn test_duplicate_review_fails() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;
        create_test_user(&pool, 2).await;
        let tool = repo.create(&test_input("Timer")).await.unwrap();

        let input = CreateReviewInput {
            rating: 5,
            review: "Great".to_string(),
        };
        repo.create_review(tool.id, 2, &input).await.unwrap();

        let result = repo.create_review(tool.id, 2, &input).await;
        assert!(result.is_err());

        // Failed insert must not touch the aggregates
        let fetched = repo.get_by_id(tool.id).await.unwrap().unwrap();
        assert_eq!(fetched.rating_count, 1);
    }

    #[tokio::test]
    async fn test_get_review_by_tool_and_user() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;
        create_test_user(&pool, 2).await;
        let tool = repo.create(&test_input("Timer")).await.unwrap();

        assert!(repo
            .get_review_by_tool_and_user(tool.id, 2)
            .await
            .unwrap()
            .is_none());

        let input = CreateReviewInput {
            rating: 3,
            review: "Okay".to_string(),
        };
        repo.create_review(tool.id, 2, &input).await.unwrap();

        let found = repo
            .get_review_by_tool_and_user(tool.id, 2)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.rating, 3);
    }

    #[tokio::test]
    async fn test_increment_helpful() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;
        create_test_user(&pool, 2).await;
        let tool = repo.create(&test_input("Timer")).await.unwrap();

        let input = CreateReviewInput {
            rating: 5,
            review: "Great".to_string(),
        };
        let review = repo.create_review(tool.id, 2, &input).await.unwrap();

        assert!(repo.increment_helpful(review.id).await.unwrap());
        assert!(!repo.increment_helpful(999).await.unwrap());

        let reviews = repo.list_reviews(tool.id).await.unwrap();
        assert_eq!(reviews[0].helpful_count, 1);
    }

    #[tokio::test]
    async fn test_delete_tool_cascades_reviews() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;
        create_test_user(&pool, 2).await;
        let tool = repo.create(&test_input("Timer")).await.unwrap();

        let input = CreateReviewInput {
            rating: 5,
            review: "Great".to_string(),
        };
        repo.create_review(tool.id, 2, &input).await.unwrap();

        assert!(repo.delete(tool.id).await.unwrap());
        let reviews = repo.list_reviews(tool.id).await.unwrap();
        assert!(reviews.is_empty());
    }
}
