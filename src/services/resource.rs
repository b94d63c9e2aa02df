//! Resource service
//!
//! Business logic for the resource library: listing and searching published
//! resources, create/update/delete with markdown rendering, and the view and
//! download counters.

use crate::db::repositories::ResourceRepository;
use crate::models::{
    CreateResourceInput, ListParams, PagedResult, Resource, ResourceKind, UpdateResourceInput,
};
use crate::services::markdown::MarkdownRenderer;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Default limit for search results
const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// Error types for resource service operations
#[derive(Debug, thiserror::Error)]
pub enum ResourceServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Resource not found
    #[error("Resource not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Resource service
pub struct ResourceService {
    resource_repo: Arc<dyn ResourceRepository>,
    renderer: MarkdownRenderer,
}

impl ResourceService {
    /// Create a new resource service
    pub fn new(resource_repo: Arc<dyn ResourceRepository>) -> Self {
        Self {
            resource_repo,
            renderer: MarkdownRenderer::new(),
        }
    }

    /// List published resources, optionally filtered by kind, newest first
    pub async fn list(
        &self,
        kind: Option<ResourceKind>,
        params: &ListParams,
    ) -> Result<PagedResult<Resource>, ResourceServiceError> {
        let page = self
            .resource_repo
            .list_published(kind, params)
            .await
            .context("Failed to list resources")?;

        Ok(page)
    }

    /// Get a resource by ID
    pub async fn get(&self, id: i64) -> Result<Option<Resource>, ResourceServiceError> {
        let resource = self
            .resource_repo
            .get_by_id(id)
            .await
            .context("Failed to get resource")?;

        Ok(resource)
    }

    /// Create a resource, rendering its markdown body
    pub async fn create(
        &self,
        mut input: CreateResourceInput,
        author_id: i64,
    ) -> Result<Resource, ResourceServiceError> {
        if input.title.trim().is_empty() {
            return Err(ResourceServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if input.description.trim().is_empty() {
            return Err(ResourceServiceError::ValidationError(
                "Description cannot be empty".to_string(),
            ));
        }

        input.author_id = author_id;
        let content_html = self.renderer.render(&input.content);

        let created = self
            .resource_repo
            .create(&input, &content_html)
            .await
            .context("Failed to create resource")?;

        tracing::info!(resource_id = created.id, author_id, "Resource created");
        Ok(created)
    }

    /// Apply a partial update, re-rendering markdown when content changes
    pub async fn update(
        &self,
        id: i64,
        mut input: UpdateResourceInput,
    ) -> Result<Resource, ResourceServiceError> {
        if !input.has_changes() {
            return Err(ResourceServiceError::ValidationError(
                "No fields to update".to_string(),
            ));
        }

        if let Some(title) = &input.title {
            if title.trim().is_empty() {
                return Err(ResourceServiceError::ValidationError(
                    "Title cannot be empty".to_string(),
                ));
            }
        }

        if let Some(content) = &input.content {
            input.content_html = Some(self.renderer.render(content));
        }

        let updated = self
            .resource_repo
            .update(id, &input)
            .await
            .context("Failed to update resource")?
            .ok_or(ResourceServiceError::NotFound)?;

        Ok(updated)
    }

    /// Delete a resource
    pub async fn delete(&self, id: i64) -> Result<(), ResourceServiceError> {
        let deleted = self
            .resource_repo
            .delete(id)
            .await
            .context("Failed to delete resource")?;

        if !deleted {
            return Err(ResourceServiceError::NotFound);
        }

        tracing::info!(resource_id = id, "Resource deleted");
        Ok(())
    }

    /// Search published resources by title/description substring
    pub async fn search(
        &self,
        query: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Resource>, ResourceServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, 100);
        let results = self
            .resource_repo
            .search(query, limit)
            .await
            .context("Failed to search resources")?;

        Ok(results)
    }

    /// Record a view of a resource
    pub async fn record_view(&self, id: i64) -> Result<(), ResourceServiceError> {
        let touched = self
            .resource_repo
            .increment_views(id)
            .await
            .context("Failed to record view")?;

        if !touched {
            return Err(ResourceServiceError::NotFound);
        }
        Ok(())
    }

    /// Record a download of a resource
    pub async fn record_download(&self, id: i64) -> Result<(), ResourceServiceError> {
        let touched = self
            .resource_repo
            .increment_downloads(id)
            .await
            .context("Failed to record download")?;

        if !touched {
            return Err(ResourceServiceError::NotFound);
        }
        Ok(())
    }

    /// All resources by an author, newest first
    pub async fn list_by_author(&self, author_id: i64) -> Result<Vec<Resource>, ResourceServiceError> {
        let resources = self
            .resource_repo
            .list_by_author(author_id)
            .await
            .context("Failed to list resources by author")?;

        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxResourceRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::ResourceStatus;
    use chrono::Utc;

    async fn setup_test_service() -> (DynDatabasePool, ResourceService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = ResourceService::new(SqlxResourceRepository::boxed(pool.clone()));
        (pool, service)
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

    fn test_input(title: &str) -> CreateResourceInput {
        CreateResourceInput::new(
            title.to_string(),
            "Short description".to_string(),
            "# Heading\n\nBody with **bold** text.".to_string(),
            ResourceKind::Article,
            0,
        )
    }

    #[tokio::test]
    async fn test_create_renders_markdown() {
        let (pool, service) = setup_test_service().await;
        create_test_user(&pool, 1).await;

        let created = service.create(test_input("Guide"), 1).await.unwrap();

        assert_eq!(created.author_id, 1);
        assert!(created.content_html.contains("<h1>"));
        assert!(created.content_html.contains("<strong>bold</strong>"));
        assert_eq!(created.status, ResourceStatus::Draft);
    }

    #[tokio::test]
    async fn test_create_empty_title_fails() {
        let (pool, service) = setup_test_service().await;
        create_test_user(&pool, 1).await;

        let result = service.create(test_input("   "), 1).await;
        assert!(matches!(result, Err(ResourceServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_rerenders_on_content_change() {
        let (pool, service) = setup_test_service().await;
        create_test_user(&pool, 1).await;
        let created = service.create(test_input("Guide"), 1).await.unwrap();

        let input = UpdateResourceInput::new().with_content("## New section".to_string());
        let updated = service.update(created.id, input).await.unwrap();

        assert!(updated.content_html.contains("<h2>"));
        assert!(!updated.content_html.contains("<h1>"));
    }

    #[tokio::test]
    async fn test_update_missing_resource_is_not_found() {
        let (_pool, service) = setup_test_service().await;

        let input = UpdateResourceInput::new().with_title("New".to_string());
        let result = service.update(999, input).await;
        assert!(matches!(result, Err(ResourceServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_without_changes_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service.update(1, UpdateResourceInput::new()).await;
        assert!(matches!(result, Err(ResourceServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_record_view_and_download() {
        let (pool, service) = setup_test_service().await;
        create_test_user(&pool, 1).await;
        let created = service.create(test_input("Guide"), 1).await.unwrap();

        service.record_view(created.id).await.unwrap();
        service.record_view(created.id).await.unwrap();
        service.record_download(created.id).await.unwrap();

        let fetched = service.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.views, 2);
        assert_eq!(fetched.downloads, 1);

        let result = service.record_view(999).await;
        assert!(matches!(result, Err(ResourceServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_search_blank_query_is_empty() {
        let (_pool, service) = setup_test_service().await;

        let results = service.search("   ", None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_resource_is_not_found() {
        let (_pool, service) = setup_test_service().await;

        let result = service.delete(999).await;
        assert!(matches!(result, Err(ResourceServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_only_published() {
        let (pool, service) = setup_test_service().await;
        create_test_user(&pool, 1).await;

        service.create(test_input("Draft"), 1).await.unwrap();
        let mut published = test_input("Published");
        published.status = Some(ResourceStatus::Published);
        service.create(published, 1).await.unwrap();

        let page = service.list(None, &ListParams::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Published");
    }
}
