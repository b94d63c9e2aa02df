//! Tool service
//!
//! Business logic for the tool directory: listings, submissions, and the
//! review rules (rating 1..=5, one review per user per tool, aggregate
//! maintenance).

use crate::db::repositories::ToolRepository;
use crate::models::{
    CreateReviewInput, CreateToolInput, ListParams, PagedResult, Tool, ToolReview, UpdateToolInput,
};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Error types for tool service operations
#[derive(Debug, thiserror::Error)]
pub enum ToolServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Tool or review not found
    #[error("Tool not found")]
    NotFound,

    /// The user already reviewed this tool
    #[error("You have already reviewed this tool")]
    DuplicateReview,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Tool service
pub struct ToolService {
    tool_repo: Arc<dyn ToolRepository>,
}

impl ToolService {
    /// Create a new tool service
    pub fn new(tool_repo: Arc<dyn ToolRepository>) -> Self {
        Self { tool_repo }
    }

    /// List active tools, optionally filtered by category
    pub async fn list(
        &self,
        category: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<Tool>, ToolServiceError> {
        let page = self
            .tool_repo
            .list_active(category, params)
            .await
            .context("Failed to list tools")?;

        Ok(page)
    }

    /// Get a tool by ID
    pub async fn get(&self, id: i64) -> Result<Option<Tool>, ToolServiceError> {
        let tool = self
            .tool_repo
            .get_by_id(id)
            .await
            .context("Failed to get tool")?;

        Ok(tool)
    }

    /// Create a tool listing
    pub async fn create(
        &self,
        mut input: CreateToolInput,
        author_id: i64,
    ) -> Result<Tool, ToolServiceError> {
        if input.name.trim().is_empty() {
            return Err(ToolServiceError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }
        if input.url.trim().is_empty() {
            return Err(ToolServiceError::ValidationError(
                "URL cannot be empty".to_string(),
            ));
        }

        input.author_id = author_id;
        let created = self
            .tool_repo
            .create(&input)
            .await
            .context("Failed to create tool")?;

        tracing::info!(tool_id = created.id, author_id, "Tool created");
        Ok(created)
    }

    /// Apply a partial update to a tool
    pub async fn update(&self, id: i64, input: UpdateToolInput) -> Result<Tool, ToolServiceError> {
        if !input.has_changes() {
            return Err(ToolServiceError::ValidationError(
                "No fields to update".to_string(),
            ));
        }

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(ToolServiceError::ValidationError(
                    "Name cannot be empty".to_string(),
                ));
            }
        }

        let updated = self
            .tool_repo
            .update(id, &input)
            .await
            .context("Failed to update tool")?
            .ok_or(ToolServiceError::NotFound)?;

        Ok(updated)
    }

    /// Delete a tool (its reviews cascade)
    pub async fn delete(&self, id: i64) -> Result<(), ToolServiceError> {
        let deleted = self
            .tool_repo
            .delete(id)
            .await
            .context("Failed to delete tool")?;

        if !deleted {
            return Err(ToolServiceError::NotFound);
        }

        tracing::info!(tool_id = id, "Tool deleted");
        Ok(())
    }

    /// List reviews for a tool, newest first
    pub async fn list_reviews(&self, tool_id: i64) -> Result<Vec<ToolReview>, ToolServiceError> {
        if self.get(tool_id).await?.is_none() {
            return Err(ToolServiceError::NotFound);
        }

        let reviews = self
            .tool_repo
            .list_reviews(tool_id)
            .await
            .context("Failed to list reviews")?;

        Ok(reviews)
    }

    /// Submit a review for a tool
    ///
    /// # Errors
    ///
    /// - `ValidationError` for a rating outside 1..=5 or empty review text
    /// - `NotFound` when the tool does not exist
    /// - `DuplicateReview` when the user already reviewed this tool
    pub async fn submit_review(
        &self,
        tool_id: i64,
        user_id: i64,
        input: CreateReviewInput,
    ) -> Result<ToolReview, ToolServiceError> {
        if !(1..=5).contains(&input.rating) {
            return Err(ToolServiceError::ValidationError(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        if input.review.trim().is_empty() {
            return Err(ToolServiceError::ValidationError(
                "Review cannot be empty".to_string(),
            ));
        }

        if self.get(tool_id).await?.is_none() {
            return Err(ToolServiceError::NotFound);
        }

        if self
            .tool_repo
            .get_review_by_tool_and_user(tool_id, user_id)
            .await
            .context("Failed to check existing review")?
            .is_some()
        {
            return Err(ToolServiceError::DuplicateReview);
        }

        let review = self
            .tool_repo
            .create_review(tool_id, user_id, &input)
            .await
            .context("Failed to create review")?;

        tracing::info!(tool_id, user_id, rating = input.rating, "Review submitted");
        Ok(review)
    }

    /// Mark a review as helpful
    pub async fn mark_helpful(&self, review_id: i64) -> Result<(), ToolServiceError> {
        let touched = self
            .tool_repo
            .increment_helpful(review_id)
            .await
            .context("Failed to mark review helpful")?;

        if !touched {
            return Err(ToolServiceError::NotFound);
        }
        Ok(())
    }

    /// All tools submitted by an author, newest first
    pub async fn list_by_author(&self, author_id: i64) -> Result<Vec<Tool>, ToolServiceError> {
        let tools = self
            .tool_repo
            .list_by_author(author_id)
            .await
            .context("Failed to list tools by author")?;

        Ok(tools)
    }
}
