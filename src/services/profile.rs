//! Profile service
//!
//! Profiles are created lazily: the first fetch for a user creates the row
//! with default preferences and a display name derived from the email's
//! local part.

use crate::db::repositories::ProfileRepository;
use crate::models::{UpdateProfileInput, User, UserProfile};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Error types for profile service operations
#[derive(Debug, thiserror::Error)]
pub enum ProfileServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Profile service
pub struct ProfileService {
    profile_repo: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    /// Create a new profile service
    pub fn new(profile_repo: Arc<dyn ProfileRepository>) -> Self {
        Self { profile_repo }
    }

    /// Fetch the user's profile, creating it with defaults when missing
    pub async fn get_or_create(&self, user: &User) -> Result<UserProfile, ProfileServiceError> {
        if let Some(profile) = self
            .profile_repo
            .get_by_user_id(user.id)
            .await
            .context("Failed to get profile")?
        {
            return Ok(profile);
        }

        let display_name = user.email_local_part().to_string();
        let created = self
            .profile_repo
            .create(user.id, &display_name)
            .await
            .context("Failed to create profile")?;

        tracing::info!(user_id = user.id, "Profile created on first access");
        Ok(created)
    }

    /// Apply a partial update to the user's profile
    ///
    /// The profile is created first if the user never loaded it.
    pub async fn update(
        &self,
        user: &User,
        input: UpdateProfileInput,
    ) -> Result<UserProfile, ProfileServiceError> {
        if !input.has_changes() {
            return Err(ProfileServiceError::ValidationError(
                "No fields to update".to_string(),
            ));
        }

        if let Some(display_name) = &input.display_name {
            if display_name.trim().is_empty() {
                return Err(ProfileServiceError::ValidationError(
                    "Display name cannot be empty".to_string(),
                ));
            }
        }

        // Ensure the row exists before updating
        self.get_or_create(user).await?;

        let updated = self
            .profile_repo
            .update(user.id, &input)
            .await
            .context("Failed to update profile")?
            .context("Profile disappeared during update")?;

        Ok(updated)
    }
}
