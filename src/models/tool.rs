//! Tool directory models
//!
//! This module provides:
//! - `Tool` entity for directory listings with rating aggregates
//! - `ToolStatus` enum
//! - `ToolReview` entity (one review per user per tool)
//! - Input types for creating and updating tools and submitting reviews

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tool entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Unique identifier
    pub id: i64,
    /// Tool name
    pub name: String,
    /// Short description
    pub description: String,
    /// Categories (free-form labels)
    #[serde(default)]
    pub categories: Vec<String>,
    /// Tool website URL
    pub url: String,
    /// Whether the tool is free to use
    pub is_free: bool,
    /// Feature list
    #[serde(default)]
    pub features: Vec<String>,
    /// Setup guide (markdown)
    pub setup_guide: String,
    /// Integration guide (markdown, optional)
    pub integration_guide: Option<String>,
    /// Submitting user ID
    pub author_id: i64,
    /// Listing status
    pub status: ToolStatus,
    /// Sum of all review ratings
    #[serde(default)]
    pub rating_sum: i64,
    /// Number of reviews
    #[serde(default)]
    pub rating_count: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Tool {
    /// Average review rating, 0.0 when unrated
    pub fn average_rating(&self) -> f64 {
        if self.rating_count == 0 {
            0.0
        } else {
            self.rating_sum as f64 / self.rating_count as f64
        }
    }
}

/// Tool listing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// Active - visible in the directory
    #[default]
    Active,
    /// Inactive - temporarily hidden
    Inactive,
    /// Deprecated - tool no longer maintained
    Deprecated,
}

impl ToolStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::Active => "active",
            ToolStatus::Inactive => "inactive",
            ToolStatus::Deprecated => "deprecated",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(ToolStatus::Active),
            "inactive" => Some(ToolStatus::Inactive),
            "deprecated" => Some(ToolStatus::Deprecated),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Review of a tool by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolReview {
    /// Unique identifier
    pub id: i64,
    /// Reviewed tool ID
    pub tool_id: i64,
    /// Reviewing user ID
    pub user_id: i64,
    /// Rating, 1 through 5
    pub rating: i32,
    /// Review text
    pub review: String,
    /// Number of "helpful" votes
    #[serde(default)]
    pub helpful_count: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new tool
#[derive(Debug, Clone, Deserialize)]
pub struct CreateToolInput {
    /// Tool name
    pub name: String,
    /// Short description
    pub description: String,
    /// Categories
    #[serde(default)]
    pub categories: Vec<String>,
    /// Tool website URL
    pub url: String,
    /// Whether the tool is free to use
    #[serde(default)]
    pub is_free: bool,
    /// Feature list
    #[serde(default)]
    pub features: Vec<String>,
    /// Setup guide (markdown)
    #[serde(default)]
    pub setup_guide: String,
    /// Integration guide (markdown, optional)
    pub integration_guide: Option<String>,
    /// Submitting user ID
    #[serde(default)]
    pub author_id: i64,
    /// Listing status (defaults to Active)
    pub status: Option<ToolStatus>,
}

/// Input for updating an existing tool
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateToolInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New description (optional)
    pub description: Option<String>,
    /// New categories (optional, replaces the whole list)
    pub categories: Option<Vec<String>>,
    /// New URL (optional)
    pub url: Option<String>,
    /// New is_free flag (optional)
    pub is_free: Option<bool>,
    /// New feature list (optional, replaces the whole list)
    pub features: Option<Vec<String>>,
    /// New setup guide (optional)
    pub setup_guide: Option<String>,
    /// New integration guide (optional)
    pub integration_guide: Option<String>,
    /// New status (optional)
    pub status: Option<ToolStatus>,
}

impl UpdateToolInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.categories.is_some()
            || self.url.is_some()
            || self.is_free.is_some()
            || self.features.is_some()
            || self.setup_guide.is_some()
            || self.integration_guide.is_some()
            || self.status.is_some()
    }
}

/// Input for submitting a tool review
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewInput {
    /// Rating, 1 through 5
    pub rating: i32,
    /// Review text
    pub review: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tool(rating_sum: i64, rating_count: i64) -> Tool {
        let now = Utc::now();
        Tool {
            id: 1,
            name: "Focus Timer".to_string(),
            description: "Pomodoro timer".to_string(),
            categories: vec!["time-management".to_string()],
            url: "https://example.com".to_string(),
            is_free: true,
            features: vec![],
            setup_guide: String::new(),
            integration_guide: None,
            author_id: 1,
            status: ToolStatus::Active,
            rating_sum,
            rating_count,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(sample_tool(0, 0).average_rating(), 0.0);
        assert_eq!(sample_tool(9, 2).average_rating(), 4.5);
        assert_eq!(sample_tool(5, 1).average_rating(), 5.0);
    }

    #[test]
    fn test_tool_status_conversion() {
        assert_eq!(ToolStatus::Active.as_str(), "active");
        assert_eq!(ToolStatus::Inactive.as_str(), "inactive");
        assert_eq!(ToolStatus::Deprecated.as_str(), "deprecated");

        assert_eq!(ToolStatus::from_str("active"), Some(ToolStatus::Active));
        assert_eq!(ToolStatus::from_str("DEPRECATED"), Some(ToolStatus::Deprecated));
        assert_eq!(ToolStatus::from_str("gone"), None);
        assert_eq!(ToolStatus::default(), ToolStatus::Active);
    }

    #[test]
    fn test_update_input_has_changes() {
        assert!(!UpdateToolInput::default().has_changes());

        let input = UpdateToolInput {
            status: Some(ToolStatus::Deprecated),
            ..Default::default()
        };
        assert!(input.has_changes());
    }
}
