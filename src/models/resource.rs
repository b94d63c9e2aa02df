//! Resource model
//!
//! This module provides:
//! - `Resource` entity representing a library item (article, research,
//!   worksheet, video, or guide)
//! - `ResourceKind` and `ResourceStatus` enums
//! - Input types for creating and updating resources
//! - Pagination types for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resource entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier
    pub id: i64,
    /// Resource title
    pub title: String,
    /// Short description shown in listings
    pub description: String,
    /// Markdown content
    pub content: String,
    /// Rendered HTML content
    pub content_html: String,
    /// Resource kind (article, research, worksheet, video, guide)
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Author user ID
    pub author_id: i64,
    /// Publication status
    pub status: ResourceStatus,
    /// Arbitrary metadata (JSON object)
    #[serde(default = "default_metadata")]
    pub metadata: serde_json::Value,
    /// Citation list
    #[serde(default)]
    pub citations: Vec<String>,
    /// View counter
    #[serde(default)]
    pub views: i64,
    /// Download counter
    #[serde(default)]
    pub downloads: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

fn default_metadata() -> serde_json::Value {
    serde_json::json!({})
}

/// Resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Article,
    Research,
    Worksheet,
    Video,
    Guide,
}

impl ResourceKind {
    /// Convert kind to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Article => "article",
            ResourceKind::Research => "research",
            ResourceKind::Worksheet => "worksheet",
            ResourceKind::Video => "video",
            ResourceKind::Guide => "guide",
        }
    }

    /// Parse kind from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "article" => Some(ResourceKind::Article),
            "research" => Some(ResourceKind::Research),
            "worksheet" => Some(ResourceKind::Worksheet),
            "video" => Some(ResourceKind::Video),
            "guide" => Some(ResourceKind::Guide),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resource publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// Draft - not visible to public
    #[default]
    Draft,
    /// Published - visible to public
    Published,
    /// Archived - hidden but not deleted
    Archived,
}

impl ResourceStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Draft => "draft",
            ResourceStatus::Published => "published",
            ResourceStatus::Archived => "archived",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(ResourceStatus::Draft),
            "published" => Some(ResourceStatus::Published),
            "archived" => Some(ResourceStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResourceInput {
    /// Resource title
    pub title: String,
    /// Short description
    pub description: String,
    /// Markdown content
    pub content: String,
    /// Rendered HTML content (optional, can be generated)
    pub content_html: Option<String>,
    /// Resource kind
    pub kind: ResourceKind,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Author user ID
    pub author_id: i64,
    /// Publication status (defaults to Draft)
    pub status: Option<ResourceStatus>,
    /// Arbitrary metadata
    pub metadata: Option<serde_json::Value>,
    /// Citation list
    pub citations: Vec<String>,
}

impl CreateResourceInput {
    /// Create a new CreateResourceInput with the required fields
    pub fn new(
        title: String,
        description: String,
        content: String,
        kind: ResourceKind,
        author_id: i64,
    ) -> Self {
        Self {
            title,
            description,
            content,
            content_html: None,
            kind,
            tags: Vec::new(),
            author_id,
            status: None,
            metadata: None,
            citations: Vec::new(),
        }
    }

    /// Set the tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the citations
    pub fn with_citations(mut self, citations: Vec<String>) -> Self {
        self.citations = citations;
        self
    }
}

/// Input for updating an existing resource
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateResourceInput {
    /// New title (optional)
    pub title: Option<String>,
    /// New description (optional)
    pub description: Option<String>,
    /// New markdown content (optional)
    pub content: Option<String>,
    /// New rendered HTML content (optional)
    pub content_html: Option<String>,
    /// New kind (optional)
    pub kind: Option<ResourceKind>,
    /// New tags (optional, replaces the whole list)
    pub tags: Option<Vec<String>>,
    /// New status (optional)
    pub status: Option<ResourceStatus>,
    /// New metadata (optional, replaces the whole object)
    pub metadata: Option<serde_json::Value>,
    /// New citations (optional, replaces the whole list)
    pub citations: Option<Vec<String>>,
}

impl UpdateResourceInput {
    /// Create a new empty UpdateResourceInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title
    pub fn with_title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    /// Set the content
    pub fn with_content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.content.is_some()
            || self.content_html.is_some()
            || self.kind.is_some()
            || self.tags.is_some()
            || self.status.is_some()
            || self.metadata.is_some()
            || self.citations.is_some()
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    ///
    /// Widened to i64 before multiplying so a huge page number cannot
    /// overflow u32.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1).max(0) * self.per_page as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in the current page
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: 10,
        }
    }
}
