//! Community forum models
//!
//! This module provides:
//! - `Forum`, `ForumTopic`, `ForumPost` entities
//! - Summary types carrying the aggregates the community pages display
//!   (topic/post counts, latest activity)
//! - Input types for creating topics and posts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Forum entity (a discussion board)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forum {
    /// Unique identifier
    pub id: i64,
    /// URL slug (unique)
    pub slug: String,
    /// Forum title
    pub title: String,
    /// Forum description
    pub description: String,
    /// Whether the forum is marked private
    pub is_private: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Topic within a forum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumTopic {
    /// Unique identifier
    pub id: i64,
    /// Parent forum ID
    pub forum_id: i64,
    /// Author user ID
    pub author_id: i64,
    /// Topic title
    pub title: String,
    /// Opening content
    pub content: String,
    /// Pinned topics sort before others
    pub is_pinned: bool,
    /// Locked topics accept no new replies
    pub is_locked: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Reply within a topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumPost {
    /// Unique identifier
    pub id: i64,
    /// Parent topic ID
    pub topic_id: i64,
    /// Author user ID
    pub author_id: i64,
    /// Post content
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Forum with the aggregates the community index displays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumSummary {
    /// The forum itself
    #[serde(flatten)]
    pub forum: Forum,
    /// Number of topics in the forum
    pub topic_count: i64,
    /// Number of posts across all topics
    pub post_count: i64,
    /// Timestamp of the most recent post, if any
    pub latest_post_at: Option<DateTime<Utc>>,
}

/// Topic with the aggregates the forum page displays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummary {
    /// The topic itself
    #[serde(flatten)]
    pub topic: ForumTopic,
    /// Number of replies
    pub reply_count: i64,
    /// Timestamp of the most recent reply, if any
    pub latest_reply_at: Option<DateTime<Utc>>,
    /// Display name of the most recent reply's author, if any
    pub latest_reply_author: Option<String>,
}

/// Input for creating a topic
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTopicInput {
    /// Topic title (trimmed, 3..=255 chars)
    pub title: String,
    /// Opening content (at least 10 chars)
    pub content: String,
}

/// Input for creating a post
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostInput {
    /// Post content (non-empty)
    pub content: String,
}
