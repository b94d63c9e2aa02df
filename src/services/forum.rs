//! Forum service
//!
//! Business logic for the community forums: board listings with activity
//! aggregates, topic creation with title/content validation, and replies
//! with the locked-topic rule.

use crate::db::repositories::{ForumRepository, PostRepository, TopicRepository};
use crate::models::{
    CreatePostInput, CreateTopicInput, Forum, ForumPost, ForumSummary, ForumTopic, TopicSummary,
};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Topic title length bounds (characters, after trimming)
const TITLE_MIN_CHARS: usize = 3;
const TITLE_MAX_CHARS: usize = 255;

/// Minimum topic content length in characters
const CONTENT_MIN_CHARS: usize = 10;

/// Error types for forum service operations
#[derive(Debug, thiserror::Error)]
pub enum ForumServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Forum, topic, or post not found
    #[error("{0}")]
    NotFound(String),

    /// The topic is locked and accepts no new replies
    #[error("Topic is locked")]
    TopicLocked,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A topic together with its replies in chronological order
#[derive(Debug, Clone, serde::Serialize)]
pub struct TopicWithPosts {
    #[serde(flatten)]
    pub topic: ForumTopic,
    pub posts: Vec<ForumPost>,
}

/// Forum service
pub struct ForumService {
    forum_repo: Arc<dyn ForumRepository>,
    topic_repo: Arc<dyn TopicRepository>,
    post_repo: Arc<dyn PostRepository>,
}

impl ForumService {
    /// Create a new forum service
    pub fn new(
        forum_repo: Arc<dyn ForumRepository>,
        topic_repo: Arc<dyn TopicRepository>,
        post_repo: Arc<dyn PostRepository>,
    ) -> Self {
        Self {
            forum_repo,
            topic_repo,
            post_repo,
        }
    }

    /// List all forums with their activity aggregates
    pub async fn list_forums(&self) -> Result<Vec<ForumSummary>, ForumServiceError> {
        let forums = self
            .forum_repo
            .list()
            .await
            .context("Failed to list forums")?;

        Ok(forums)
    }

    /// Get a forum by slug
    pub async fn get_forum(&self, slug: &str) -> Result<Forum, ForumServiceError> {
        self.forum_repo
            .get_by_slug(slug)
            .await
            .context("Failed to get forum")?
            .ok_or_else(|| ForumServiceError::NotFound("Forum not found".to_string()))
    }

    /// List a forum's topics, pinned first then newest
    ///
    /// A forum with no topics yields an empty list.
    pub async fn list_topics(&self, slug: &str) -> Result<Vec<TopicSummary>, ForumServiceError> {
        let forum = self.get_forum(slug).await?;

        let topics = self
            .topic_repo
            .list_by_forum(forum.id)
            .await
            .context("Failed to list topics")?;

        Ok(topics)
    }

    /// Create a topic in a forum
    ///
    /// The title is trimmed and must be 3..=255 characters; the content must
    /// be at least 10 characters. Validation failures happen before any
    /// database write.
    pub async fn create_topic(
        &self,
        slug: &str,
        author_id: i64,
        mut input: CreateTopicInput,
    ) -> Result<ForumTopic, ForumServiceError> {
        input.title = input.title.trim().to_string();

        let title_chars = input.title.chars().count();
        if title_chars < TITLE_MIN_CHARS {
            return Err(ForumServiceError::ValidationError(format!(
                "Title must be at least {} characters",
                TITLE_MIN_CHARS
            )));
        }
        if title_chars > TITLE_MAX_CHARS {
            return Err(ForumServiceError::ValidationError(format!(
                "Title must be at most {} characters",
                TITLE_MAX_CHARS
            )));
        }
        if input.content.chars().count() < CONTENT_MIN_CHARS {
            return Err(ForumServiceError::ValidationError(format!(
                "Content must be at least {} characters",
                CONTENT_MIN_CHARS
            )));
        }

        let forum = self.get_forum(slug).await?;

        let created = self
            .topic_repo
            .create(forum.id, author_id, &input)
            .await
            .context("Failed to create topic")?;

        tracing::info!(topic_id = created.id, forum_id = forum.id, author_id, "Topic created");
        Ok(created)
    }

    /// Get a topic with its posts in chronological order
    pub async fn get_topic(&self, topic_id: i64) -> Result<TopicWithPosts, ForumServiceError> {
        let topic = self
            .topic_repo
            .get_by_id(topic_id)
            .await
            .context("Failed to get topic")?
            .ok_or_else(|| ForumServiceError::NotFound("Topic not found".to_string()))?;

        let posts = self
            .post_repo
            .list_by_topic(topic_id)
            .await
            .context("Failed to list posts")?;

        Ok(TopicWithPosts { topic, posts })
    }

    /// Post a reply in a topic
    ///
    /// Locked topics reject new replies.
    pub async fn create_post(
        &self,
        topic_id: i64,
        author_id: i64,
        input: CreatePostInput,
    ) -> Result<ForumPost, ForumServiceError> {
        if input.content.trim().is_empty() {
            return Err(ForumServiceError::ValidationError(
                "Content cannot be empty".to_string(),
            ));
        }

        let topic = self
            .topic_repo
            .get_by_id(topic_id)
            .await
            .context("Failed to get topic")?
            .ok_or_else(|| ForumServiceError::NotFound("Topic not found".to_string()))?;

        if topic.is_locked {
            return Err(ForumServiceError::TopicLocked);
        }

        let created = self
            .post_repo
            .create(topic_id, author_id, &input)
            .await
            .context("Failed to create post")?;

        Ok(created)
    }

    /// Most recent topics started by an author
    pub async fn recent_topics_by_author(
        &self,
        author_id: i64,
        limit: i64,
    ) -> Result<Vec<ForumTopic>, ForumServiceError> {
        let topics = self
            .topic_repo
            .recent_by_author(author_id, limit)
            .await
            .context("Failed to list recent topics")?;

        Ok(topics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxForumRepository, SqlxPostRepository, SqlxTopicRepository, TopicRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use chrono::Utc;

    async fn setup_test_service() -> (DynDatabasePool, ForumService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = ForumService::new(
            SqlxForumRepository::boxed(pool.clone()),
            SqlxTopicRepository::boxed(pool.clone()),
            SqlxPostRepository::boxed(pool.clone()),
        );
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

    fn topic_input(title: &str) -> CreateTopicInput {
        CreateTopicInput {
            title: title.to_string(),
            content: "This is long enough content.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_forums_includes_seeds() {
        let (_pool, service) = setup_test_service().await;

        let forums = service.list_forums().await.unwrap();
        assert_eq!(forums.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_forum_slug_is_not_found() {
        let (_pool, service) = setup_test_service().await;

        let result = service.get_forum("no-such-board").await;
        match result {
            Err(ForumServiceError::NotFound(message)) => {
                assert_eq!(message, "Forum not found");
            }
            other => panic!("Expected NotFound, got {:?}", other.map(|f| f.slug)),
        }
    }

    #[tokio::test]
    async fn test_empty_forum_yields_empty_topic_list() {
        let (_pool, service) = setup_test_service().await;

        let topics = service.list_topics("general-support").await.unwrap();
        assert!(topics.is_empty());
    }

    #[tokio::test]
    async fn test_short_title_rejected_without_insert() {
        let (pool, service) = setup_test_service().await;
        create_test_user(&pool, 1).await;

        let result = service
            .create_topic("general-support", 1, topic_input("ab"))
            .await;
        assert!(matches!(result, Err(ForumServiceError::ValidationError(_))));

        // Nothing was written
        let topics = service.list_topics("general-support").await.unwrap();
        assert!(topics.is_empty());
    }

    #[tokio::test]
    async fn test_title_is_trimmed_before_validation() {
        let (pool, service) = setup_test_service().await;
        create_test_user(&pool, 1).await;

        // Whitespace padding does not rescue a short title
        let result = service
            .create_topic("general-support", 1, topic_input("  ab  "))
            .await;
        assert!(matches!(result, Err(ForumServiceError::ValidationError(_))));

        // A valid title is stored trimmed
        let topic = service
            .create_topic("general-support", 1, topic_input("  Getting started  "))
            .await
            .unwrap();
        assert_eq!(topic.title, "Getting started");
    }

    #[tokio::test]
    async fn test_short_content_rejected() {
        let (pool, service) = setup_test_service().await;
        create_test_user(&pool, 1).await;

        let input = CreateTopicInput {
            title: "Valid title".to_string(),
            content: "too short".to_string().chars().take(5).collect(),
        };
        let result = service.create_topic("general-support", 1, input).await;
        assert!(matches!(result, Err(ForumServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_and_get_topic_with_posts() {
        let (pool, service) = setup_test_service().await;
        create_test_user(&pool, 1).await;
        create_test_user(&pool, 2).await;

        let topic = service
            .create_topic("general-support", 1, topic_input("Getting started"))
            .await
            .unwrap();

        service
            .create_post(
                topic.id,
                2,
                CreatePostInput {
                    content: "Welcome aboard!".to_string(),
                },
            )
            .await
            .unwrap();

        let with_posts = service.get_topic(topic.id).await.unwrap();
        assert_eq!(with_posts.topic.id, topic.id);
        assert_eq!(with_posts.posts.len(), 1);
        assert_eq!(with_posts.posts[0].content, "Welcome aboard!");

        let summaries = service.list_topics("general-support").await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].reply_count, 1);
        assert!(summaries[0].latest_reply_at.is_some());
        assert_eq!(summaries[0].latest_reply_author.as_deref(), Some("user2"));
    }

    #[tokio::test]
    async fn test_locked_topic_rejects_posts() {
        let (pool, service) = setup_test_service().await;
        create_test_user(&pool, 1).await;

        let topic = service
            .create_topic("general-support", 1, topic_input("Locked thread"))
            .await
            .unwrap();

        let topic_repo = SqlxTopicRepository::new(pool.clone());
        topic_repo.set_locked(topic.id, true).await.unwrap();

        let result = service
            .create_post(
                topic.id,
                1,
                CreatePostInput {
                    content: "Can I still reply?".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(ForumServiceError::TopicLocked)));
    }

    #[tokio::test]
    async fn test_post_on_missing_topic_is_not_found() {
        let (pool, service) = setup_test_service().await;
        create_test_user(&pool, 1).await;

        let result = service
            .create_post(
                999,
                1,
                CreatePostInput {
                    content: "Hello?".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(ForumServiceError::NotFound(_))));
    }
}
