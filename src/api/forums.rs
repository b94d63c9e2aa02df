//! Community forum API endpoints
//!
//! - GET  /api/v1/forums                      - List forums with activity aggregates
//! - GET  /api/v1/forums/{slug}/topics        - List a forum's topics
//! - POST /api/v1/forums/{slug}/topics        - Start a topic (auth)
//! - GET  /api/v1/forums/topics/{id}          - Get a topic with its posts
//! - POST /api/v1/forums/topics/{id}/posts    - Reply in a topic (auth)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{CreatePostInput, CreateTopicInput};
use crate::services::TopicWithPosts;

/// Build public forum routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_forums))
        .route("/{slug}/topics", get(list_topics))
        .route("/topics/{id}", get(get_topic))
}

/// Build protected forum routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/{slug}/topics", post(create_topic))
        .route("/topics/{id}/posts", post(create_post))
}

/// GET /api/v1/forums - List forums with topic/post counts and latest activity
async fn list_forums(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let forums = state.forum_service.list_forums().await?;
    Ok(Json(forums))
}

/// GET /api/v1/forums/{slug}/topics - List a forum's topics, pinned first
async fn list_topics(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let topics = state.forum_service.list_topics(&slug).await?;
    Ok(Json(topics))
}

/// POST /api/v1/forums/{slug}/topics - Start a topic
///
/// Requires authentication. Title and content are validated before anything
/// is written.
async fn create_topic(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
    Json(input): Json<CreateTopicInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .forum_service
        .create_topic(&slug, user.0.id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/forums/topics/{id} - Get a topic with its posts in order
async fn get_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TopicWithPosts>, ApiError> {
    let topic = state.forum_service.get_topic(id).await?;
    Ok(Json(topic))
}

/// POST /api/v1/forums/topics/{id}/posts - Reply in a topic
///
/// Requires authentication. Locked topics reject replies.
async fn create_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<CreatePostInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.forum_service.create_post(id, user.0.id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
