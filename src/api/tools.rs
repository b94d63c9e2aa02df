//! Tool directory API endpoints
//!
//! - GET    /api/v1/tools                 - List active tools
//! - GET    /api/v1/tools/{id}            - Get a tool
//! - GET    /api/v1/tools/{id}/reviews    - List a tool's reviews
//! - POST   /api/v1/tools                 - Submit a tool (auth)
//! - PUT    /api/v1/tools/{id}            - Update a tool (auth, owner)
//! - DELETE /api/v1/tools/{id}            - Delete a tool (auth, owner)
//! - POST   /api/v1/tools/{id}/reviews            - Submit a review (auth)
//! - POST   /api/v1/tools/reviews/{id}/helpful    - Mark a review helpful (auth)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{default_page, default_per_page};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{CreateReviewInput, CreateToolInput, ListParams, Tool, UpdateToolInput};

/// Query parameters for listing tools
#[derive(Debug, Deserialize)]
pub struct ListToolsQuery {
    /// Optional category filter (JSON-array membership match)
    pub category: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Build public tool routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tools))
        .route("/{id}", get(get_tool))
        .route("/{id}/reviews", get(list_reviews))
}

/// Build protected tool routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_tool))
        .route("/{id}", put(update_tool))
        .route("/{id}", delete(delete_tool))
        .route("/{id}/reviews", post(submit_review))
        .route("/reviews/{id}/helpful", post(mark_helpful))
}

/// GET /api/v1/tools - List active tools
async fn list_tools(
    State(state): State<AppState>,
    Query(query): Query<ListToolsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = ListParams::new(query.page, query.per_page);
    let page = state
        .tool_service
        .list(query.category.as_deref(), &params)
        .await?;

    Ok(Json(page))
}

/// GET /api/v1/tools/{id} - Get a tool
async fn get_tool(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Tool>, ApiError> {
    let tool = state
        .tool_service
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tool not found"))?;

    Ok(Json(tool))
}

/// GET /api/v1/tools/{id}/reviews - List a tool's reviews, newest first
async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let reviews = state.tool_service.list_reviews(id).await?;
    Ok(Json(reviews))
}

/// POST /api/v1/tools - Submit a tool
///
/// Requires authentication. The caller becomes the author.
async fn create_tool(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<CreateToolInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.tool_service.create(input, user.0.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/tools/{id} - Update a tool
///
/// Requires authentication; the caller must be the author.
async fn update_tool(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateToolInput>,
) -> Result<Json<Tool>, ApiError> {
    check_ownership(&state, id, &user).await?;

    let updated = state.tool_service.update(id, input).await?;
    Ok(Json(updated))
}

/// DELETE /api/v1/tools/{id} - Delete a tool (reviews cascade)
///
/// Requires authentication; the caller must be the author.
async fn delete_tool(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    check_ownership(&state, id, &user).await?;

    state.tool_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/tools/{id}/reviews - Submit a review
///
/// Requires authentication. One review per user per tool.
async fn submit_review(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<CreateReviewInput>,
) -> Result<impl IntoResponse, ApiError> {
    let review = state.tool_service.submit_review(id, user.0.id, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// POST /api/v1/tools/reviews/{id}/helpful - Mark a review helpful
///
/// Requires authentication.
async fn mark_helpful(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.tool_service.mark_helpful(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Verify the caller owns the tool before a mutation
async fn check_ownership(
    state: &AppState,
    id: i64,
    user: &AuthenticatedUser,
) -> Result<(), ApiError> {
    let tool = state
        .tool_service
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tool not found"))?;

    if !user.0.owns(tool.author_id) {
        return Err(ApiError::forbidden("You do not own this tool"));
    }
    Ok(())
}
