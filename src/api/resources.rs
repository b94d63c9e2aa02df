//! Resource library API endpoints
//!
//! - GET    /api/v1/resources            - List published resources
//! - GET    /api/v1/resources/search     - Search published resources
//! - GET    /api/v1/resources/{id}       - Get a resource
//! - POST   /api/v1/resources            - Submit a resource (auth)
//! - PUT    /api/v1/resources/{id}       - Update a resource (auth, owner)
//! - DELETE /api/v1/resources/{id}       - Delete a resource (auth, owner)
//! - POST   /api/v1/resources/{id}/view      - Record a view
//! - POST   /api/v1/resources/{id}/download  - Record a download

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
use crate::models::{
    CreateResourceInput, ListParams, Resource, ResourceKind, UpdateResourceInput,
};

/// Query parameters for listing resources
#[derive(Debug, Deserialize)]
pub struct ListResourcesQuery {
    /// Optional kind filter (article, research, worksheet, video, guide)
    pub kind: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Query parameters for searching resources
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<i64>,
}

/// Build public resource routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_resources))
        .route("/search", get(search_resources))
        .route("/{id}", get(get_resource))
        .route("/{id}/view", post(record_view))
        .route("/{id}/download", post(record_download))
}

/// Build protected resource routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_resource))
        .route("/{id}", put(update_resource))
        .route("/{id}", delete(delete_resource))
}

/// GET /api/v1/resources - List published resources
async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ListResourcesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = match query.kind.as_deref() {
        Some(raw) => Some(ResourceKind::from_str(raw).ok_or_else(|| {
            ApiError::validation_error(format!("Unknown resource kind: {}", raw))
        })?),
        None => None,
    };

    let params = ListParams::new(query.page, query.per_page);
    let page = state.resource_service.list(kind, &params).await?;

    Ok(Json(page))
}

/// GET /api/v1/resources/search - Search published resources
async fn search_resources(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let results = state
        .resource_service
        .search(&query.q, query.limit)
        .await?;

    Ok(Json(results))
}

/// GET /api/v1/resources/{id} - Get a resource
async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Resource>, ApiError> {
    let resource = state
        .resource_service
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource not found"))?;

    Ok(Json(resource))
}

/// POST /api/v1/resources - Submit a resource
///
/// Requires authentication. The caller becomes the author.
async fn create_resource(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<CreateResourceInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.resource_service.create(input, user.0.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/resources/{id} - Update a resource
///
/// Requires authentication; the caller must be the author.
async fn update_resource(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateResourceInput>,
) -> Result<Json<Resource>, ApiError> {
    check_ownership(&state, id, &user).await?;

    let updated = state.resource_service.update(id, input).await?;
    Ok(Json(updated))
}

/// DELETE /api/v1/resources/{id} - Delete a resource
///
/// Requires authentication; the caller must be the author.
async fn delete_resource(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    check_ownership(&state, id, &user).await?;

    state.resource_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resources/{id}/view - Record a view
async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.resource_service.record_view(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resources/{id}/download - Record a download
async fn record_download(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.resource_service.record_download(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Verify the caller owns the resource before a mutation
async fn check_ownership(
    state: &AppState,
    id: i64,
    user: &AuthenticatedUser,
) -> Result<(), ApiError> {
    let resource = state
        .resource_service
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource not found"))?;

    if !user.0.owns(resource.author_id) {
        return Err(ApiError::forbidden("You do not own this resource"));
    }
    Ok(())
}
