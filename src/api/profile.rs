//! Profile API endpoints
//!
//! - GET /api/v1/profile - Get the caller's profile (created on first access)
//! - PUT /api/v1/profile - Update the caller's profile and preferences

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{UpdateProfileInput, UserProfile};

/// Build profile routes (all require auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile))
        .route("/", put(update_profile))
}

/// GET /api/v1/profile - Get the caller's profile
///
/// A missing profile is created with default preferences and a display name
/// derived from the email address.
async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state.profile_service.get_or_create(&user.0).await?;
    Ok(Json(profile))
}

/// PUT /api/v1/profile - Update the caller's profile
async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<UpdateProfileInput>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.profile_service.update(&user.0, input).await?;
    Ok(Json(updated))
}
