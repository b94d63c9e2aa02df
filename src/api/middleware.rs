//! API middleware
//!
//! Contains middleware for:
//! - Authentication (session token validation)
//! - Page-level auth redirects for the protected front-end routes

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{AssetsConfig, AuthConfig};
use crate::models::User;
use crate::services::{
    ForumService, ForumServiceError, ProfileService, ProfileServiceError, ResourceService,
    ResourceServiceError, ToolService, ToolServiceError, UserService, UserServiceError,
};

/// Page prefixes that require a signed-in user
const PROTECTED_PAGE_PREFIXES: &[&str] =
    &["/dashboard", "/resources/submit", "/tools/submit", "/profile"];

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub resource_service: Arc<ResourceService>,
    pub tool_service: Arc<ToolService>,
    pub forum_service: Arc<ForumService>,
    pub profile_service: Arc<ProfileService>,
    pub auth_config: Arc<AuthConfig>,
    pub assets_config: Arc<AssetsConfig>,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "TOPIC_LOCKED" => StatusCode::LOCKED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::UserExists(msg) => ApiError::conflict(msg),
            UserServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<ResourceServiceError> for ApiError {
    fn from(e: ResourceServiceError) -> Self {
        match e {
            ResourceServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ResourceServiceError::NotFound => ApiError::not_found("Resource not found"),
            ResourceServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<ToolServiceError> for ApiError {
    fn from(e: ToolServiceError) -> Self {
        match e {
            ToolServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ToolServiceError::NotFound => ApiError::not_found("Tool not found"),
            ToolServiceError::DuplicateReview => {
                ApiError::conflict("You have already reviewed this tool")
            }
            ToolServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<ForumServiceError> for ApiError {
    fn from(e: ForumServiceError) -> Self {
        match e {
            ForumServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ForumServiceError::NotFound(msg) => ApiError::not_found(msg),
            ForumServiceError::TopicLocked => ApiError::new("TOPIC_LOCKED", "Topic is locked"),
            ForumServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<ProfileServiceError> for ApiError {
    fn from(e: ProfileServiceError) -> Self {
        match e {
            ProfileServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ProfileServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

/// Extract session token from request
pub(crate) fn extract_session_token(request: &Request) -> Option<String> {
    token_from_headers(request.headers())
}

/// Extract session token from a header map (Bearer first, then cookie)
pub(crate) fn token_from_headers(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(|e| ApiError::internal_error(format!("Session validation failed: {}", e)))?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Check whether a path belongs to one of the protected page prefixes
pub(crate) fn is_protected_page(path: &str) -> bool {
    PROTECTED_PAGE_PREFIXES.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Build the sign-in redirect for an unauthenticated page request
pub(crate) fn signin_redirect(path: &str) -> Response {
    let target = format!(
        "/auth/signin?redirected_from={}",
        urlencoding::encode(path)
    );

    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(header::LOCATION, target)
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::SEE_OTHER.into_response())
}

/// Page-level auth redirect middleware
///
/// Unauthenticated requests to the protected page prefixes are answered with
/// a 303 redirect to the sign-in page, carrying the original path in the
/// `redirected_from` query parameter. Everything else passes through.
pub async fn page_auth_redirect(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !is_protected_page(&path) {
        return next.run(request).await;
    }

    if let Some(token) = extract_session_token(&request) {
        if let Ok(Some(_user)) = state.user_service.validate_session(&token).await {
            return next.run(request).await;
        }
    }

    tracing::debug!(path = %path, "Redirecting unauthenticated page request to sign-in");
    signin_redirect(&path)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn protected_prefix_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("/dashboard"),
            Just("/resources/submit"),
            Just("/tools/submit"),
            Just("/profile"),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Every sub-path of a protected prefix is itself protected.
        #[test]
        fn property_protected_subpaths(
            prefix in protected_prefix_strategy(),
            segment in "[a-z0-9-]{1,12}",
        ) {
            let subpath = format!("{}/{}", prefix, segment);
            prop_assert!(is_protected_page(prefix));
            prop_assert!(is_protected_page(&subpath));
        }

        /// The redirect target always round-trips the original path through
        /// the `redirected_from` query parameter.
        #[test]
        fn property_redirect_preserves_path(
            prefix in protected_prefix_strategy(),
            segment in "[a-z0-9-]{1,12}",
        ) {
            let path = format!("{}/{}", prefix, segment);
            let response = signin_redirect(&path);
            prop_assert_eq!(response.status(), StatusCode::SEE_OTHER);

            let location = response
                .headers()
                .get(axum::http::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap()
                .to_string();
            let encoded = location
                .strip_prefix("/auth/signin?redirected_from=")
                .unwrap();
            let decoded = urlencoding::decode(encoded).unwrap();
            prop_assert_eq!(decoded.as_ref(), path.as_str());
        }

        /// Paths outside the protected prefixes never trigger the guard.
        #[test]
        fn property_other_paths_unaffected(segment in "[a-z0-9-]{1,12}") {
            prop_assume!(segment != "submit");
            let resource_path = format!("/resources/{}", segment);
            let forum_path = format!("/forums/{}", segment);
            prop_assert!(!is_protected_page(&resource_path));
            prop_assert!(!is_protected_page(&forum_path));
        }
    }
}
