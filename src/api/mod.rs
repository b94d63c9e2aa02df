//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for FocusHub:
//! - Resource library endpoints
//! - Tool directory and review endpoints
//! - Forum, topic, and post endpoints
//! - Auth, profile, and dashboard endpoints
//! - Static file serving for the front end, with page-level auth redirects

pub mod auth;
pub mod common;
pub mod dashboard;
pub mod forums;
pub mod middleware;
pub mod profile;
pub mod resources;
pub mod static_files;
pub mod tools;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need a valid session)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/resources", resources::protected_router())
        .nest("/tools", tools::protected_router())
        .nest("/forums", forums::protected_router())
        .nest("/profile", profile::router())
        .route("/dashboard", get(dashboard::get_dashboard))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/resources", resources::public_router())
        .nest("/tools", tools::public_router())
        .nest("/forums", forums::public_router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS configuration (cookie-based auth needs credentials)
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        // Static file serving (for production)
        .fallback(static_files::serve_static)
        // Sign-in redirects for the protected front-end pages
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::page_auth_redirect,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
