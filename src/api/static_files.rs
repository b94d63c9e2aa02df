//! Static file serving for the built front-end
//!
//! Files are served from the configured assets directory. Unknown paths fall
//! back to index.html so the single-page front end can handle routing.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::Response,
};
use tokio::fs;

use crate::api::middleware::AppState;

/// Serve static files from the assets directory
pub async fn serve_static(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    // URL decode the path to handle encoded characters
    let decoded_path = urlencoding::decode(path).unwrap_or_else(|_| path.into());
    let asset_path = decoded_path.trim_start_matches('/');
    let asset_path = if asset_path.is_empty() {
        "index.html"
    } else {
        asset_path
    };

    // Never follow path traversal out of the assets directory
    if asset_path.split('/').any(|segment| segment == "..") {
        return not_found();
    }

    let file_path = state.assets_config.path.join(asset_path);
    if let Ok(contents) = fs::read(&file_path).await {
        return build_response(asset_path, &contents);
    }

    // SPA fallback: serve index.html for all page routes
    let index_path = state.assets_config.path.join("index.html");
    if let Ok(contents) = fs::read(&index_path).await {
        return build_response("index.html", &contents);
    }

    not_found()
}

/// Build HTTP response with proper headers
fn build_response(path: &str, data: &[u8]) -> Response {
    let content_type = get_content_type(path);
    let cache_control = if is_immutable(path) {
        "public, max-age=31536000, immutable"
    } else if content_type.starts_with("text/html") {
        "no-cache"
    } else {
        "public, max-age=3600"
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, cache_control)
        .body(Body::from(data.to_vec()))
        .unwrap_or_else(|_| not_found())
}

/// 404 response
fn not_found() -> Response {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Body::from("<html><body><h1>404 Not Found</h1></body></html>"))
        .expect("static 404 response")
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "webp" => "image/webp",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Check if file is immutable (hashed filename)
fn is_immutable(path: &str) -> bool {
    path.contains("assets/") && (path.ends_with(".js") || path.ends_with(".css"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for_common_files() {
        assert_eq!(get_content_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(get_content_type("app.css"), "text/css");
        assert_eq!(get_content_type("bundle.js"), "application/javascript");
        assert_eq!(get_content_type("logo.svg"), "image/svg+xml");
        assert_eq!(get_content_type("unknown.bin"), "application/octet-stream");
    }

    #[test]
    fn test_hashed_assets_are_immutable() {
        assert!(is_immutable("assets/index-a1b2c3.js"));
        assert!(is_immutable("assets/style-d4e5f6.css"));
        assert!(!is_immutable("index.html"));
        assert!(!is_immutable("assets/logo.png"));
    }
}
