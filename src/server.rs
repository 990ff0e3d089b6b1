use crate::{app_state::AppState, handlers};
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

/// Create the application router with all routes and middleware
///
/// This function is used by both main.rs and integration tests to ensure
/// the same server configuration is used in both production and tests.
pub fn create_app(app_state: AppState) -> Router {
    use handlers::{get_path, get_root};

    Router::new()
        // GET (and HEAD) on any path resolves through the mounted buckets
        .route("/", get(get_root))
        .route("/{*path}", get(get_path))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
