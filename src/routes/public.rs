use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only endpoints open to anonymous clients: liveness and the catalog browse lists
/// the web client shows before sign-in.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Used by monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // GET /movies
        .route("/movies", get(handlers::get_movies))
        // GET /genres
        .route("/genres", get(handlers::get_genres))
}
