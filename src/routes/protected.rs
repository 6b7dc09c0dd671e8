use crate::{AppState, auth, handlers};
use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

/// Protected Router Module
///
/// Binds the catalog endpoints that require an authenticated caller and puts the
/// authentication gate in front of all of them.
///
/// Access Control:
/// The gate is attached with `route_layer` on each method router, so it wraps the bound
/// handlers only. Unknown paths (404) and wrong methods (405) are answered by the router
/// without touching the gate or a handler. A router-level `route_layer` would also wrap
/// each route's 405 fallback, so it must stay per route. A request the gate rejects (401)
/// never reaches its handler. Admin-only checks happen inside the handler.
///
/// The persistence handle travels in `state` and is shared read-only by every handler.
pub fn protected_routes(state: AppState) -> Router<AppState> {
    let gate = middleware::from_fn_with_state(state, auth::auth_middleware);

    Router::new()
        // GET /movie/{imdb_id}
        // Single movie lookup by IMDb id.
        .route(
            "/movie/{imdb_id}",
            get(handlers::get_movie).route_layer(gate.clone()),
        )
        // POST /addmovie
        // Adds a validated movie to the catalog.
        .route("/addmovie", post(handlers::add_movie).route_layer(gate.clone()))
        // GET /recommendedmovies
        // Best-ranked movies in the caller's favourite genres.
        .route(
            "/recommendedmovies",
            get(handlers::get_recommended_movies).route_layer(gate.clone()),
        )
        // PATCH /updatereview/{imdb_id}
        // ADMIN only. Stores the admin review and re-ranks the movie from it.
        .route(
            "/updatereview/{imdb_id}",
            patch(handlers::admin_review_update).route_layer(gate),
        )
}
