use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, HeaderValue},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod ranking;
pub mod repository;

// Routing, split by access level (public / protected).
pub mod routes;
use routes::{protected, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use ranking::{MockReviewRanker, OpenAiReviewRanker, RankerState};
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json` and browsable
/// through the Swagger UI at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_movies, handlers::get_genres, handlers::get_movie,
        handlers::add_movie, handlers::get_recommended_movies, handlers::admin_review_update,
    ),
    components(
        schemas(
            models::Movie, models::Genre, models::Ranking, models::Role, models::User,
            models::AdminReviewUpdateRequest, models::AdminReviewUpdateResponse,
        )
    ),
    tags(
        (name = "magic-stream-movies", description = "Movie catalog and recommendation API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container shared by every request: persistence handle,
/// review ranker and configuration.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer, shared read-only by all handlers.
    pub repo: RepositoryState,
    /// Classifies admin reviews into rankings.
    pub ranker: RankerState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for RankerState {
    fn from_ref(app_state: &AppState) -> RankerState {
        app_state.ranker.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the full routing structure: docs, public routes, the protected group
/// behind the authentication gate, then the observability and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(protected::protected_routes(state.clone()))
        .with_state(state);

    // Request ID is set before tracing so every span carries it, then echoed back.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// cors_layer
///
/// Any origin when the allow-list is empty; otherwise only the listed origins.
/// Origins that are not valid header values are skipped with a warning.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, uri and the `x-request-id` so every log line
/// of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
