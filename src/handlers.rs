use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{AdminReviewUpdateRequest, AdminReviewUpdateResponse, Genre, Movie},
    ranking::resolve_ranking,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

// --- Public Handlers ---

/// get_movies
///
/// [Public Route] Lists the whole catalog.
#[utoipa::path(
    get,
    path = "/movies",
    responses((status = 200, description = "All movies", body = [Movie]))
)]
pub async fn get_movies(State(state): State<AppState>) -> Result<Json<Vec<Movie>>, ApiError> {
    Ok(Json(state.repo.get_movies().await?))
}

/// get_genres
///
/// [Public Route] Lists the genres a movie can be tagged with.
#[utoipa::path(
    get,
    path = "/genres",
    responses((status = 200, description = "All genres", body = [Genre]))
)]
pub async fn get_genres(State(state): State<AppState>) -> Result<Json<Vec<Genre>>, ApiError> {
    Ok(Json(state.repo.get_genres().await?))
}

// --- Protected Handlers ---

/// get_movie
///
/// [Protected Route] Retrieves a single movie by its IMDb id.
#[utoipa::path(
    get,
    path = "/movie/{imdb_id}",
    params(("imdb_id" = String, Path, description = "IMDb id, e.g. tt0111161")),
    responses(
        (status = 200, description = "Found", body = Movie),
        (status = 400, description = "Missing id"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_movie(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> Result<Json<Movie>, ApiError> {
    let imdb_id = imdb_id.trim();
    if imdb_id.is_empty() {
        return Err(ApiError::BadRequest("Movie ID is required".to_string()));
    }

    state
        .repo
        .get_movie(imdb_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Movie not found".to_string()))
}

/// add_movie
///
/// [Protected Route] Adds a movie to the catalog. The payload is validated field by
/// field; a movie without an admin review should carry the `Not_Ranked` ranking.
#[utoipa::path(
    post,
    path = "/addmovie",
    request_body = Movie,
    responses(
        (status = 201, description = "Created", body = Movie),
        (status = 400, description = "Invalid input or validation failure"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Duplicate imdb_id")
    )
)]
pub async fn add_movie(
    State(state): State<AppState>,
    payload: Result<Json<Movie>, JsonRejection>,
) -> Result<(StatusCode, Json<Movie>), ApiError> {
    let Json(movie) = payload.map_err(|rejection| {
        tracing::debug!("add_movie rejected body: {}", rejection.body_text());
        ApiError::BadRequest("Invalid input".to_string())
    })?;

    if let Err(details) = movie.validate() {
        return Err(ApiError::Validation {
            message: "Validation failed".to_string(),
            details,
        });
    }

    let created = state.repo.add_movie(movie).await.map_err(|e| match ApiError::from(e) {
        conflict @ ApiError::Conflict(_) => conflict,
        _ => ApiError::Internal("Failed to add movie".to_string()),
    })?;

    tracing::info!(imdb_id = %created.imdb_id, "movie added");
    Ok((StatusCode::CREATED, Json(created)))
}

/// get_recommended_movies
///
/// [Protected Route] Recommends movies in the caller's favourite genres, best ranked
/// first, capped at the configured limit. Callers with no favourite genres get an
/// empty list.
#[utoipa::path(
    get,
    path = "/recommendedmovies",
    responses(
        (status = 200, description = "Recommended movies", body = [Movie]),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User profile not found")
    )
)]
pub async fn get_recommended_movies(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let genre_names: Vec<String> = user
        .favourite_genres
        .into_iter()
        .map(|genre| genre.genre_name)
        .collect();

    if genre_names.is_empty() {
        return Ok(Json(vec![]));
    }

    let movies = state
        .repo
        .get_recommended_movies(&genre_names, state.config.recommended_movie_limit)
        .await?;
    Ok(Json(movies))
}

/// admin_review_update
///
/// [Protected Route, ADMIN only] Stores an admin review and re-ranks the movie. The
/// review text is classified by the configured `ReviewRanker` into one of the known
/// rankings, which is persisted alongside it.
#[utoipa::path(
    patch,
    path = "/updatereview/{imdb_id}",
    params(("imdb_id" = String, Path, description = "IMDb id, e.g. tt0111161")),
    request_body = AdminReviewUpdateRequest,
    responses(
        (status = 200, description = "Review stored", body = AdminReviewUpdateResponse),
        (status = 400, description = "Missing id or invalid body"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Movie not found"),
        (status = 502, description = "Review ranking failed")
    )
)]
pub async fn admin_review_update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
    payload: Result<Json<AdminReviewUpdateRequest>, JsonRejection>,
) -> Result<Json<AdminReviewUpdateResponse>, ApiError> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden(
            "User must be part of the ADMIN role".to_string(),
        ));
    }

    let imdb_id = imdb_id.trim();
    if imdb_id.is_empty() {
        return Err(ApiError::BadRequest("Movie ID is required".to_string()));
    }

    let Json(request) =
        payload.map_err(|_| ApiError::BadRequest("Invalid request body".to_string()))?;
    let admin_review = request.admin_review.trim();
    if admin_review.is_empty() {
        return Err(ApiError::BadRequest("Admin review is required".to_string()));
    }

    // Check the movie exists before paying for a ranking call.
    if state.repo.get_movie(imdb_id).await?.is_none() {
        return Err(ApiError::NotFound("Movie not found".to_string()));
    }

    let rankings = state.repo.get_rankings().await?;
    let answer = state.ranker.rank(admin_review, &rankings).await?;
    let ranking = resolve_ranking(&answer, &rankings)?;

    if !state
        .repo
        .update_review(imdb_id, admin_review, &ranking)
        .await?
    {
        return Err(ApiError::NotFound("Movie not found".to_string()));
    }

    tracing::info!(
        imdb_id = %imdb_id,
        admin = %user.id,
        ranking = %ranking.ranking_name,
        "admin review updated"
    );

    Ok(Json(AdminReviewUpdateResponse {
        ranking_name: ranking.ranking_name,
        admin_review: admin_review.to_string(),
    }))
}
