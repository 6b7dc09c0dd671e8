use crate::models::{Genre, Movie, Ranking, Role, User};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool, types::Json};
use std::sync::Arc;
use uuid::Uuid;

/// RepositoryError
///
/// Failures surfaced by the persistence layer. Handlers convert these into `ApiError`.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The write collided with an existing record (e.g. a duplicate `imdb_id`).
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// Defines the contract for every persistence operation the handlers need. Handlers only
/// ever see `Arc<dyn Repository>`, so the Postgres implementation can be swapped for
/// an in-test mock.
///
/// **Send + Sync + async_trait** are required to share the trait object across Axum's
/// asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Catalog ---
    async fn get_movies(&self) -> RepositoryResult<Vec<Movie>>;
    async fn get_movie(&self, imdb_id: &str) -> RepositoryResult<Option<Movie>>;
    // Fails with `Conflict` if a movie with the same imdb_id exists.
    async fn add_movie(&self, movie: Movie) -> RepositoryResult<Movie>;
    async fn get_genres(&self) -> RepositoryResult<Vec<Genre>>;

    // --- Reviews ---
    // All rankings ordered by value, `Not_Ranked` included.
    async fn get_rankings(&self) -> RepositoryResult<Vec<Ranking>>;
    // Returns false when no movie matched `imdb_id`.
    async fn update_review(
        &self,
        imdb_id: &str,
        admin_review: &str,
        ranking: &Ranking,
    ) -> RepositoryResult<bool>;

    // --- Recommendations ---
    async fn get_user(&self, user_id: Uuid) -> RepositoryResult<Option<User>>;
    /// Movies tagged with any of `genre_names`, best ranking first, at most `limit`.
    async fn get_recommended_movies(
        &self,
        genre_names: &[String],
        limit: i64,
    ) -> RepositoryResult<Vec<Movie>>;
}

/// RepositoryState
///
/// The persistence handle shared read-only by every handler through the application state.
pub type RepositoryState = Arc<dyn Repository>;

// Row shapes. Genres live in a jsonb column and the ranking is flattened into two columns.

#[derive(FromRow)]
struct MovieRow {
    imdb_id: String,
    title: String,
    poster_path: String,
    youtube_id: String,
    genre: Json<Vec<Genre>>,
    admin_review: String,
    ranking_value: i32,
    ranking_name: String,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            imdb_id: row.imdb_id,
            title: row.title,
            poster_path: row.poster_path,
            youtube_id: row.youtube_id,
            genre: row.genre.0,
            admin_review: row.admin_review,
            ranking: Ranking {
                ranking_value: row.ranking_value,
                ranking_name: row.ranking_name,
            },
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    role: String,
    favourite_genres: Json<Vec<Genre>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let role = match row.role.as_str() {
            "ADMIN" => Role::Admin,
            _ => Role::User,
        };
        User {
            user_id: row.user_id,
            email: row.email,
            role,
            favourite_genres: row.favourite_genres.0,
        }
    }
}

const MOVIE_COLUMNS: &str =
    "imdb_id, title, poster_path, youtube_id, genre, admin_review, ranking_value, ranking_name";

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL (see `migrations/`).
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_movies(&self) -> RepositoryResult<Vec<Movie>> {
        let query = format!("SELECT {MOVIE_COLUMNS} FROM movies ORDER BY title ASC");
        let rows = sqlx::query_as::<_, MovieRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn get_movie(&self, imdb_id: &str) -> RepositoryResult<Option<Movie>> {
        let query = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE imdb_id = $1");
        let row = sqlx::query_as::<_, MovieRow>(&query)
            .bind(imdb_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Movie::from))
    }

    /// add_movie
    ///
    /// Uses `ON CONFLICT DO NOTHING` so a duplicate imdb_id yields no row instead of a
    /// constraint error; that case is reported as `Conflict`.
    async fn add_movie(&self, movie: Movie) -> RepositoryResult<Movie> {
        let query = format!(
            r#"INSERT INTO movies ({MOVIE_COLUMNS}, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
               ON CONFLICT (imdb_id) DO NOTHING
               RETURNING {MOVIE_COLUMNS}"#
        );
        let row = sqlx::query_as::<_, MovieRow>(&query)
            .bind(&movie.imdb_id)
            .bind(&movie.title)
            .bind(&movie.poster_path)
            .bind(&movie.youtube_id)
            .bind(Json(&movie.genre))
            .bind(&movie.admin_review)
            .bind(movie.ranking.ranking_value)
            .bind(&movie.ranking.ranking_name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Movie::from).ok_or_else(|| {
            RepositoryError::Conflict(format!("Movie {} already exists", movie.imdb_id))
        })
    }

    async fn get_genres(&self) -> RepositoryResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, (i32, String)>(
            "SELECT genre_id, genre_name FROM genres ORDER BY genre_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(genres
            .into_iter()
            .map(|(genre_id, genre_name)| Genre { genre_id, genre_name })
            .collect())
    }

    async fn get_rankings(&self) -> RepositoryResult<Vec<Ranking>> {
        let rankings = sqlx::query_as::<_, (i32, String)>(
            "SELECT ranking_value, ranking_name FROM rankings ORDER BY ranking_value ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rankings
            .into_iter()
            .map(|(ranking_value, ranking_name)| Ranking { ranking_value, ranking_name })
            .collect())
    }

    async fn update_review(
        &self,
        imdb_id: &str,
        admin_review: &str,
        ranking: &Ranking,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"UPDATE movies
               SET admin_review = $2, ranking_value = $3, ranking_name = $4, updated_at = NOW()
               WHERE imdb_id = $1"#,
        )
        .bind(imdb_id)
        .bind(admin_review)
        .bind(ranking.ranking_value)
        .bind(&ranking.ranking_name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_user(&self, user_id: Uuid) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, email, role, favourite_genres FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// get_recommended_movies
    ///
    /// Matches on genre name inside the jsonb `genre` array; ties on ranking fall back to title.
    async fn get_recommended_movies(
        &self,
        genre_names: &[String],
        limit: i64,
    ) -> RepositoryResult<Vec<Movie>> {
        let query = format!(
            r#"SELECT {MOVIE_COLUMNS} FROM movies m
               WHERE EXISTS (
                   SELECT 1 FROM jsonb_array_elements(m.genre) g
                   WHERE g->>'genre_name' = ANY($1)
               )
               ORDER BY m.ranking_value ASC, m.title ASC
               LIMIT $2"#
        );
        let rows = sqlx::query_as::<_, MovieRow>(&query)
            .bind(genre_names)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }
}
