#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Duration;
use magic_stream_movies::{
    AppConfig, AppState,
    auth::{Claims, encode_token},
    models::{Genre, Movie, Ranking, Role, User},
    ranking::MockReviewRanker,
    repository::{Repository, RepositoryError, RepositoryResult},
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use uuid::Uuid;

pub const USER_ID: Uuid = Uuid::from_u128(123);
pub const ADMIN_ID: Uuid = Uuid::from_u128(456);

// --- Mock Repository ---

/// Counts every call and records the arguments the handlers passed, so tests can assert
/// a request reached exactly the handler it was routed to.
#[derive(Default)]
pub struct CallLog {
    pub get_movies: AtomicUsize,
    pub get_movie: AtomicUsize,
    pub add_movie: AtomicUsize,
    pub get_genres: AtomicUsize,
    pub get_rankings: AtomicUsize,
    pub update_review: AtomicUsize,
    pub get_user: AtomicUsize,
    pub get_recommended_movies: AtomicUsize,

    pub last_movie_id: Mutex<Option<String>>,
    pub last_update: Mutex<Option<(String, String, Ranking)>>,
    pub last_recommendation: Mutex<Option<(Vec<String>, i64)>>,
}

impl CallLog {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        [
            &self.get_movies,
            &self.get_movie,
            &self.add_movie,
            &self.get_genres,
            &self.get_rankings,
            &self.update_review,
            &self.get_user,
            &self.get_recommended_movies,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

#[derive(Default)]
pub struct MockRepository {
    pub movies: Vec<Movie>,
    pub users: Vec<User>,
    // When true, add_movie reports a duplicate.
    pub conflict_on_add: bool,
    // When true, every call fails with a database error.
    pub fail: bool,
    pub calls: CallLog,
}

impl MockRepository {
    fn check(&self) -> RepositoryResult<()> {
        if self.fail {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for MockRepository {
    async fn get_movies(&self) -> RepositoryResult<Vec<Movie>> {
        self.calls.get_movies.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.movies.clone())
    }

    async fn get_movie(&self, imdb_id: &str) -> RepositoryResult<Option<Movie>> {
        self.calls.get_movie.fetch_add(1, Ordering::SeqCst);
        *self.calls.last_movie_id.lock().unwrap() = Some(imdb_id.to_string());
        self.check()?;
        Ok(self.movies.iter().find(|m| m.imdb_id == imdb_id).cloned())
    }

    async fn add_movie(&self, movie: Movie) -> RepositoryResult<Movie> {
        self.calls.add_movie.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.conflict_on_add || self.movies.iter().any(|m| m.imdb_id == movie.imdb_id) {
            return Err(RepositoryError::Conflict(format!(
                "Movie {} already exists",
                movie.imdb_id
            )));
        }
        Ok(movie)
    }

    async fn get_genres(&self) -> RepositoryResult<Vec<Genre>> {
        self.calls.get_genres.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(vec![genre(1, "Comedy"), genre(2, "Drama")])
    }

    async fn get_rankings(&self) -> RepositoryResult<Vec<Ranking>> {
        self.calls.get_rankings.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(rankings())
    }

    async fn update_review(
        &self,
        imdb_id: &str,
        admin_review: &str,
        ranking: &Ranking,
    ) -> RepositoryResult<bool> {
        self.calls.update_review.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        *self.calls.last_update.lock().unwrap() =
            Some((imdb_id.to_string(), admin_review.to_string(), ranking.clone()));
        Ok(self.movies.iter().any(|m| m.imdb_id == imdb_id))
    }

    async fn get_user(&self, user_id: Uuid) -> RepositoryResult<Option<User>> {
        self.calls.get_user.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn get_recommended_movies(
        &self,
        genre_names: &[String],
        limit: i64,
    ) -> RepositoryResult<Vec<Movie>> {
        self.calls.get_recommended_movies.fetch_add(1, Ordering::SeqCst);
        *self.calls.last_recommendation.lock().unwrap() = Some((genre_names.to_vec(), limit));
        self.check()?;

        let mut matching: Vec<Movie> = self
            .movies
            .iter()
            .filter(|m| m.genre.iter().any(|g| genre_names.contains(&g.genre_name)))
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.ranking.ranking_value);
        matching.truncate(limit.max(0) as usize);
        Ok(matching)
    }
}

// --- Fixtures ---

pub fn genre(id: i32, name: &str) -> Genre {
    Genre { genre_id: id, genre_name: name.to_string() }
}

pub fn ranking(value: i32, name: &str) -> Ranking {
    Ranking { ranking_value: value, ranking_name: name.to_string() }
}

pub fn rankings() -> Vec<Ranking> {
    vec![
        ranking(1, "Excellent"),
        ranking(2, "Good"),
        ranking(3, "Okay"),
        ranking(4, "Bad"),
        ranking(5, "Terrible"),
        Ranking::not_ranked(),
    ]
}

pub fn movie(imdb_id: &str, title: &str, genres: Vec<Genre>, ranking: Ranking) -> Movie {
    Movie {
        imdb_id: imdb_id.to_string(),
        title: title.to_string(),
        poster_path: format!("https://image.tmdb.org/t/p/w500/{imdb_id}.jpg"),
        youtube_id: "dQw4w9WgXcQ".to_string(),
        genre: genres,
        admin_review: String::new(),
        ranking,
    }
}

pub fn user(id: Uuid, role: Role, favourites: Vec<Genre>) -> User {
    User {
        user_id: id,
        email: format!("{}@example.com", id.simple()),
        role,
        favourite_genres: favourites,
    }
}

pub fn test_state(repo: Arc<MockRepository>, ranker: MockReviewRanker) -> AppState {
    AppState {
        repo,
        ranker: Arc::new(ranker),
        config: AppConfig::default(),
    }
}

/// Signs a token with the default (test) secret.
pub fn token_for(id: Uuid, role: Role, ttl: Duration) -> String {
    let claims = Claims::new(&user(id, role, vec![]), ttl);
    encode_token(&claims, &AppConfig::default().jwt_secret).unwrap()
}

pub fn user_token() -> String {
    token_for(USER_ID, Role::User, Duration::hours(1))
}

pub fn admin_token() -> String {
    token_for(ADMIN_ID, Role::Admin, Duration::hours(1))
}
