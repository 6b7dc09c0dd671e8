use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Ranking names an admin review can be classified into, best first.
pub const RANKING_NAMES: [&str; 5] = ["Excellent", "Good", "Okay", "Bad", "Terrible"];

/// Placeholder ranking carried by movies that have not been reviewed yet.
pub const NOT_RANKED: &str = "Not_Ranked";
pub const NOT_RANKED_VALUE: i32 = 999;

// --- Core Catalog Schemas ---

/// Genre
///
/// A catalog genre. Movies carry a list of these and users keep a list of favourites,
/// which is what the recommendation query matches on (by name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Genre {
    pub genre_id: i32,
    pub genre_name: String,
}

/// Ranking
///
/// The classification attached to a movie from its admin review.
/// Lower `ranking_value` is better; recommendations sort ascending on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Ranking {
    pub ranking_value: i32,
    pub ranking_name: String,
}

impl Default for Ranking {
    fn default() -> Self {
        Self::not_ranked()
    }
}

impl Ranking {
    pub fn not_ranked() -> Self {
        Self {
            ranking_value: NOT_RANKED_VALUE,
            ranking_name: NOT_RANKED.to_string(),
        }
    }

    pub fn is_not_ranked(&self) -> bool {
        self.ranking_name == NOT_RANKED || self.ranking_value == NOT_RANKED_VALUE
    }

    /// canonical_value
    ///
    /// The value a ranking name must carry: Excellent=1 .. Terrible=5, `Not_Ranked`=999.
    /// `None` for names outside that table.
    pub fn canonical_value(name: &str) -> Option<i32> {
        if name == NOT_RANKED {
            return Some(NOT_RANKED_VALUE);
        }
        RANKING_NAMES
            .iter()
            .position(|known| *known == name)
            .map(|i| i as i32 + 1)
    }
}

/// Movie
///
/// A catalog entry keyed by its IMDb identifier. This is both the stored record and
/// the payload accepted by `POST /addmovie`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Movie {
    #[schema(example = "tt0111161")]
    pub imdb_id: String,
    pub title: String,
    pub poster_path: String,
    pub youtube_id: String,
    pub genre: Vec<Genre>,
    #[serde(default)]
    pub admin_review: String,
    #[serde(default)]
    pub ranking: Ranking,
}

impl Movie {
    /// validate
    ///
    /// Checks an incoming movie payload. On failure, returns a map of field path to
    /// a human-readable reason, e.g. `"genre[0].genre_name" => "must be 2..=100 characters"`.
    pub fn validate(&self) -> Result<(), BTreeMap<String, String>> {
        let mut errors = BTreeMap::new();

        if self.imdb_id.trim().is_empty() {
            errors.insert("imdb_id".to_string(), "is required".to_string());
        }
        if !char_len_within(&self.title, 2, 500) {
            errors.insert("title".to_string(), "must be 2..=500 characters".to_string());
        }
        if !is_http_url(&self.poster_path) {
            errors.insert("poster_path".to_string(), "must be an http(s) URL".to_string());
        }
        if self.youtube_id.trim().is_empty() {
            errors.insert("youtube_id".to_string(), "is required".to_string());
        }

        if self.genre.is_empty() {
            errors.insert("genre".to_string(), "at least one genre is required".to_string());
        }
        for (i, genre) in self.genre.iter().enumerate() {
            if genre.genre_id <= 0 {
                errors.insert(format!("genre[{i}].genre_id"), "must be positive".to_string());
            }
            if !char_len_within(&genre.genre_name, 2, 100) {
                errors.insert(
                    format!("genre[{i}].genre_name"),
                    "must be 2..=100 characters".to_string(),
                );
            }
        }

        let name = self.ranking.ranking_name.as_str();
        let value = self.ranking.ranking_value;
        let canonical = Ranking::canonical_value(name);
        if canonical.is_none() {
            errors.insert(
                "ranking.ranking_name".to_string(),
                format!("must be one of {}, {}", RANKING_NAMES.join(", "), NOT_RANKED),
            );
        }
        if value <= 0 {
            errors.insert("ranking.ranking_value".to_string(), "must be positive".to_string());
        } else if let Some(expected) = canonical.filter(|expected| *expected != value) {
            errors.insert(
                "ranking.ranking_value".to_string(),
                format!("must be {expected} for {name}"),
            );
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn char_len_within(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    (min..=max).contains(&len)
}

fn is_http_url(value: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        value
            .strip_prefix(scheme)
            .is_some_and(|rest| !rest.is_empty() && !rest.contains(char::is_whitespace))
    })
}

// --- Identity ---

/// Role
///
/// The RBAC claim carried in access tokens. Serialised upper-case ("ADMIN" / "USER").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// User
///
/// The profile data the recommendation endpoint needs: identity and favourite genres.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub favourite_genres: Vec<Genre>,
}

// --- Request / Response Payloads ---

/// AdminReviewUpdateRequest
///
/// Body of `PATCH /updatereview/{imdb_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminReviewUpdateRequest {
    pub admin_review: String,
}

/// AdminReviewUpdateResponse
///
/// The ranking the review was classified into, echoed with the stored review.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminReviewUpdateResponse {
    pub ranking_name: String,
    pub admin_review: String,
}
