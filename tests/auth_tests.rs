mod common;

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, Method, Request, StatusCode, header, request::Parts},
};
use chrono::Duration;
use common::{ADMIN_ID, MockRepository, USER_ID, test_state, token_for};
use magic_stream_movies::{
    ApiError, AppState, auth::AuthUser, models::Role, ranking::MockReviewRanker,
};
use std::sync::Arc;

// --- Helpers ---

fn app_state() -> AppState {
    test_state(Arc::new(MockRepository::default()), MockReviewRanker::new("Good"))
}

fn request_parts() -> Parts {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/movie/123")
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(token: &str) -> Parts {
    let mut parts = request_parts();
    parts.headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    parts
}

// --- Tests ---

#[tokio::test]
async fn valid_token_resolves_identity_and_role() {
    let token = token_for(ADMIN_ID, Role::Admin, Duration::hours(1));
    let mut parts = with_bearer(&token);

    let user = AuthUser::from_request_parts(&mut parts, &app_state()).await.unwrap();

    assert_eq!(user.id, ADMIN_ID);
    assert_eq!(user.role, Role::Admin);
    assert!(user.is_admin());
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let mut parts = request_parts();

    let err = AuthUser::from_request_parts(&mut parts, &app_state()).await.unwrap_err();

    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.to_string(), "No token provided");
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let token = token_for(USER_ID, Role::User, Duration::hours(-2));
    let mut parts = with_bearer(&token);

    let err = AuthUser::from_request_parts(&mut parts, &app_state()).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert_eq!(err.to_string(), "Token has expired");
}

#[tokio::test]
async fn token_checked_against_configured_secret() {
    let token = token_for(USER_ID, Role::User, Duration::hours(1));
    let mut state = app_state();
    state.config.jwt_secret = "rotated-secret".to_string();
    let mut parts = with_bearer(&token);

    let err = AuthUser::from_request_parts(&mut parts, &state).await.unwrap_err();

    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn identity_stored_by_the_gate_is_reused() {
    // No token at all: the extractor must take the identity from the extensions.
    let mut parts = request_parts();
    let stored = AuthUser {
        id: USER_ID,
        email: "user@example.com".to_string(),
        role: Role::User,
    };
    parts.extensions.insert(stored.clone());

    let user = AuthUser::from_request_parts(&mut parts, &app_state()).await.unwrap();

    assert_eq!(user, stored);
}
