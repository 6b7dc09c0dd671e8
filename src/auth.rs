use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AppConfig, error::ApiError, models::Role, models::User};

/// Cookie the web client stores the access token in.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Claims
///
/// Payload of an HS256 access token. Validated on every request that passes through
/// the protected route group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's UUID, used to look up their profile.
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    /// Issued At (iat), seconds since epoch.
    pub iat: usize,
    /// Expiration Time (exp), seconds since epoch. Always validated.
    pub exp: usize,
}

impl Claims {
    /// Builds claims for `user` valid for `ttl` from now.
    pub fn new(user: &User, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.user_id,
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp().max(0) as usize,
            exp: (now + ttl).timestamp().max(0) as usize,
        }
    }
}

/// Signs `claims` with the shared HS256 secret.
pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validates signature and expiry, returning the claims.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => ApiError::Unauthorized("Token has expired".to_string()),
            _ => {
                tracing::debug!("rejected access token: {:?}", e);
                ApiError::Unauthorized("Invalid token".to_string())
            }
        })
}

/// extract_token
///
/// Reads the access token from `Authorization: Bearer <token>` (scheme matched without
/// regard to case), falling back to the `access_token` cookie the browser client sends.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .filter_map(|pair| pair.trim().strip_prefix(ACCESS_TOKEN_COOKIE)?.strip_prefix('='))
            .find(|token| !token.is_empty())
    })
}

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// AuthUser Extractor
///
/// Behind the auth gate the identity is already in the request extensions and is
/// reused as-is. Otherwise the token is extracted and decoded here.
///
/// Rejection: `ApiError::Unauthorized` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let config = AppConfig::from_ref(state);

        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

        let claims = decode_token(token, &config.jwt_secret)?;
        Ok(AuthUser::from(claims))
    }
}

/// auth_middleware
///
/// The authentication gate for the protected route group. Extracting `AuthUser` rejects
/// unauthenticated requests with 401 before the handler runs; on success the identity is
/// stored in the request extensions for the handler.
pub async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    tracing::debug!(user_id = %auth_user.id, role = ?auth_user.role, "request authenticated");
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}
