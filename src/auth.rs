use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::AppError,
    models::user::{Authority, User},
    state::AppState,
};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub authority: Authority,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    auth: String,
    iat: i64,
    exp: i64,
    jti: String,
}

pub fn issue_token(config: &AppConfig, user: &User) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        auth: user.authority().as_str().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(config.token_ttl_minutes)).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn verify_token(config: &AppConfig, token: &str) -> Result<AuthenticatedUser, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )?;

    let id = data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Unauthorized)?;
    let authority = Authority::parse(&data.claims.auth).ok_or(AppError::Unauthorized)?;
    Ok(AuthenticatedUser { id, authority })
}

/// Session cookie; expiry is enforced by the token's `exp` claim.
pub fn apply_token_cookie(jar: CookieJar, token: String) -> CookieJar {
    let cookie = Cookie::build((ACCESS_TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

pub fn clear_token_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/").build())
}

/// Cookie first, then `Authorization: Bearer`.
fn resolve_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Resolves the caller once per request. Requests without a valid token pass
/// through anonymously; handlers decide whether that is acceptable.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = resolve_token(req.headers()) {
        match verify_token(&state.config, &token) {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(err) => warn!(error = %err, "invalid access token"),
        }
    }
    next.run(req).await
}

#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}

impl CurrentUser {
    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }
}
