use std::fmt;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::errors::AppError;

pub const TOKEN_COOKIE: &str = "gh_token";
pub const OAUTH_STATE_COOKIE: &str = "gh_oauth_state";

const TOKEN_MAX_AGE_DAYS: i64 = 30;
const OAUTH_STATE_MAX_AGE_MINUTES: i64 = 10;

/// Bearer credential for GitHub. Debug output never shows the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Extractor for the caller's GitHub token. Rejects with 401 when the cookie
/// is absent, before any handler code or provider call runs.
#[derive(Debug, Clone)]
pub struct GitHubSession(pub AccessToken);

#[async_trait]
impl<S> FromRequestParts<S> for GitHubSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        jar.get(TOKEN_COOKIE)
            .map(|c| c.value().trim())
            .filter(|v| !v.is_empty())
            .map(|v| GitHubSession(AccessToken::new(v)))
            .ok_or_else(|| AppError::Unauthorized("GitHub token missing. Reconnect GitHub.".into()))
    }
}

pub fn token_cookie(token: &AccessToken, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token.expose().to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::days(TOKEN_MAX_AGE_DAYS))
        .build()
}

pub fn oauth_state_cookie(state: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, state.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::minutes(OAUTH_STATE_MAX_AGE_MINUTES))
        .build()
}

/// Removal cookie for the OAuth state; path must match the one it was set with.
pub fn clear_oauth_state_cookie() -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, "")).path("/").build()
}
