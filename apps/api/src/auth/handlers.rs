//! Axum route handlers for the GitHub OAuth flow.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::session::{
    clear_oauth_state_cookie, oauth_state_cookie, token_cookie, OAUTH_STATE_COOKIE,
};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ExchangeRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExchangeResponse {
    pub username: String,
}

/// GET /api/auth/github/url
///
/// Returns the authorize URL for the popup and pins a fresh `state` in a cookie.
pub async fn handle_github_auth_url(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<AuthUrlResponse>) {
    let oauth_state = Uuid::new_v4().simple().to_string();
    let redirect_uri = format!("{}/github-callback.html", state.config.frontend_origin);
    let url = state.oauth.authorize_url(&redirect_uri, &oauth_state);

    let jar = jar.add(oauth_state_cookie(&oauth_state, state.config.cookie_secure));
    (jar, Json(AuthUrlResponse { url }))
}

/// POST /api/auth/github/exchange
///
/// Trades the callback `code` for an access token, stores it in the
/// HTTP-only session cookie and returns the GitHub login.
pub async fn handle_github_exchange(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<ExchangeRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<ExchangeResponse>), AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    if request.code.trim().is_empty() {
        return Err(AppError::Validation("Missing code".to_string()));
    }

    if let Some(expected) = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string()) {
        if request.state.as_deref() != Some(expected.as_str()) {
            return Err(AppError::Validation("OAuth state mismatch".to_string()));
        }
    }

    let token = state
        .oauth
        .exchange_code(request.code.trim())
        .await
        .map_err(|e| {
            error!("GitHub code exchange failed: {e}");
            AppError::Provider("GitHub exchange failed".to_string())
        })?;

    let username = state.hosting.authenticated_user(&token).await.map_err(|e| {
        error!("GitHub user lookup failed: {e}");
        AppError::Provider("GitHub exchange failed".to_string())
    })?;

    info!("GitHub connected for {username}");

    let jar = jar
        .remove(clear_oauth_state_cookie())
        .add(token_cookie(&token, state.config.cookie_secure));
    Ok((jar, Json(ExchangeResponse { username })))
}
