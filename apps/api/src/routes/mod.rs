pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::deploy::handlers as deploy;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api", get(health::api_root_handler))
        // Deployment API
        .route("/api/deploy/create-repo", post(deploy::handle_create_repo))
        .route("/api/deploy/build-status", get(deploy::handle_build_status))
        .route("/api/deploy/enable-pages", post(deploy::handle_enable_pages))
        // GitHub OAuth
        .route("/api/auth/github/url", get(auth::handle_github_auth_url))
        .route(
            "/api/auth/github/exchange",
            post(auth::handle_github_exchange),
        )
        .with_state(state)
}
