use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use portfolio_api::auth::OAuthClient;
use portfolio_api::config::Config;
use portfolio_api::github::GitHubClient;
use portfolio_api::routes::build_router;
use portfolio_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", "portfolio_api", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Portfolio API v{}", env!("CARGO_PKG_VERSION"));

    // GitHub REST client (repositories, contents, Pages, Actions)
    let hosting = Arc::new(GitHubClient::new(&config.github_api_url)?);
    info!("GitHub client initialized ({})", config.github_api_url);

    let oauth = OAuthClient::new(
        config.github_client_id.clone(),
        config.github_client_secret.clone(),
    )?;

    info!(
        "Deploy timings: branch {:?}, actions {:?}, pages {:?}, verify_branch={}",
        config.timings.branch_ready_delay,
        config.timings.actions_provision_delay,
        config.timings.pages_enable_delay,
        config.timings.verify_branch
    );

    let cors = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&config.frontend_origin)
                .context("FRONTEND_ORIGIN is not a valid header value")?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // Build app state
    let state = AppState {
        hosting,
        oauth,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
