use std::sync::Arc;

use crate::auth::OAuthClient;
use crate::config::Config;
use crate::github::HostingProvider;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// GitHub REST surface. Default: `GitHubClient`; tests swap in a fake.
    pub hosting: Arc<dyn HostingProvider>,
    pub oauth: OAuthClient,
    pub config: Config,
}

#[cfg(test)]
impl AppState {
    /// State for router tests: zero delays and the given provider.
    pub fn for_testing(hosting: Arc<dyn HostingProvider>) -> Self {
        let config = Config::for_testing();
        let oauth = OAuthClient::new(
            config.github_client_id.clone(),
            config.github_client_secret.clone(),
        )
        .expect("oauth client");
        Self {
            hosting,
            oauth,
            config,
        }
    }
}
