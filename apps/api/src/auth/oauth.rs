//! GitHub OAuth web flow: authorize URL construction and code exchange.

use std::time::Duration;

use reqwest::{header::ACCEPT, Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::session::AccessToken;

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const ACCESS_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
/// `workflow` is required to push files under `.github/workflows/`.
const OAUTH_SCOPES: &str = "repo,workflow";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub rejected the code: {0}")]
    Rejected(String),

    #[error("GitHub response contained no access token")]
    MissingToken,
}

#[derive(Debug, Serialize)]
struct ExchangeBody<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// GitHub answers 200 for both outcomes; exactly one of the fields is set.
#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Clone)]
pub struct OAuthClient {
    client: Client,
    client_id: String,
    client_secret: String,
}

impl OAuthClient {
    pub fn new(client_id: String, client_secret: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            client_id,
            client_secret,
        })
    }

    /// URL the browser popup is sent to.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("scope", OAUTH_SCOPES),
            ("redirect_uri", redirect_uri),
            ("state", state),
        ];
        match Url::parse_with_params(AUTHORIZE_URL, &params) {
            Ok(url) => url.to_string(),
            // AUTHORIZE_URL is a constant absolute URL
            Err(_) => AUTHORIZE_URL.to_string(),
        }
    }

    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, OAuthError> {
        let body = ExchangeBody {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            code,
        };

        let response: ExchangeResponse = self
            .client
            .post(ACCESS_TOKEN_URL)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        interpret_exchange(response)
    }
}

fn interpret_exchange(response: ExchangeResponse) -> Result<AccessToken, OAuthError> {
    if let Some(error) = response.error {
        let detail = response.error_description.unwrap_or(error);
        debug!("OAuth exchange rejected: {detail}");
        return Err(OAuthError::Rejected(detail));
    }

    response
        .access_token
        .filter(|t| !t.is_empty())
        .map(AccessToken::new)
        .ok_or(OAuthError::MissingToken)
}
