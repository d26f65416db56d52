//! Client for the deployment endpoints, as the browser-side controller uses
//! them. `DeployApi` is the seam; `HttpDeployApi` speaks HTTP with the
//! session cookie attached.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::session::TOKEN_COOKIE;
use crate::auth::AccessToken;
use crate::deploy::files::FileEntry;
use crate::deploy::status::BuildStatus;

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx answer; `message` is the server's `{"error": ...}` text.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid API path '{0}'")]
    InvalidPath(String),

    #[error("Nothing has been deployed yet.")]
    NothingDeployed,

    #[error("Invalid repoName or files.")]
    InvalidRepoName,
}

impl ApiClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiClientError::Api { status, .. } => Some(*status),
            ApiClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ApiClientError::InvalidPath(_)
            | ApiClientError::NothingDeployed
            | ApiClientError::InvalidRepoName => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepoPayload {
    pub repo_name: String,
    pub files: Vec<FileEntry>,
    pub private: bool,
    pub deploy_gh_pages: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepoReply {
    pub repo_url: String,
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub gh_pages_url: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnablePagesReply {
    gh_pages_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[async_trait]
pub trait DeployApi: Send + Sync {
    async fn create_repo(
        &self,
        payload: &CreateRepoPayload,
    ) -> Result<CreateRepoReply, ApiClientError>;

    async fn build_status(&self, owner: &str, repo: &str) -> Result<BuildStatus, ApiClientError>;

    /// Returns the Pages URL.
    async fn enable_pages(&self, owner: &str, repo: &str) -> Result<String, ApiClientError>;
}

pub struct HttpDeployApi {
    client: Client,
    base: Url,
    session: Option<AccessToken>,
}

impl HttpDeployApi {
    /// `base` is the API origin, e.g. `http://localhost:4000/`.
    pub fn new(base: &str, session: Option<AccessToken>) -> anyhow::Result<Self> {
        let base = Url::parse(base).with_context(|| format!("Invalid API base URL '{base}'"))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            base,
            session,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ApiClientError> {
        self.base
            .join(path)
            .map_err(|_| ApiClientError::InvalidPath(path.to_string()))
    }

    fn with_session(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session {
            Some(token) => request.header(
                header::COOKIE,
                format!("{TOKEN_COOKIE}={}", token.expose()),
            ),
            None => request,
        }
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiClientError> {
        let response = self.with_session(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiClientError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

/// The server's `{"error": ...}` text, else the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

#[async_trait]
impl DeployApi for HttpDeployApi {
    async fn create_repo(
        &self,
        payload: &CreateRepoPayload,
    ) -> Result<CreateRepoReply, ApiClientError> {
        let url = self.url("api/deploy/create-repo")?;
        self.send(self.client.post(url).json(payload)).await
    }

    async fn build_status(&self, owner: &str, repo: &str) -> Result<BuildStatus, ApiClientError> {
        let url = self.url("api/deploy/build-status")?;
        self.send(
            self.client
                .get(url)
                .query(&[("owner", owner), ("repo", repo)]),
        )
        .await
    }

    async fn enable_pages(&self, owner: &str, repo: &str) -> Result<String, ApiClientError> {
        let url = self.url("api/deploy/enable-pages")?;
        let reply: EnablePagesReply = self
            .send(
                self.client
                    .post(url)
                    .json(&serde_json::json!({ "owner": owner, "repo": repo })),
            )
            .await?;
        Ok(reply.gh_pages_url)
    }
}
