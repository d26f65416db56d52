//! reqwest-backed `HostingProvider` against the GitHub REST API.

use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    CommitInfo, ContentEntry, FileUpsert, HostingError, HostingProvider, RepositoryHandle,
    WorkflowRun,
};
use crate::auth::AccessToken;

const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateRepoBody<'a> {
    name: &'a str,
    private: bool,
    auto_init: bool,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    owner: OwnerResponse,
    default_branch: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    tree: GitObject,
}

#[derive(Debug, Deserialize)]
struct FileContentResponse {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutFileBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CreatePagesBody<'a> {
    build_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct WorkflowRunsResponse {
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
    #[serde(default)]
    errors: Vec<Value>,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: Url,
}

impl GitHubClient {
    pub fn new(api_base: &str) -> anyhow::Result<Self> {
        let api_base = Url::parse(api_base)
            .with_context(|| format!("Invalid GitHub API URL '{api_base}'"))?;
        if api_base.cannot_be_a_base() {
            bail!("GitHub API URL '{api_base}' cannot be used as a base URL");
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build GitHub HTTP client")?;

        Ok(Self { client, api_base })
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn repo_endpoint<'a>(
        &self,
        owner: &'a str,
        repo: &'a str,
        rest: impl IntoIterator<Item = &'a str>,
    ) -> Url {
        self.endpoint(
            ["repos", owner, repo]
                .into_iter()
                .chain(rest.into_iter().filter(|segment| !segment.is_empty())),
        )
    }

    /// Sends an authenticated request and decodes a JSON success body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &AccessToken,
    ) -> Result<T, HostingError> {
        let response = self.send(request, token).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        token: &AccessToken,
    ) -> Result<reqwest::Response, HostingError> {
        let response = request.bearer_auth(token.expose()).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body);
        debug!("GitHub API returned {}: {}", status, message);

        Err(HostingError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pulls GitHub's `message` (plus the first detailed validation error, if any)
/// out of an error body, falling back to the raw text.
fn extract_error_message(body: &str) -> String {
    match serde_json::from_str::<GitHubErrorBody>(body) {
        Ok(parsed) => {
            let detail = parsed
                .errors
                .iter()
                .find_map(|e| e.get("message").and_then(|m| m.as_str()));
            match detail {
                Some(detail) => format!("{}: {}", parsed.message, detail),
                None => parsed.message,
            }
        }
        Err(_) if body.trim().is_empty() => "Empty response from GitHub".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl HostingProvider for GitHubClient {
    async fn authenticated_user(&self, token: &AccessToken) -> Result<String, HostingError> {
        let user: UserResponse = self
            .send_json(self.client.get(self.endpoint(["user"])), token)
            .await?;
        Ok(user.login)
    }

    async fn create_repository(
        &self,
        token: &AccessToken,
        name: &str,
        private: bool,
    ) -> Result<RepositoryHandle, HostingError> {
        let body = CreateRepoBody {
            name,
            private,
            auto_init: true,
        };
        let repo: RepoResponse = self
            .send_json(
                self.client.post(self.endpoint(["user", "repos"])).json(&body),
                token,
            )
            .await?;

        Ok(RepositoryHandle {
            owner: repo.owner.login,
            name: repo.name,
            default_branch: repo.default_branch,
            html_url: repo.html_url,
        })
    }

    async fn get_branch_head(
        &self,
        token: &AccessToken,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<String, HostingError> {
        let git_ref: RefResponse = self
            .send_json(
                self.client
                    .get(self.repo_endpoint(owner, repo, ["git", "ref", "heads", branch])),
                token,
            )
            .await?;
        Ok(git_ref.object.sha)
    }

    async fn get_commit(
        &self,
        token: &AccessToken,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<CommitInfo, HostingError> {
        let commit: CommitResponse = self
            .send_json(
                self.client
                    .get(self.repo_endpoint(owner, repo, ["git", "commits", sha])),
                token,
            )
            .await?;
        Ok(CommitInfo {
            sha: commit.sha,
            tree_sha: commit.tree.sha,
        })
    }

    async fn get_content(
        &self,
        token: &AccessToken,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<ContentEntry, HostingError> {
        let url = self.repo_endpoint(owner, repo, std::iter::once("contents").chain(path.split('/')));
        let body: Value = self
            .send_json(self.client.get(url).query(&[("ref", git_ref)]), token)
            .await?;

        // A directory comes back as an array of entries.
        if body.is_array() {
            return Ok(ContentEntry::Directory);
        }

        let file: FileContentResponse =
            serde_json::from_value(body).map_err(|e| HostingError::Decode(e.to_string()))?;
        Ok(ContentEntry::File { sha: file.sha })
    }

    async fn put_file(
        &self,
        token: &AccessToken,
        upsert: &FileUpsert<'_>,
    ) -> Result<(), HostingError> {
        let url = self.repo_endpoint(
            upsert.owner,
            upsert.repo,
            std::iter::once("contents").chain(upsert.path.split('/')),
        );
        let body = PutFileBody {
            message: upsert.message,
            content: STANDARD.encode(upsert.content),
            branch: upsert.branch,
            sha: upsert.sha,
        };
        self.send(self.client.put(url).json(&body), token).await?;
        Ok(())
    }

    async fn create_pages_site(
        &self,
        token: &AccessToken,
        owner: &str,
        repo: &str,
    ) -> Result<(), HostingError> {
        let body = CreatePagesBody {
            build_type: "workflow",
        };
        self.send(
            self.client
                .post(self.repo_endpoint(owner, repo, ["pages"]))
                .json(&body),
            token,
        )
        .await?;
        Ok(())
    }

    async fn latest_workflow_run(
        &self,
        token: &AccessToken,
        owner: &str,
        repo: &str,
    ) -> Result<Option<WorkflowRun>, HostingError> {
        let runs: WorkflowRunsResponse = self
            .send_json(
                self.client
                    .get(self.repo_endpoint(owner, repo, ["actions", "runs"]))
                    .query(&[("per_page", "1")]),
                token,
            )
            .await?;

        if runs.workflow_runs.len() > 1 {
            warn!(
                "Expected at most one workflow run for {owner}/{repo}, got {}",
                runs.workflow_runs.len()
            );
        }
        Ok(runs.workflow_runs.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = GitHubClient::new("https://api.github.com").unwrap();
        let url = client.repo_endpoint("ada", "my site", ["contents", "src", "App.tsx"]);
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/ada/my%20site/contents/src/App.tsx"
        );
    }

    #[test]
    fn test_repo_endpoint_skips_empty_path_segments() {
        let client = GitHubClient::new("https://api.github.com").unwrap();
        let url = client.repo_endpoint(
            "ada",
            "site",
            std::iter::once("contents").chain("src//App.tsx/".split('/')),
        );
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/ada/site/contents/src/App.tsx"
        );
    }

    #[test]
    fn test_endpoint_respects_base_path() {
        let client = GitHubClient::new("https://ghe.example.com/api/v3/").unwrap();
        assert_eq!(
            client.endpoint(["user", "repos"]).as_str(),
            "https://ghe.example.com/api/v3/user/repos"
        );
    }

    #[test]
    fn test_new_rejects_non_base_url() {
        assert!(GitHubClient::new("mailto:ops@example.com").is_err());
    }

    #[test]
    fn test_extract_error_message_with_validation_detail() {
        let body = r#"{"message":"Repository creation failed.","errors":[{"resource":"Repository","code":"custom","field":"name","message":"name already exists on this account"}]}"#;
        assert_eq!(
            extract_error_message(body),
            "Repository creation failed.: name already exists on this account"
        );
    }

    #[test]
    fn test_extract_error_message_plain() {
        assert_eq!(
            extract_error_message(r#"{"message":"Bad credentials"}"#),
            "Bad credentials"
        );
        assert_eq!(extract_error_message("upstream down"), "upstream down");
        assert_eq!(extract_error_message(""), "Empty response from GitHub");
    }

    #[test]
    fn test_workflow_runs_decode() {
        let body = r#"{"total_count":1,"workflow_runs":[{"status":"in_progress","conclusion":null,"html_url":"https://github.com/ada/site/actions/runs/1","created_at":"2024-05-01T10:00:00Z"}]}"#;
        let runs: WorkflowRunsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(runs.workflow_runs[0].status, "in_progress");
        assert!(runs.workflow_runs[0].conclusion.is_none());
        assert!(runs.workflow_runs[0].created_at.is_some());
    }
}
