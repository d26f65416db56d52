//! Axum route handlers for the deployment endpoints. Every handler takes a
//! `GitHubSession` first, so a missing token is rejected with 401 before the
//! body is read or GitHub is called.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::auth::GitHubSession;
use crate::deploy::files::FileEntry;
use crate::deploy::orchestrator::{DeploymentRequest, DeploymentResult, Orchestrator};
use crate::deploy::status::{build_status, BuildStatus};
use crate::deploy::DeployError;
use crate::errors::AppError;
use crate::github::{enable_static_site, pages_url};
use crate::state::AppState;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepoRequest {
    #[serde(default)]
    pub repo_name: Option<String>,
    /// Kept loose: a bad entry is skipped rather than failing the request.
    #[serde(default)]
    pub files: Option<serde_json::Value>,
    #[serde(default)]
    pub private: bool,
    #[serde(default = "default_true")]
    pub deploy_gh_pages: bool,
}

/// One element of `files` as the browser sends it.
#[derive(Debug, Deserialize)]
struct FilePayload {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Entries without a usable path are dropped; missing content becomes empty.
/// `None` when `files` is not an array.
fn file_entries(files: serde_json::Value) -> Option<Vec<FileEntry>> {
    let serde_json::Value::Array(items) = files else {
        return None;
    };

    let entries = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<FilePayload>(item).ok())
        .filter_map(|file| {
            let path = file.path.filter(|p| !p.trim().is_empty())?;
            Some(FileEntry::new(path, file.content.unwrap_or_default()))
        })
        .collect();
    Some(entries)
}

#[derive(Debug, Serialize)]
pub struct CreateRepoResponse {
    #[serde(flatten)]
    pub result: DeploymentResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RepoQuery {
    pub owner: Option<String>,
    pub repo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnablePagesRequest {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnablePagesResponse {
    pub gh_pages_url: String,
}

/// Returns the value when present and non-blank.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn deploy_failure(err: DeployError) -> AppError {
    match err {
        DeployError::InvalidRequest(msg) => AppError::Validation(msg),
        other => {
            error!("Deployment failed: {other}");
            AppError::Provider(other.user_message())
        }
    }
}

/// POST /api/deploy/create-repo
///
/// Runs the whole pipeline in-request and answers once Pages has been
/// requested (or skipped).
pub async fn handle_create_repo(
    GitHubSession(token): GitHubSession,
    State(state): State<AppState>,
    payload: Result<Json<CreateRepoRequest>, JsonRejection>,
) -> Result<Json<CreateRepoResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let (Some(repo_name), Some(files)) = (
        non_blank(req.repo_name),
        req.files.and_then(file_entries),
    ) else {
        return Err(AppError::Validation(
            "Invalid repoName or files.".to_string(),
        ));
    };

    let request = DeploymentRequest {
        repo_name,
        files,
        private: req.private,
        deploy_gh_pages: req.deploy_gh_pages,
    };

    let outcome = Orchestrator::new(state.hosting.as_ref(), &token, &state.config.timings)
        .deploy(request)
        .await
        .map_err(deploy_failure)?;

    if outcome.is_degraded() {
        warn!(
            "Deployment of {}/{} finished with warnings: {:?}",
            outcome.result.owner, outcome.result.repo, outcome.warnings
        );
    } else {
        info!("Deployed {}", outcome.result.repo_url);
    }

    Ok(Json(CreateRepoResponse {
        result: outcome.result,
        warnings: outcome.warnings,
    }))
}

/// GET /api/deploy/build-status?owner=&repo=
pub async fn handle_build_status(
    GitHubSession(token): GitHubSession,
    State(state): State<AppState>,
    Query(query): Query<RepoQuery>,
) -> Result<Json<BuildStatus>, AppError> {
    let (Some(owner), Some(repo)) = (non_blank(query.owner), non_blank(query.repo)) else {
        return Err(AppError::Validation("Owner and repo required.".to_string()));
    };

    let status = build_status(state.hosting.as_ref(), &token, &owner, &repo)
        .await
        .map_err(|e| {
            error!("Build status lookup failed for {owner}/{repo}: {e}");
            AppError::Provider("Failed to fetch build status.".to_string())
        })?;

    Ok(Json(status))
}

/// POST /api/deploy/enable-pages
///
/// Retry path for Pages when the deployment could not enable it. Waits for
/// the workflow to register first; a 409 counts as success.
pub async fn handle_enable_pages(
    GitHubSession(token): GitHubSession,
    State(state): State<AppState>,
    payload: Result<Json<EnablePagesRequest>, JsonRejection>,
) -> Result<Json<EnablePagesResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let (Some(owner), Some(repo)) = (non_blank(req.owner), non_blank(req.repo)) else {
        return Err(AppError::Validation(
            "Owner and repo name are required.".to_string(),
        ));
    };

    tokio::time::sleep(state.config.timings.pages_enable_delay).await;

    let outcome = enable_static_site(state.hosting.as_ref(), &token, &owner, &repo)
        .await
        .map_err(|e| {
            error!("Pages enable error for {owner}/{repo}: {e}");
            AppError::with_provider_status(
                e.status(),
                e.provider_message().unwrap_or("Could not enable Pages"),
            )
        })?;
    info!("Pages for {owner}/{repo}: {outcome:?}");

    Ok(Json(EnablePagesResponse {
        gh_pages_url: pages_url(&owner, &repo),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::deploy::files::WORKFLOW_PATH;
    use crate::github::fake::{Call, FakeProvider};
    use crate::github::WorkflowRun;
    use crate::routes::build_router;
    use crate::state::AppState;

    fn app(fake: &Arc<FakeProvider>) -> Router {
        build_router(AppState::for_testing(fake.clone()))
    }

    fn post(uri: &str, body: Value, with_token: bool) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if with_token {
            builder = builder.header(header::COOKIE, "gh_token=secret");
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::COOKIE, "gh_token=secret")
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn deploy_body() -> Value {
        json!({
            "repoName": "ada-minimal-portfolio",
            "files": [
                { "path": "package.json", "content": "{}" },
                { "path": "src/App.tsx", "content": "app" }
            ],
            "private": false
        })
    }

    #[tokio::test]
    async fn test_create_repo_without_token_is_401_and_calls_nothing() {
        let fake = Arc::new(FakeProvider::new());
        let (status, body) = send(
            app(&fake),
            post("/api/deploy/create-repo", deploy_body(), false),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "GitHub token missing. Reconnect GitHub.");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_repo_missing_files_is_400() {
        let fake = Arc::new(FakeProvider::new());
        let (status, body) = send(
            app(&fake),
            post(
                "/api/deploy/create-repo",
                json!({ "repoName": "site" }),
                true,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid repoName or files.");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_repo_files_not_an_array_is_400() {
        let fake = Arc::new(FakeProvider::new());
        let (status, body) = send(
            app(&fake),
            post(
                "/api/deploy/create-repo",
                json!({ "repoName": "site", "files": "index.html" }),
                true,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid repoName or files.");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_repo_tolerates_partial_file_entries() {
        let fake = Arc::new(FakeProvider::new());
        let (status, _) = send(
            app(&fake),
            post(
                "/api/deploy/create-repo",
                json!({
                    "repoName": "site",
                    "files": [
                        { "path": "README.md" },
                        { "content": "orphan" },
                        { "path": "  ", "content": "blank" },
                        null,
                        { "path": "index.html", "content": "<html/>" },
                        { "path": "notes.txt", "content": null }
                    ]
                }),
                true,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let puts = fake.puts();
        let uploaded: Vec<_> = puts
            .iter()
            .map(|p| (p.path.as_str(), p.content.as_str()))
            .collect();
        assert_eq!(
            uploaded[..3],
            [("README.md", ""), ("index.html", "<html/>"), ("notes.txt", "")]
        );
        assert_eq!(puts.len(), 4);
        assert_eq!(puts[3].path, WORKFLOW_PATH);
        assert!(!puts.iter().any(|p| p.content == "orphan" || p.content == "blank"));
    }

    #[tokio::test]
    async fn test_create_repo_unusable_name_is_400() {
        let fake = Arc::new(FakeProvider::new());
        let (status, _) = send(
            app(&fake),
            post(
                "/api/deploy/create-repo",
                json!({ "repoName": "???", "files": [] }),
                true,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_repo_success_returns_urls() {
        let fake = Arc::new(FakeProvider::new());
        let (status, body) = send(
            app(&fake),
            post("/api/deploy/create-repo", deploy_body(), true),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "repoUrl": "https://github.com/ada/ada-minimal-portfolio",
                "owner": "ada",
                "repo": "ada-minimal-portfolio",
                "ghPagesUrl": "https://ada.github.io/ada-minimal-portfolio/"
            })
        );
        assert_eq!(fake.puts().last().unwrap().path, WORKFLOW_PATH);
    }

    #[tokio::test]
    async fn test_create_repo_without_pages_omits_pages_url() {
        let fake = Arc::new(FakeProvider::new());
        let mut body = deploy_body();
        body["deployGhPages"] = json!(false);

        let (status, body) = send(app(&fake), post("/api/deploy/create-repo", body, true)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.get("ghPagesUrl").is_none());
        assert!(!fake.calls().contains(&Call::CreatePagesSite));
    }

    #[tokio::test]
    async fn test_create_repo_pages_failure_reports_warning() {
        let fake = Arc::new(FakeProvider::new());
        fake.set_pages_failure(403, "Resource not accessible by integration");

        let (status, body) = send(
            app(&fake),
            post("/api/deploy/create-repo", deploy_body(), true),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_repo_upload_failure_surfaces_provider_message() {
        let fake = Arc::new(FakeProvider::new());
        fake.fail_put("src/App.tsx", 422, "path contains a malformed path component");

        let (status, body) = send(
            app(&fake),
            post("/api/deploy/create-repo", deploy_body(), true),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "path contains a malformed path component");
    }

    #[tokio::test]
    async fn test_build_status_without_token_is_401() {
        let fake = Arc::new(FakeProvider::new());
        let req = Request::builder()
            .uri("/api/deploy/build-status?owner=ada&repo=site")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app(&fake), req).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "GitHub token missing. Reconnect GitHub.");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_enable_pages_without_token_is_401() {
        let fake = Arc::new(FakeProvider::new());
        let (status, _) = send(
            app(&fake),
            post(
                "/api/deploy/enable-pages",
                json!({ "owner": "ada", "repo": "site" }),
                false,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_build_status_requires_owner_and_repo() {
        let fake = Arc::new(FakeProvider::new());
        let (status, body) = send(app(&fake), get("/api/deploy/build-status?owner=ada")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Owner and repo required.");
    }

    #[tokio::test]
    async fn test_build_status_not_found_then_completed() {
        let fake = Arc::new(FakeProvider::new());
        let uri = "/api/deploy/build-status?owner=ada&repo=site";

        let (status, body) = send(app(&fake), get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "not_found" }));

        fake.queue_runs(vec![Some(WorkflowRun {
            status: "completed".to_string(),
            conclusion: Some("success".to_string()),
            html_url: "https://github.com/ada/site/actions/runs/9".to_string(),
            created_at: None,
        })]);
        let (_, body) = send(app(&fake), get(uri)).await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["conclusion"], "success");
        assert_eq!(body["html_url"], "https://github.com/ada/site/actions/runs/9");
    }

    #[tokio::test]
    async fn test_enable_pages_twice_returns_same_url() {
        let fake = Arc::new(FakeProvider::new());
        let body = json!({ "owner": "ada", "repo": "site" });

        let (first_status, first) = send(
            app(&fake),
            post("/api/deploy/enable-pages", body.clone(), true),
        )
        .await;
        let (second_status, second) =
            send(app(&fake), post("/api/deploy/enable-pages", body, true)).await;

        assert_eq!(first_status, StatusCode::OK);
        assert_eq!(second_status, StatusCode::OK);
        assert_eq!(first, second);
        assert_eq!(first["ghPagesUrl"], "https://ada.github.io/site/");
    }

    #[tokio::test]
    async fn test_enable_pages_mirrors_provider_status() {
        let fake = Arc::new(FakeProvider::new());
        fake.set_pages_failure(403, "Resource not accessible by integration");

        let (status, body) = send(
            app(&fake),
            post(
                "/api/deploy/enable-pages",
                json!({ "owner": "ada", "repo": "site" }),
                true,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Resource not accessible by integration");
    }

    #[tokio::test]
    async fn test_enable_pages_missing_repo_is_400() {
        let fake = Arc::new(FakeProvider::new());
        let (status, body) = send(
            app(&fake),
            post("/api/deploy/enable-pages", json!({ "owner": "ada" }), true),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Owner and repo name are required.");
    }
}
