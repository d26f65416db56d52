//! Hosting provider seam: every call the deployment pipeline makes against GitHub.
//!
//! The orchestrator only talks to `dyn HostingProvider`; `GitHubClient` is the
//! production implementation and tests substitute an in-memory fake.
//! Every method takes the caller's access token explicitly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::auth::AccessToken;

pub mod client;
#[cfg(test)]
pub mod fake;

pub use client::GitHubClient;

#[derive(Debug, Error)]
pub enum HostingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected GitHub response: {0}")]
    Decode(String),
}

impl HostingError {
    pub fn status(&self) -> Option<u16> {
        match self {
            HostingError::Api { status, .. } => Some(*status),
            HostingError::Http(e) => e.status().map(|s| s.as_u16()),
            HostingError::Decode(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// The message GitHub returned, when the failure came from the API itself.
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            HostingError::Api { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider data types
// ────────────────────────────────────────────────────────────────────────────

/// A repository created for one deployment. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryHandle {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    pub tree_sha: String,
}

/// What lives at a path in the repository contents API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEntry {
    File { sha: String },
    Directory,
}

/// One create-or-update request against the contents API.
#[derive(Debug, Clone)]
pub struct FileUpsert<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
    pub path: &'a str,
    pub content: &'a str,
    pub message: &'a str,
    pub branch: &'a str,
    /// Current blob sha; required by GitHub when the file already exists.
    pub sha: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowRun {
    pub status: String,
    pub conclusion: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of asking GitHub to turn on Pages for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagesOutcome {
    Enabled,
    /// GitHub answered 409: Pages was already on.
    AlreadyEnabled,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The hosting provider trait. Carried in `AppState` as `Arc<dyn HostingProvider>`.
#[async_trait]
pub trait HostingProvider: Send + Sync {
    /// Login of the account the token belongs to.
    async fn authenticated_user(&self, token: &AccessToken) -> Result<String, HostingError>;

    /// Creates a repository for the token's user with `auto_init` so a default
    /// branch and initial commit exist.
    async fn create_repository(
        &self,
        token: &AccessToken,
        name: &str,
        private: bool,
    ) -> Result<RepositoryHandle, HostingError>;

    /// Resolves `heads/{branch}` to a commit sha.
    async fn get_branch_head(
        &self,
        token: &AccessToken,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<String, HostingError>;

    async fn get_commit(
        &self,
        token: &AccessToken,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<CommitInfo, HostingError>;

    async fn get_content(
        &self,
        token: &AccessToken,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<ContentEntry, HostingError>;

    async fn put_file(&self, token: &AccessToken, upsert: &FileUpsert<'_>)
        -> Result<(), HostingError>;

    /// Enables Pages with `build_type: workflow`.
    async fn create_pages_site(
        &self,
        token: &AccessToken,
        owner: &str,
        repo: &str,
    ) -> Result<(), HostingError>;

    /// Most recent Actions run for the repository, if any has been triggered.
    async fn latest_workflow_run(
        &self,
        token: &AccessToken,
        owner: &str,
        repo: &str,
    ) -> Result<Option<WorkflowRun>, HostingError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Composite operations
// ────────────────────────────────────────────────────────────────────────────

/// Create-or-update a file. Probes for the current blob sha first; a 404 on the
/// probe means the file does not exist yet.
pub async fn upsert_file(
    provider: &dyn HostingProvider,
    token: &AccessToken,
    repo: &RepositoryHandle,
    path: &str,
    content: &str,
    message: &str,
) -> Result<(), HostingError> {
    let existing_sha = match provider
        .get_content(token, &repo.owner, &repo.name, path, &repo.default_branch)
        .await
    {
        Ok(ContentEntry::File { sha }) => Some(sha),
        Ok(ContentEntry::Directory) => None,
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e),
    };

    debug!(
        "Upserting {}/{}:{} (existing: {})",
        repo.owner,
        repo.name,
        path,
        existing_sha.is_some()
    );

    provider
        .put_file(
            token,
            &FileUpsert {
                owner: &repo.owner,
                repo: &repo.name,
                path,
                content,
                message,
                branch: &repo.default_branch,
                sha: existing_sha.as_deref(),
            },
        )
        .await
}

/// Enables Pages, treating a 409 as "already enabled".
pub async fn enable_static_site(
    provider: &dyn HostingProvider,
    token: &AccessToken,
    owner: &str,
    repo: &str,
) -> Result<PagesOutcome, HostingError> {
    match provider.create_pages_site(token, owner, repo).await {
        Ok(()) => Ok(PagesOutcome::Enabled),
        Err(e) if e.is_conflict() => Ok(PagesOutcome::AlreadyEnabled),
        Err(e) => Err(e),
    }
}

/// Deterministic Pages URL for a repository.
pub fn pages_url(owner: &str, repo: &str) -> String {
    format!("https://{owner}.github.io/{repo}/")
}
