use serde::{Deserialize, Serialize};

use crate::auth::AccessToken;
use crate::github::{HostingError, HostingProvider, WorkflowRun};

/// Coarse lifecycle of the latest Actions run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    NotFound,
    Queued,
    InProgress,
    Completed,
}

impl RunStatus {
    /// GitHub's pre-start states (`waiting`, `requested`, `pending`, ...) all
    /// report as `Queued`.
    pub fn from_github(status: &str) -> Self {
        match status {
            "completed" => RunStatus::Completed,
            "in_progress" => RunStatus::InProgress,
            _ => RunStatus::Queued,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStatus {
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

impl BuildStatus {
    pub fn not_found() -> Self {
        Self {
            status: RunStatus::NotFound,
            conclusion: None,
            html_url: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn succeeded(&self) -> bool {
        self.is_completed() && self.conclusion.as_deref() == Some("success")
    }
}

impl From<WorkflowRun> for BuildStatus {
    fn from(run: WorkflowRun) -> Self {
        Self {
            status: RunStatus::from_github(&run.status),
            conclusion: run.conclusion,
            html_url: Some(run.html_url),
        }
    }
}

/// Status of the most recent workflow run; `not_found` until one has triggered.
pub async fn build_status(
    provider: &dyn HostingProvider,
    token: &AccessToken,
    owner: &str,
    repo: &str,
) -> Result<BuildStatus, HostingError> {
    Ok(provider
        .latest_workflow_run(token, owner, repo)
        .await?
        .map(BuildStatus::from)
        .unwrap_or_else(BuildStatus::not_found))
}
