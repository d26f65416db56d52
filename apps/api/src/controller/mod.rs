//! Client-side deployment controller: the connect, configure and deploy
//! flow a browser dialog drives, expressed as a state machine over a
//! `DeployApi`.
//!
//! ```text
//! Idle ──begin_connect──▶ ConnectGitHub ──connected──▶ ConfigRepo ──deploy──▶ Deploying
//!                              │                                           │
//!                              └──connect_failed──▶ Error ◀──failure───────┤
//!                                                                          └──▶ Success
//! ```
//!
//! A successful deployment starts the build-status poller; its updates are
//! published on a `watch` channel.

pub mod api;
#[cfg(test)]
pub mod fake;
pub mod poller;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::deploy::naming::{format_repo_name, sanitize_repo_name};
use crate::deploy::scaffold;
use crate::deploy::status::{BuildStatus, RunStatus};
use crate::models::{ResumeData, Theme, ThemeColors};
use api::{ApiClientError, CreateRepoPayload, CreateRepoReply, DeployApi};
use poller::{PollerHandle, POLL_INTERVAL};

const CONNECT_FAILED: &str = "GitHub connection failed.";
const PUBLISH_FAILED: &str = "Failed to publish.";
const INVALID_REPO_NAME: &str = "Invalid repoName or files.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStep {
    Idle,
    ConnectGitHub,
    ConfigRepo,
    Deploying,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployState {
    pub step: DeployStep,
    pub github_username: Option<String>,
    pub repo_name: String,
    /// Repository URL of the last successful deployment.
    pub deployment_url: Option<String>,
    pub error: Option<String>,
}

impl Default for DeployState {
    fn default() -> Self {
        Self {
            step: DeployStep::Idle,
            github_username: None,
            repo_name: String::new(),
            deployment_url: None,
            error: None,
        }
    }
}

pub struct DeployController {
    api: Arc<dyn DeployApi>,
    resume: ResumeData,
    theme: Theme,
    colors: ThemeColors,
    private: bool,
    poll_interval: Duration,
    state: DeployState,
    last_deployment: Option<CreateRepoReply>,
    build_status: Arc<watch::Sender<Option<BuildStatus>>>,
    poller: Option<PollerHandle>,
}

impl DeployController {
    pub fn new(
        api: Arc<dyn DeployApi>,
        resume: ResumeData,
        theme: Theme,
        colors: ThemeColors,
    ) -> Self {
        let (build_status, _) = watch::channel(None);
        let mut controller = Self {
            api,
            resume,
            theme,
            colors,
            private: false,
            poll_interval: POLL_INTERVAL,
            state: DeployState::default(),
            last_deployment: None,
            build_status: Arc::new(build_status),
            poller: None,
        };
        controller.state.repo_name = controller.default_repo_name();
        controller
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn state(&self) -> &DeployState {
        &self.state
    }

    pub fn last_deployment(&self) -> Option<&CreateRepoReply> {
        self.last_deployment.as_ref()
    }

    /// Latest build status reported by the poller.
    pub fn subscribe_build_status(&self) -> watch::Receiver<Option<BuildStatus>> {
        self.build_status.subscribe()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    pub fn set_private(&mut self, private: bool) {
        self.private = private;
    }

    /// `{name}-{theme}-portfolio`, or empty when the resume has no name.
    pub fn default_repo_name(&self) -> String {
        let name = self.resume.personal_info.name.trim();
        if name.is_empty() {
            return String::new();
        }
        format_repo_name(name, self.theme)
    }

    pub fn begin_connect(&mut self) {
        self.state.step = DeployStep::ConnectGitHub;
        self.state.error = None;
    }

    pub fn connected(&mut self, username: impl Into<String>) {
        self.state.github_username = Some(username.into());
        self.state.step = DeployStep::ConfigRepo;
    }

    pub fn connect_failed(&mut self) {
        self.state.step = DeployStep::Error;
        self.state.error = Some(CONNECT_FAILED.to_string());
    }

    pub fn set_repo_name(&mut self, name: impl Into<String>) {
        self.state.repo_name = name.into();
    }

    /// Switches theme and starts over so the new selection can be published.
    /// Stops any running poller.
    pub fn reset_for_theme(&mut self, theme: Theme, colors: ThemeColors) {
        self.theme = theme;
        self.colors = colors;
        self.poller = None;
        self.last_deployment = None;
        self.build_status.send_replace(None);

        self.state.step = if self.state.github_username.is_some() {
            DeployStep::ConfigRepo
        } else {
            DeployStep::Idle
        };
        self.state.repo_name = self.default_repo_name();
        self.state.error = None;
        self.state.deployment_url = None;
    }

    /// Builds the file set, publishes it and starts polling the build.
    /// The repository name is sanitized first so the site's asset base
    /// matches the repository the server creates.
    pub async fn deploy(&mut self) -> Result<CreateRepoReply, ApiClientError> {
        self.poller = None;

        let repo_name = sanitize_repo_name(&self.state.repo_name);
        if repo_name.is_empty() {
            self.state.step = DeployStep::Error;
            self.state.error = Some(INVALID_REPO_NAME.to_string());
            return Err(ApiClientError::InvalidRepoName);
        }

        self.state.step = DeployStep::Deploying;
        self.state.error = None;
        self.state.repo_name = repo_name.clone();
        let files = scaffold::build(&self.resume, self.theme, &self.colors, &repo_name, true);
        let payload = CreateRepoPayload {
            repo_name,
            files,
            private: self.private,
            deploy_gh_pages: true,
        };

        let reply = match self.api.create_repo(&payload).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Deployment of {} failed: {e}", payload.repo_name);
                self.state.step = DeployStep::Error;
                self.state.error = Some(error_text(&e, PUBLISH_FAILED));
                return Err(e);
            }
        };

        for warning in &reply.warnings {
            warn!("{warning}");
        }
        info!("Published {}", reply.repo_url);

        self.state.step = DeployStep::Success;
        self.state.deployment_url = Some(reply.repo_url.clone());
        self.last_deployment = Some(reply.clone());

        self.build_status.send_replace(Some(queued()));
        let updates = Arc::clone(&self.build_status);
        self.poller = Some(PollerHandle::spawn(
            self.api.clone(),
            reply.owner.clone(),
            reply.repo.clone(),
            self.poll_interval,
            move |status| {
                updates.send_replace(Some(status.clone()));
            },
        ));

        Ok(reply)
    }

    /// Retries Pages enablement for the last deployment.
    pub async fn enable_pages(&mut self) -> Result<String, ApiClientError> {
        let Some(deployment) = self.last_deployment.as_mut() else {
            return Err(ApiClientError::NothingDeployed);
        };

        let url = self
            .api
            .enable_pages(&deployment.owner, &deployment.repo)
            .await?;
        deployment.gh_pages_url = Some(url.clone());
        Ok(url)
    }
}

fn queued() -> BuildStatus {
    BuildStatus {
        status: RunStatus::Queued,
        conclusion: None,
        html_url: None,
    }
}

fn error_text(err: &ApiClientError, fallback: &str) -> String {
    let text = err.to_string();
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}
