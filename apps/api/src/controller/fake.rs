//! Scripted `DeployApi` for controller and poller tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::api::{ApiClientError, CreateRepoPayload, CreateRepoReply, DeployApi};
use crate::deploy::status::{BuildStatus, RunStatus};

#[derive(Default)]
struct FakeState {
    statuses: VecDeque<Result<BuildStatus, (u16, String)>>,
    status_calls: u32,
    create_calls: Vec<CreateRepoPayload>,
    create_failure: Option<(u16, String)>,
    pages_calls: Vec<(String, String)>,
}

#[derive(Default)]
pub struct FakeDeployApi {
    state: Mutex<FakeState>,
    /// Simulated latency of each status request.
    status_latency: Duration,
}

pub fn status(status: RunStatus, conclusion: Option<&str>) -> BuildStatus {
    BuildStatus {
        status,
        conclusion: conclusion.map(str::to_string),
        html_url: None,
    }
}

impl FakeDeployApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status_latency(mut self, latency: Duration) -> Self {
        self.status_latency = latency;
        self
    }

    /// Responses for successive status requests; the last one repeats.
    pub fn queue_statuses(&self, statuses: Vec<Result<BuildStatus, (u16, String)>>) {
        self.state.lock().unwrap().statuses = statuses.into();
    }

    pub fn fail_create(&self, status: u16, message: &str) {
        self.state.lock().unwrap().create_failure = Some((status, message.to_string()));
    }

    pub fn status_calls(&self) -> u32 {
        self.state.lock().unwrap().status_calls
    }

    pub fn create_calls(&self) -> Vec<CreateRepoPayload> {
        self.state.lock().unwrap().create_calls.clone()
    }

    pub fn pages_calls(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().pages_calls.clone()
    }
}

#[async_trait]
impl DeployApi for FakeDeployApi {
    async fn create_repo(
        &self,
        payload: &CreateRepoPayload,
    ) -> Result<CreateRepoReply, ApiClientError> {
        let mut state = self.state.lock().unwrap();
        state.create_calls.push(payload.clone());
        if let Some((status, message)) = state.create_failure.clone() {
            return Err(ApiClientError::Api { status, message });
        }
        Ok(CreateRepoReply {
            repo_url: format!("https://github.com/ada/{}", payload.repo_name),
            owner: "ada".to_string(),
            repo: payload.repo_name.clone(),
            gh_pages_url: Some(format!("https://ada.github.io/{}/", payload.repo_name)),
            warnings: Vec::new(),
        })
    }

    async fn build_status(&self, _owner: &str, _repo: &str) -> Result<BuildStatus, ApiClientError> {
        let next = {
            let mut state = self.state.lock().unwrap();
            state.status_calls += 1;
            if state.statuses.len() > 1 {
                state.statuses.pop_front()
            } else {
                state.statuses.front().cloned()
            }
        };
        if !self.status_latency.is_zero() {
            tokio::time::sleep(self.status_latency).await;
        }
        match next {
            Some(Ok(status)) => Ok(status),
            Some(Err((status, message))) => Err(ApiClientError::Api { status, message }),
            None => Ok(BuildStatus::not_found()),
        }
    }

    async fn enable_pages(&self, owner: &str, repo: &str) -> Result<String, ApiClientError> {
        self.state
            .lock()
            .unwrap()
            .pages_calls
            .push((owner.to_string(), repo.to_string()));
        Ok(format!("https://{owner}.github.io/{repo}/"))
    }
}
