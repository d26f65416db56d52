//! In-memory `HostingProvider` for tests. Records every call in order and
//! lets a test script failures per operation.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    CommitInfo, ContentEntry, FileUpsert, HostingError, HostingProvider, RepositoryHandle,
    WorkflowRun,
};
use crate::auth::AccessToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AuthenticatedUser,
    CreateRepository { name: String, private: bool },
    GetBranchHead,
    GetCommit,
    GetContent { path: String },
    PutFile { path: String },
    CreatePagesSite,
    LatestWorkflowRun,
}

#[derive(Debug, Clone)]
pub struct RecordedPut {
    pub path: String,
    pub content: String,
    pub message: String,
    pub branch: String,
    pub sha: Option<String>,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    puts: Vec<RecordedPut>,
    /// path -> current blob sha
    files: HashMap<String, String>,
    default_branch: String,
    login: String,
    create_failure: Option<(u16, String)>,
    head_failures_remaining: u32,
    content_probe_failure: Option<(u16, String)>,
    put_failures: HashMap<String, (u16, String)>,
    pages_failure: Option<(u16, String)>,
    pages_enabled: bool,
    runs: VecDeque<Option<WorkflowRun>>,
}

pub struct FakeProvider {
    state: Mutex<FakeState>,
}

fn api_error(status: u16, message: &str) -> HostingError {
    HostingError::Api {
        status,
        message: message.to_string(),
    }
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                default_branch: "main".to_string(),
                login: "ada".to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn with_default_branch(self, branch: &str) -> Self {
        self.state.lock().unwrap().default_branch = branch.to_string();
        self
    }

    pub fn repository(&self, owner: &str, name: &str) -> RepositoryHandle {
        let state = self.state.lock().unwrap();
        RepositoryHandle {
            owner: owner.to_string(),
            name: name.to_string(),
            default_branch: state.default_branch.clone(),
            html_url: format!("https://github.com/{owner}/{name}"),
        }
    }

    pub fn seed_file(&self, path: &str, sha: &str) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(path.to_string(), sha.to_string());
    }

    pub fn fail_create(&self, status: u16, message: &str) {
        self.state.lock().unwrap().create_failure = Some((status, message.to_string()));
    }

    /// The next `times` branch lookups answer 404.
    pub fn fail_branch_head(&self, times: u32) {
        self.state.lock().unwrap().head_failures_remaining = times;
    }

    pub fn fail_content_probe(&self, status: u16, message: &str) {
        self.state.lock().unwrap().content_probe_failure = Some((status, message.to_string()));
    }

    pub fn fail_put(&self, path: &str, status: u16, message: &str) {
        self.state
            .lock()
            .unwrap()
            .put_failures
            .insert(path.to_string(), (status, message.to_string()));
    }

    pub fn set_pages_failure(&self, status: u16, message: &str) {
        self.state.lock().unwrap().pages_failure = Some((status, message.to_string()));
    }

    /// Responses for successive run lookups; the last one repeats.
    pub fn queue_runs(&self, runs: Vec<Option<WorkflowRun>>) {
        self.state.lock().unwrap().runs = runs.into();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn puts(&self) -> Vec<RecordedPut> {
        self.state.lock().unwrap().puts.clone()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl HostingProvider for FakeProvider {
    async fn authenticated_user(&self, _token: &AccessToken) -> Result<String, HostingError> {
        self.record(Call::AuthenticatedUser);
        Ok(self.state.lock().unwrap().login.clone())
    }

    async fn create_repository(
        &self,
        _token: &AccessToken,
        name: &str,
        private: bool,
    ) -> Result<RepositoryHandle, HostingError> {
        self.record(Call::CreateRepository {
            name: name.to_string(),
            private,
        });
        let (failure, login) = {
            let state = self.state.lock().unwrap();
            (state.create_failure.clone(), state.login.clone())
        };
        if let Some((status, message)) = failure {
            return Err(api_error(status, &message));
        }
        Ok(self.repository(&login, name))
    }

    async fn get_branch_head(
        &self,
        _token: &AccessToken,
        _owner: &str,
        _repo: &str,
        _branch: &str,
    ) -> Result<String, HostingError> {
        self.record(Call::GetBranchHead);
        let mut state = self.state.lock().unwrap();
        if state.head_failures_remaining > 0 {
            state.head_failures_remaining -= 1;
            return Err(api_error(404, "Not Found"));
        }
        Ok(format!("commit-{}", state.calls.len()))
    }

    async fn get_commit(
        &self,
        _token: &AccessToken,
        _owner: &str,
        _repo: &str,
        sha: &str,
    ) -> Result<CommitInfo, HostingError> {
        self.record(Call::GetCommit);
        Ok(CommitInfo {
            sha: sha.to_string(),
            tree_sha: format!("tree-of-{sha}"),
        })
    }

    async fn get_content(
        &self,
        _token: &AccessToken,
        _owner: &str,
        _repo: &str,
        path: &str,
        _git_ref: &str,
    ) -> Result<ContentEntry, HostingError> {
        self.record(Call::GetContent {
            path: path.to_string(),
        });
        let state = self.state.lock().unwrap();
        if let Some((status, message)) = &state.content_probe_failure {
            return Err(api_error(*status, message));
        }
        match state.files.get(path) {
            Some(sha) => Ok(ContentEntry::File { sha: sha.clone() }),
            None => Err(api_error(404, "Not Found")),
        }
    }

    async fn put_file(
        &self,
        _token: &AccessToken,
        upsert: &FileUpsert<'_>,
    ) -> Result<(), HostingError> {
        self.record(Call::PutFile {
            path: upsert.path.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        if let Some((status, message)) = state.put_failures.get(upsert.path) {
            return Err(api_error(*status, message));
        }
        if state.files.contains_key(upsert.path) && upsert.sha.is_none() {
            return Err(api_error(409, "sha wasn't supplied"));
        }
        state.puts.push(RecordedPut {
            path: upsert.path.to_string(),
            content: upsert.content.to_string(),
            message: upsert.message.to_string(),
            branch: upsert.branch.to_string(),
            sha: upsert.sha.map(str::to_string),
        });
        let next_sha = format!("blob-{}", state.puts.len());
        state.files.insert(upsert.path.to_string(), next_sha);
        Ok(())
    }

    async fn create_pages_site(
        &self,
        _token: &AccessToken,
        _owner: &str,
        _repo: &str,
    ) -> Result<(), HostingError> {
        self.record(Call::CreatePagesSite);
        let mut state = self.state.lock().unwrap();
        if let Some((status, message)) = &state.pages_failure {
            return Err(api_error(*status, message));
        }
        if state.pages_enabled {
            return Err(api_error(409, "GitHub Pages is already enabled."));
        }
        state.pages_enabled = true;
        Ok(())
    }

    async fn latest_workflow_run(
        &self,
        _token: &AccessToken,
        _owner: &str,
        _repo: &str,
    ) -> Result<Option<WorkflowRun>, HostingError> {
        self.record(Call::LatestWorkflowRun);
        let mut state = self.state.lock().unwrap();
        if state.runs.len() > 1 {
            return Ok(state.runs.pop_front().flatten());
        }
        Ok(state.runs.front().cloned().flatten())
    }
}
