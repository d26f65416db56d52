// Deployment pipeline: repository creation, file upload, workflow
// provisioning, Pages enablement and build status.
// All GitHub calls go through `github::HostingProvider`.

use thiserror::Error;

use crate::github::HostingError;

pub mod files;
pub mod handlers;
pub mod naming;
pub mod orchestrator;
pub mod readiness;
pub mod scaffold;
pub mod status;
pub mod workflow;

/// Shown when a fatal step failed without a message from GitHub.
pub const GENERIC_FAILURE: &str = "Failed to publish files";

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Failed to create repository: {0}")]
    CreateRepository(#[source] HostingError),

    #[error("Repository Git database failed to initialize in time.")]
    RepositoryNotReady { attempts: u32 },

    #[error("Failed to upload {path}: {source}")]
    Upload {
        path: String,
        #[source]
        source: HostingError,
    },

    #[error("Failed to upload workflow {path}: {source}")]
    Workflow {
        path: String,
        #[source]
        source: HostingError,
    },
}

impl DeployError {
    /// Short, user-facing message: GitHub's own wording when there is one.
    pub fn user_message(&self) -> String {
        match self {
            DeployError::InvalidRequest(msg) => msg.clone(),
            DeployError::RepositoryNotReady { .. } => self.to_string(),
            DeployError::CreateRepository(source)
            | DeployError::Upload { source, .. }
            | DeployError::Workflow { source, .. } => source
                .provider_message()
                .unwrap_or(GENERIC_FAILURE)
                .to_string(),
        }
    }
}
