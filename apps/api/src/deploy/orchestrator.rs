//! Deployment orchestrator: the fixed sequence that turns a file set into a
//! populated repository and, optionally, a live Pages site.
//!
//! # Pipeline
//! 1. Create the repository (`auto_init`, so a default branch exists).
//! 2. Wait for the default branch: fixed delay, or the readiness verifier.
//! 3. Upload every non-workflow file, one at a time, in input order.
//! 4. Wait for Actions to register the repository.
//! 5. Upload the workflow file(s); the reserved deploy workflow goes last.
//! 6. Enable Pages. Best effort: a failure becomes a warning on the outcome.
//! 7. Return the repository and Pages URLs.
//!
//! Each stage consumes the previous stage's output type, so stages cannot be
//! skipped or reordered. Nothing is rolled back on failure; a failed
//! deployment may leave a partially populated repository.

use serde::Serialize;
use tracing::{info, warn};

use crate::auth::AccessToken;
use crate::config::DeployTimings;
use crate::deploy::files::{FileEntry, FileSet, UploadPlan, WORKFLOW_PATH};
use crate::deploy::naming::sanitize_repo_name;
use crate::deploy::readiness::{verify_ready, RepoSnapshot};
use crate::deploy::workflow::render_workflow;
use crate::deploy::DeployError;
use crate::github::{
    enable_static_site, pages_url, upsert_file, HostingProvider, PagesOutcome, RepositoryHandle,
};

// ────────────────────────────────────────────────────────────────────────────
// Inputs and outputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub repo_name: String,
    pub files: Vec<FileEntry>,
    pub private: bool,
    /// Enable Pages once the workflow is in place.
    pub deploy_gh_pages: bool,
}

/// A validated request: sanitized name and deduplicated caller files.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    pub repo_name: String,
    pub private: bool,
    pub deploy_gh_pages: bool,
    files: FileSet,
}

impl DeploymentRequest {
    pub fn into_plan(self) -> Result<DeploymentPlan, DeployError> {
        let repo_name = sanitize_repo_name(&self.repo_name);
        if repo_name.is_empty() {
            return Err(DeployError::InvalidRequest(
                "Invalid repoName or files.".to_string(),
            ));
        }

        Ok(DeploymentPlan {
            repo_name,
            private: self.private,
            deploy_gh_pages: self.deploy_gh_pages,
            files: self.files.into_iter().collect(),
        })
    }
}

impl DeploymentPlan {
    /// Final upload set for a branch. The reserved workflow is written last,
    /// overwriting anything the caller sent at that path.
    pub fn upload_plan(&self, branch: &str) -> UploadPlan {
        let mut files = self.files.clone();
        files.insert(WORKFLOW_PATH, render_workflow(branch));
        files.into_upload_plan()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub repo_url: String,
    pub owner: String,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gh_pages_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticSiteStatus {
    Enabled,
    AlreadyEnabled,
    Skipped,
    /// Pages could not be enabled; the workflow may still turn it on.
    Failed(String),
}

/// Result of a deployment that got past every fatal step. `warnings` is
/// non-empty when a best-effort step failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub result: DeploymentResult,
    pub pages: StaticSiteStatus,
    pub warnings: Vec<String>,
}

impl DeployOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stage outputs
// ────────────────────────────────────────────────────────────────────────────

/// Repository whose default branch can take commits.
#[derive(Debug)]
pub struct ReadyRepository {
    repo: RepositoryHandle,
    head: Option<RepoSnapshot>,
}

/// Repository with every non-workflow file committed.
#[derive(Debug)]
pub struct PopulatedRepository {
    repo: RepositoryHandle,
    uploaded: usize,
}

/// Repository with its workflow committed.
#[derive(Debug)]
pub struct ProvisionedRepository {
    repo: RepositoryHandle,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

pub struct Orchestrator<'a> {
    provider: &'a dyn HostingProvider,
    token: &'a AccessToken,
    timings: &'a DeployTimings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        provider: &'a dyn HostingProvider,
        token: &'a AccessToken,
        timings: &'a DeployTimings,
    ) -> Self {
        Self {
            provider,
            token,
            timings,
        }
    }

    pub async fn deploy(&self, request: DeploymentRequest) -> Result<DeployOutcome, DeployError> {
        let plan = request.into_plan()?;

        let repo = self.create_repository(&plan).await?;
        let uploads = plan.upload_plan(&repo.default_branch);

        let ready = self.wait_branch_ready(repo).await?;
        let populated = self.upload_files(ready, &uploads.files).await?;
        let provisioned = self.provision_workflows(populated, &uploads.workflows).await?;
        let pages = self
            .enable_static_hosting(&provisioned, plan.deploy_gh_pages)
            .await;

        Ok(finish(provisioned, pages))
    }

    async fn create_repository(
        &self,
        plan: &DeploymentPlan,
    ) -> Result<RepositoryHandle, DeployError> {
        info!("Step 1: Creating repository {}...", plan.repo_name);
        let repo = self
            .provider
            .create_repository(self.token, &plan.repo_name, plan.private)
            .await
            .map_err(DeployError::CreateRepository)?;
        info!(
            "Created {}/{} (default branch {})",
            repo.owner, repo.name, repo.default_branch
        );
        Ok(repo)
    }

    async fn wait_branch_ready(
        &self,
        repo: RepositoryHandle,
    ) -> Result<ReadyRepository, DeployError> {
        if self.timings.verify_branch {
            let head =
                verify_ready(self.provider, self.token, &repo, self.timings.readiness).await?;
            return Ok(ReadyRepository {
                repo,
                head: Some(head),
            });
        }

        info!("Waiting for default branch to be ready...");
        tokio::time::sleep(self.timings.branch_ready_delay).await;
        Ok(ReadyRepository { repo, head: None })
    }

    async fn upload_files(
        &self,
        ready: ReadyRepository,
        files: &[FileEntry],
    ) -> Result<PopulatedRepository, DeployError> {
        let ReadyRepository { repo, head } = ready;
        if let Some(head) = &head {
            info!("Branch {} at {}", repo.default_branch, head.commit_sha);
        }
        info!("Step 2: Uploading {} files...", files.len());

        for file in files {
            upsert_file(
                self.provider,
                self.token,
                &repo,
                &file.path,
                &file.content,
                &format!("Add {}", file.path),
            )
            .await
            .map_err(|source| DeployError::Upload {
                path: file.path.clone(),
                source,
            })?;
        }

        Ok(PopulatedRepository {
            repo,
            uploaded: files.len(),
        })
    }

    async fn provision_workflows(
        &self,
        populated: PopulatedRepository,
        workflows: &[FileEntry],
    ) -> Result<ProvisionedRepository, DeployError> {
        let PopulatedRepository { repo, uploaded } = populated;
        info!("Uploaded {uploaded} files to {}/{}", repo.owner, repo.name);

        info!("Waiting for GitHub Actions provisioning...");
        tokio::time::sleep(self.timings.actions_provision_delay).await;

        for workflow in workflows {
            info!("Uploading workflow file {}...", workflow.path);
            let message = if workflow.path == WORKFLOW_PATH {
                "Add GitHub Pages workflow".to_string()
            } else {
                format!("Add {}", workflow.path)
            };
            upsert_file(
                self.provider,
                self.token,
                &repo,
                &workflow.path,
                &workflow.content,
                &message,
            )
            .await
            .map_err(|source| DeployError::Workflow {
                path: workflow.path.clone(),
                source,
            })?;
        }

        Ok(ProvisionedRepository { repo })
    }

    async fn enable_static_hosting(
        &self,
        provisioned: &ProvisionedRepository,
        requested: bool,
    ) -> StaticSiteStatus {
        if !requested {
            return StaticSiteStatus::Skipped;
        }

        let repo = &provisioned.repo;
        info!("Step 3: Enabling GitHub Pages...");
        match enable_static_site(self.provider, self.token, &repo.owner, &repo.name).await {
            Ok(PagesOutcome::Enabled) => StaticSiteStatus::Enabled,
            Ok(PagesOutcome::AlreadyEnabled) => StaticSiteStatus::AlreadyEnabled,
            Err(e) => {
                warn!("Pages enable error for {}/{}: {e}", repo.owner, repo.name);
                StaticSiteStatus::Failed(
                    e.provider_message()
                        .unwrap_or("Could not enable Pages")
                        .to_string(),
                )
            }
        }
    }
}

fn finish(provisioned: ProvisionedRepository, pages: StaticSiteStatus) -> DeployOutcome {
    let ProvisionedRepository { repo } = provisioned;

    let gh_pages_url = match pages {
        StaticSiteStatus::Skipped => None,
        _ => Some(pages_url(&repo.owner, &repo.name)),
    };
    let warnings = match &pages {
        StaticSiteStatus::Failed(reason) => vec![format!(
            "GitHub Pages could not be enabled automatically: {reason}"
        )],
        _ => Vec::new(),
    };

    DeployOutcome {
        result: DeploymentResult {
            repo_url: repo.html_url,
            owner: repo.owner,
            repo: repo.name,
            gh_pages_url,
        },
        pages,
        warnings,
    }
}
