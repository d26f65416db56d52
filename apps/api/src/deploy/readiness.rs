//! Repository readiness verification.
//!
//! A freshly created repository answers 404 on its refs and commits for a
//! few seconds while GitHub replicates the Git database. `verify_ready` polls
//! at a fixed interval until both the branch ref and its commit are readable.

use std::time::Duration;

use tracing::{debug, info};

use crate::auth::AccessToken;
use crate::deploy::DeployError;
use crate::github::{HostingError, HostingProvider, RepositoryHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 7,
            interval: Duration::from_millis(3000),
        }
    }
}

/// Head of the default branch once it is readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSnapshot {
    pub commit_sha: String,
    pub tree_sha: String,
}

/// Resolves the branch ref, then the commit it points at. Sleeps `interval`
/// between failed attempts; fails with `RepositoryNotReady` once
/// `max_attempts` attempts have failed.
pub async fn verify_ready(
    provider: &dyn HostingProvider,
    token: &AccessToken,
    repo: &RepositoryHandle,
    policy: RetryPolicy,
) -> Result<RepoSnapshot, DeployError> {
    for attempt in 1..=policy.max_attempts {
        match probe(provider, token, repo).await {
            Ok(snapshot) => {
                info!(
                    "Repository {}/{} ready at {} (attempt {attempt})",
                    repo.owner, repo.name, snapshot.commit_sha
                );
                return Ok(snapshot);
            }
            Err(e) => {
                debug!("Readiness probe failed: {e}");
                info!(
                    "Git DB sync in progress for {}/{}... ({attempt}/{})",
                    repo.owner, repo.name, policy.max_attempts
                );
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(DeployError::RepositoryNotReady {
        attempts: policy.max_attempts,
    })
}

async fn probe(
    provider: &dyn HostingProvider,
    token: &AccessToken,
    repo: &RepositoryHandle,
) -> Result<RepoSnapshot, HostingError> {
    let commit_sha = provider
        .get_branch_head(token, &repo.owner, &repo.name, &repo.default_branch)
        .await?;
    let commit = provider
        .get_commit(token, &repo.owner, &repo.name, &commit_sha)
        .await?;
    Ok(RepoSnapshot {
        commit_sha,
        tree_sha: commit.tree_sha,
    })
}
