//! Build-status poller. Asks for the latest workflow run on a fixed interval
//! until the run completes, a request fails, or the poller is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::api::DeployApi;
use crate::deploy::status::BuildStatus;

pub const POLL_INTERVAL: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed(BuildStatus),
    Cancelled,
    Failed(String),
}

/// Polls until a terminal condition. The first request goes out one
/// `interval` after the call. A response that arrives after cancellation is
/// dropped without reaching `on_update`.
pub async fn poll_build_status<F>(
    api: &dyn DeployApi,
    owner: &str,
    repo: &str,
    interval: Duration,
    cancel: &CancellationToken,
    mut on_update: F,
) -> PollOutcome
where
    F: FnMut(&BuildStatus),
{
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            result = api.build_status(owner, repo) => result,
        };

        match result {
            Ok(status) => {
                debug!("Build status for {owner}/{repo}: {status:?}");
                on_update(&status);
                if status.is_completed() {
                    return PollOutcome::Completed(status);
                }
            }
            Err(e) => {
                warn!("Build status polling for {owner}/{repo} stopped: {e}");
                return PollOutcome::Failed(e.to_string());
            }
        }
    }
}

/// A poller running on its own task. Dropping the handle cancels it.
pub struct PollerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollerHandle {
    /// Spawns a poller that hands every status to `on_update`.
    pub fn spawn<F>(
        api: Arc<dyn DeployApi>,
        owner: String,
        repo: String,
        interval: Duration,
        on_update: F,
    ) -> Self
    where
        F: FnMut(&BuildStatus) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            poll_build_status(api.as_ref(), &owner, &repo, interval, &token, on_update).await
        });
        Self {
            cancel,
            task: Some(task),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Waits for the poller to stop.
    pub async fn join(mut self) -> PollOutcome {
        match self.task.take() {
            Some(task) => task
                .await
                .unwrap_or_else(|e| PollOutcome::Failed(format!("poller task failed: {e}"))),
            None => PollOutcome::Cancelled,
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
