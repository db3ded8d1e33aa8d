//! Snapshot conversion poller
//!
//! Submits the import task for the uploaded object and then observes it on a
//! fixed interval. The poller never changes the task; it ends in one of
//! three ways: a snapshot id, a failure with its cause, or a timeout that
//! leaves the task id behind for a later resume.

use std::sync::Arc;
use std::time::Duration;

use amipush_core::{
    constants::IMPORT_POLL_INTERVAL, Deadline, ImportRequest, ImportStatus, Phase, PublishError,
    PublishResult,
};

use crate::traits::{ComputeError, ImageService};

pub struct ConversionPoller {
    service: Arc<dyn ImageService>,
    deadline: Deadline,
    poll_interval: Duration,
}

impl ConversionPoller {
    pub fn new(service: Arc<dyn ImageService>, deadline: Deadline) -> Self {
        Self {
            service,
            deadline,
            poll_interval: IMPORT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Submit the import and wait for its snapshot id
    pub async fn convert(&self, request: &ImportRequest) -> PublishResult<String> {
        let task_id = self.submit(request).await?;
        self.wait_for_snapshot(&task_id).await
    }

    /// Submit the import job and return the task id
    pub async fn submit(&self, request: &ImportRequest) -> PublishResult<String> {
        let task_id = self
            .deadline
            .run(Phase::Import, self.service.import_snapshot(request))
            .await?
            .map_err(|e| match e {
                ComputeError::MissingField(field) => PublishError::RemoteInconsistency(format!(
                    "{} missing from ImportSnapshot response",
                    field
                )),
                ComputeError::RequestFailed(message) => PublishError::Transport {
                    operation: "ImportSnapshot",
                    message,
                },
            })?;

        tracing::info!(
            task_id = %task_id,
            source = %request.source,
            "Import snapshot task submitted"
        );
        Ok(task_id)
    }

    /// Poll `task_id` until it completes, fails, or the deadline passes
    pub async fn wait_for_snapshot(&self, task_id: &str) -> PublishResult<String> {
        let mut progress = "0".to_string();

        loop {
            if self.deadline.is_elapsed() {
                return Err(timed_out(task_id, progress));
            }

            let described = match self
                .deadline
                .run(Phase::Import, self.service.describe_import_task(task_id))
                .await
            {
                Ok(described) => described,
                // Still running remotely, so resumable
                Err(PublishError::DeadlineExceeded { .. }) => {
                    return Err(timed_out(task_id, progress));
                }
                Err(err) => return Err(err),
            };

            let task = described
                .map_err(|e| PublishError::Transport {
                    operation: "DescribeImportSnapshotTasks",
                    message: format!("Error getting import snapshot status: {}", e),
                })?
                .ok_or_else(|| {
                    PublishError::RemoteInconsistency(format!(
                        "Unable to get import snapshot task status for {}",
                        task_id
                    ))
                })?;

            match task.status {
                ImportStatus::Completed => {
                    let snapshot_id = task.snapshot_id.ok_or_else(|| {
                        PublishError::RemoteInconsistency(format!(
                            "SnapshotID unavailable after import task {} completed",
                            task_id
                        ))
                    })?;
                    tracing::info!(task_id, snapshot_id = %snapshot_id, "Import snapshot completed");
                    return Ok(snapshot_id);
                }
                ImportStatus::Failed => {
                    return Err(PublishError::ImportFailed {
                        task_id: task_id.to_string(),
                        status: task.raw_status,
                        message: task
                            .status_message
                            .unwrap_or_else(|| "no status message".to_string()),
                    });
                }
                ImportStatus::Pending | ImportStatus::Active => {
                    progress = task.progress_or_zero().to_string();
                    let wait = self.poll_interval.min(self.deadline.remaining());
                    tracing::debug!(
                        task_id,
                        status = %task.raw_status,
                        progress = %progress,
                        wait_secs = wait.as_secs(),
                        "Import task still running"
                    );
                    self.deadline.sleep(Phase::Import, wait).await?;
                }
            }
        }
    }
}

fn timed_out(task_id: &str, progress: String) -> PublishError {
    tracing::error!(task_id, progress = %progress, "Gave up waiting for import task");
    PublishError::ImportTimedOut {
        task_id: task_id.to_string(),
        progress,
    }
}
