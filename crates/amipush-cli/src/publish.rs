//! Publish pipeline
//!
//! Upload → import snapshot → register image, strictly in that order, under
//! one deadline. Each stage starts only after the previous one succeeded and
//! the first error ends the run.

use std::sync::Arc;

use amipush_compute::{ConversionPoller, ImageRegistrar, ImageService};
use amipush_core::{
    constants::IMPORT_DISK_FORMAT, Deadline, ImportRequest, ObjectLocation, PublishConfig,
    PublishError, PublishResult, UploadTarget,
};
use amipush_storage::{ObjectStorage, UploadExecutor};
use serde::Serialize;

/// Identifiers produced by a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub image_id: String,
    pub snapshot_id: String,
    pub bucket: String,
    pub key: String,
}

pub struct Publisher {
    storage: Arc<dyn ObjectStorage>,
    images: Arc<dyn ImageService>,
}

impl Publisher {
    pub fn new(storage: Arc<dyn ObjectStorage>, images: Arc<dyn ImageService>) -> Self {
        Self { storage, images }
    }

    /// Run the whole workflow for `config`.
    ///
    /// With `config.import_task_id` set the upload and submission are
    /// skipped and the run resumes waiting on that task.
    pub async fn publish(
        &self,
        config: &PublishConfig,
        deadline: Deadline,
    ) -> PublishResult<PublishOutcome> {
        config.validate()?;

        let name = config.image_name();
        let location = ObjectLocation {
            bucket: config.bucket.clone(),
            key: config.object_key(),
        };

        let poller = ConversionPoller::new(self.images.clone(), deadline.clone())
            .with_poll_interval(config.poll_interval);

        let task_id = match config.resume_task_id() {
            Some(task_id) => {
                tracing::info!(task_id, name = %name, "Resuming import task");
                task_id.to_string()
            }
            None => {
                let target = upload_target(config, location.clone()).await?;
                let plan = config.upload.plan_for(target.total_size)?;

                tracing::info!(
                    source = %target.source_path.display(),
                    destination = %location,
                    size_bytes = target.total_size,
                    strategy = %plan.strategy,
                    "Uploading image"
                );

                UploadExecutor::new(self.storage.clone(), deadline.clone())
                    .with_concurrency(config.upload.concurrency)
                    .upload(&target, &plan)
                    .await?;

                poller
                    .submit(&ImportRequest {
                        description: config.import_description(),
                        disk_description: config.disk_description(),
                        source: location.clone(),
                        format: IMPORT_DISK_FORMAT.to_string(),
                    })
                    .await?
            }
        };

        let snapshot_id = poller.wait_for_snapshot(&task_id).await?;

        let image_id = ImageRegistrar::new(self.images.clone(), deadline)
            .register(
                &name,
                config.image_description(),
                &snapshot_id,
                &config.registration,
            )
            .await?;

        Ok(PublishOutcome {
            image_id,
            snapshot_id,
            bucket: location.bucket,
            key: location.key,
        })
    }
}

async fn upload_target(
    config: &PublishConfig,
    location: ObjectLocation,
) -> PublishResult<UploadTarget> {
    let metadata = tokio::fs::metadata(&config.source_path)
        .await
        .map_err(|e| PublishError::io("Error opening file", e))?;

    if !metadata.is_file() {
        return Err(PublishError::Config(format!(
            "{} is not a regular file",
            config.source_path.display()
        )));
    }

    Ok(UploadTarget {
        source_path: config.source_path.clone(),
        location,
        total_size: metadata.len(),
    })
}
