//! Upload executor
//!
//! Drives a planned upload against an [`ObjectStorage`] backend. Small
//! objects go up in one PUT. Large objects go through a multipart session
//! with all-or-nothing semantics: either every part is uploaded and the
//! session is completed, or the session is aborted and the first error is
//! returned.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use amipush_core::{
    constants::OBJECT_CONTENT_TYPE, Deadline, ObjectLocation, PartDescriptor, Phase, PublishError,
    PublishResult, UploadPlan, UploadStrategy, UploadTarget,
};
use futures::stream::{self, StreamExt};

use crate::source::SourceFile;
use crate::traits::{CompletedPart, ObjectStorage};

/// Time allowed for the best-effort abort, which may run after the deadline
const ABORT_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// State of one open multipart upload
#[derive(Debug)]
pub struct MultipartSession {
    upload_id: String,
    location: ObjectLocation,
    total_parts: usize,
    completed_parts: BTreeMap<i32, String>,
}

impl MultipartSession {
    fn new(upload_id: String, location: ObjectLocation, total_parts: usize) -> Self {
        Self {
            upload_id,
            location,
            total_parts,
            completed_parts: BTreeMap::new(),
        }
    }

    fn record(&mut self, part_number: i32, e_tag: String) {
        self.completed_parts.insert(part_number, e_tag);
    }

    pub fn is_complete(&self) -> bool {
        self.completed_parts.len() == self.total_parts
    }

    /// Acknowledged parts in ascending part number order
    pub fn completed_parts(&self) -> Vec<CompletedPart> {
        self.completed_parts
            .iter()
            .map(|(part_number, e_tag)| CompletedPart {
                part_number: *part_number,
                e_tag: e_tag.clone(),
            })
            .collect()
    }
}

pub struct UploadExecutor {
    storage: Arc<dyn ObjectStorage>,
    deadline: Deadline,
    concurrency: usize,
}

impl UploadExecutor {
    /// Executor that uploads parts one after another
    pub fn new(storage: Arc<dyn ObjectStorage>, deadline: Deadline) -> Self {
        Self {
            storage,
            deadline,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` part uploads in flight at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Upload `target` following `plan` and return the object key
    pub async fn upload(&self, target: &UploadTarget, plan: &UploadPlan) -> PublishResult<String> {
        match plan.strategy {
            UploadStrategy::Simple => {
                tracing::debug!(size_bytes = target.total_size, "Using regular upload");
                self.upload_simple(target).await?;
            }
            UploadStrategy::Multipart => {
                tracing::debug!(
                    size_bytes = target.total_size,
                    parts = plan.parts.len(),
                    "Using multipart upload"
                );
                self.upload_multipart(target, &plan.parts).await?;
            }
        }

        Ok(target.key().to_string())
    }

    async fn upload_simple(&self, target: &UploadTarget) -> PublishResult<()> {
        self.deadline
            .run(
                Phase::Upload,
                self.storage.put_object(
                    &target.location,
                    &target.source_path,
                    target.total_size,
                    OBJECT_CONTENT_TYPE,
                ),
            )
            .await?
            .map_err(|e| PublishError::Transport {
                operation: "PutObject",
                message: e.to_string(),
            })
    }

    async fn upload_multipart(
        &self,
        target: &UploadTarget,
        parts: &[PartDescriptor],
    ) -> PublishResult<()> {
        let source = SourceFile::open(&target.source_path)
            .await
            .map_err(|e| PublishError::io("Error opening file", e))?;

        let upload_id = self
            .deadline
            .run(
                Phase::Upload,
                self.storage.create_multipart_upload(&target.location),
            )
            .await?
            .map_err(|e| PublishError::Transport {
                operation: "CreateMultipartUpload",
                message: e.to_string(),
            })?;

        let mut session = MultipartSession::new(upload_id, target.location.clone(), parts.len());

        tracing::info!(
            parts = parts.len(),
            key = %target.key(),
            concurrency = self.concurrency,
            "Will attempt multipart upload"
        );

        if let Err(err) = self.upload_parts(&source, &mut session, parts).await {
            self.abort(&session).await;
            return Err(err);
        }

        let completed = session.completed_parts();
        let result = self
            .deadline
            .run(
                Phase::Upload,
                self.storage.complete_multipart_upload(
                    &session.location,
                    &session.upload_id,
                    &completed,
                ),
            )
            .await
            .and_then(|res| {
                res.map_err(|e| PublishError::Transport {
                    operation: "CompleteMultipartUpload",
                    message: e.to_string(),
                })
            });

        if let Err(err) = result {
            self.abort(&session).await;
            return Err(err);
        }

        tracing::info!(
            bucket = %target.bucket(),
            key = %target.key(),
            parts = completed.len(),
            "Successfully uploaded object"
        );
        Ok(())
    }

    /// Upload every part, stopping at the first failure.
    ///
    /// Parts are started in ascending order. With a concurrency above one
    /// they may finish in any order; the session keeps them sorted.
    async fn upload_parts(
        &self,
        source: &SourceFile,
        session: &mut MultipartSession,
        parts: &[PartDescriptor],
    ) -> PublishResult<()> {
        let location = session.location.clone();
        let upload_id = session.upload_id.clone();
        let total_parts = parts.len();

        let mut uploads = stream::iter(parts.iter().copied())
            .map(|part| self.upload_part(source, &location, &upload_id, part, total_parts))
            .buffer_unordered(self.concurrency);

        while let Some(result) = uploads.next().await {
            let (part_number, e_tag) = result?;
            session.record(part_number, e_tag);
        }

        debug_assert!(session.is_complete());
        Ok(())
    }

    async fn upload_part(
        &self,
        source: &SourceFile,
        location: &ObjectLocation,
        upload_id: &str,
        part: PartDescriptor,
        total_parts: usize,
    ) -> PublishResult<(i32, String)> {
        tracing::debug!(
            part_number = part.part_number,
            range = %format!("bytes {}-{}/{}", part.offset, part.end() - 1, source.size()),
            "Attempting to upload part"
        );

        let body = source.read_part(part).await.map_err(|e| {
            PublishError::io(
                format!("Error reading part {} of {}", part.part_number, total_parts),
                e,
            )
        })?;

        let e_tag = self
            .deadline
            .run(
                Phase::Upload,
                self.storage
                    .upload_part(location, upload_id, part.part_number, body),
            )
            .await
            .map_err(|e| match e {
                PublishError::DeadlineExceeded { .. } => PublishError::PartTimedOut {
                    part_number: part.part_number,
                    total_parts,
                },
                other => other,
            })?
            .map_err(|e| PublishError::PartUpload {
                part_number: part.part_number,
                total_parts,
                message: e.to_string(),
            })?;

        Ok((part.part_number, e_tag))
    }

    /// Best-effort abort; failures are logged and swallowed
    async fn abort(&self, session: &MultipartSession) {
        tracing::error!(
            upload_id = %session.upload_id,
            key = %session.location.key,
            "Attempting to abort upload"
        );

        let abort = self
            .storage
            .abort_multipart_upload(&session.location, &session.upload_id);

        match tokio::time::timeout(ABORT_GRACE_PERIOD, abort).await {
            Ok(Ok(())) => {
                tracing::info!(upload_id = %session.upload_id, "Aborted multipart upload");
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    upload_id = %session.upload_id,
                    "Failed to abort multipart upload"
                );
            }
            Err(_) => {
                tracing::warn!(
                    upload_id = %session.upload_id,
                    "Timed out aborting multipart upload"
                );
            }
        }
    }
}
