//! Compute service abstraction
//!
//! The three calls the workflow makes after the upload: submit an import,
//! observe it, and register the resulting image.

use amipush_core::{ImportRequest, ImportTask, RegistrationRequest};
use async_trait::async_trait;
use thiserror::Error;

/// Compute operation errors
#[derive(Debug, Error)]
pub enum ComputeError {
    /// The call did not succeed; carries the remote message verbatim
    #[error("{0}")]
    RequestFailed(String),

    /// The call succeeded but a required field was absent
    #[error("{0} missing from response")]
    MissingField(&'static str),
}

/// Result type for compute operations
pub type ComputeResult<T> = Result<T, ComputeError>;

#[async_trait]
pub trait ImageService: Send + Sync {
    /// Submit an import job and return its task id
    async fn import_snapshot(&self, request: &ImportRequest) -> ComputeResult<String>;

    /// Fetch the current state of an import task.
    ///
    /// `Ok(None)` means the query succeeded but no task matched the id.
    async fn describe_import_task(&self, task_id: &str) -> ComputeResult<Option<ImportTask>>;

    /// Register a machine image and return its id. Not idempotent.
    async fn register_image(&self, request: &RegistrationRequest) -> ComputeResult<String>;
}
