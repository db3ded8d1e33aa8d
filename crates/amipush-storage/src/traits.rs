//! Storage abstraction trait
//!
//! This module defines the calls the publish workflow makes against an
//! object storage service. The upload executor only talks to this trait, so
//! tests can swap the S3 client for an in-memory recorder.

use amipush_core::ObjectLocation;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Multipart session error: {0}")]
    SessionFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A part that the storage service acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub part_number: i32,
    pub e_tag: String,
}

/// Object storage abstraction
///
/// Every method is a single attempt; implementations must not retry.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload the whole file at `source` as one object
    async fn put_object(
        &self,
        location: &ObjectLocation,
        source: &Path,
        content_length: u64,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Open a multipart session and return its upload id
    async fn create_multipart_upload(&self, location: &ObjectLocation) -> StorageResult<String>;

    /// Upload one part of a session and return the ETag the service assigned
    async fn upload_part(
        &self,
        location: &ObjectLocation,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> StorageResult<String>;

    /// Commit a session. `parts` must be sorted by part number.
    async fn complete_multipart_upload(
        &self,
        location: &ObjectLocation,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> StorageResult<()>;

    /// Discard a session and every part uploaded to it
    async fn abort_multipart_upload(
        &self,
        location: &ObjectLocation,
        upload_id: &str,
    ) -> StorageResult<()>;
}
