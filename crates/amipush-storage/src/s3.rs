use crate::traits::{CompletedPart, ObjectStorage, StorageError, StorageResult};
use amipush_core::ObjectLocation;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart as S3CompletedPart};
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::path::Path;

/// S3 storage implementation
#[derive(Clone, Debug)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// Create a new S3Storage from a loaded AWS configuration
    ///
    /// # Arguments
    /// * `sdk_config` - Shared AWS configuration (region, credentials)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    ///
    /// The SDK's retry layer is turned off: the workflow makes exactly one
    /// attempt per call.
    pub fn new(sdk_config: &SdkConfig, endpoint_url: Option<&str>) -> Self {
        let mut builder =
            aws_sdk_s3::config::Builder::from(sdk_config).retry_config(RetryConfig::disabled());

        if let Some(endpoint) = endpoint_url {
            // Path-style addressing is required by MinIO and most S3-compatible providers
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        S3Storage {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put_object(
        &self,
        location: &ObjectLocation,
        source: &Path,
        content_length: u64,
        content_type: &str,
    ) -> StorageResult<()> {
        let start = std::time::Instant::now();

        let body = ByteStream::from_path(source)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        tracing::debug!(
            bucket = %location.bucket,
            key = %location.key,
            content_length,
            content_type,
            "PutObject"
        );

        self.client
            .put_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .body(body)
            .content_length(content_length as i64)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %location.bucket,
                    key = %location.key,
                    size_bytes = content_length,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(DisplayErrorContext(&e).to_string())
            })?;

        tracing::info!(
            bucket = %location.bucket,
            key = %location.key,
            size_bytes = content_length,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn create_multipart_upload(&self, location: &ObjectLocation) -> StorageResult<String> {
        let create_result = self
            .client
            .create_multipart_upload()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %location.bucket,
                    key = %location.key,
                    "Failed to create multipart upload"
                );
                StorageError::SessionFailed(DisplayErrorContext(&e).to_string())
            })?;

        create_result
            .upload_id()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| StorageError::SessionFailed("No upload ID returned from S3".to_string()))
    }

    async fn upload_part(
        &self,
        location: &ObjectLocation,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> StorageResult<String> {
        let size = body.len();
        let start = std::time::Instant::now();

        let upload_part_result = self
            .client
            .upload_part()
            .bucket(&location.bucket)
            .key(&location.key)
            .upload_id(upload_id)
            .part_number(part_number)
            .content_length(size as i64)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %location.bucket,
                    key = %location.key,
                    part_number,
                    "Failed to upload part"
                );
                StorageError::UploadFailed(DisplayErrorContext(&e).to_string())
            })?;

        let etag = upload_part_result
            .e_tag()
            .ok_or_else(|| {
                StorageError::UploadFailed(format!("No ETag returned for part {}", part_number))
            })?
            .to_string();

        tracing::debug!(
            key = %location.key,
            part_number,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 part uploaded"
        );

        Ok(etag)
    }

    async fn complete_multipart_upload(
        &self,
        location: &ObjectLocation,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> StorageResult<()> {
        let parts = parts
            .iter()
            .map(|part| {
                S3CompletedPart::builder()
                    .part_number(part.part_number)
                    .e_tag(&part.e_tag)
                    .build()
            })
            .collect::<Vec<_>>();

        let completed_parts = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&location.bucket)
            .key(&location.key)
            .upload_id(upload_id)
            .multipart_upload(completed_parts)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %location.bucket,
                    key = %location.key,
                    "Failed to complete multipart upload"
                );
                StorageError::SessionFailed(DisplayErrorContext(&e).to_string())
            })?;

        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        location: &ObjectLocation,
        upload_id: &str,
    ) -> StorageResult<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&location.bucket)
            .key(&location.key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| StorageError::BackendError(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}
