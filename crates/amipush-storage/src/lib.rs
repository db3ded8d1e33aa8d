//! amipush Storage Library
//!
//! Object storage side of the publish workflow: the [`ObjectStorage`] trait
//! describing the five calls the workflow makes against a bucket, the S3
//! implementation of it, and the upload executor that drives a planned
//! upload (single PUT or multipart session) through any backend.

#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod source;
pub mod traits;
pub mod upload;

// Re-export commonly used types
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use source::SourceFile;
pub use traits::{CompletedPart, ObjectStorage, StorageError, StorageResult};
pub use upload::{MultipartSession, UploadExecutor};
