use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

/// Bucket and key of an object in the object storage service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl Display for ObjectLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// What is being uploaded and where it goes.
///
/// Created once per publish invocation and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub source_path: PathBuf,
    pub location: ObjectLocation,
    pub total_size: u64,
}

impl UploadTarget {
    pub fn bucket(&self) -> &str {
        &self.location.bucket
    }

    pub fn key(&self) -> &str {
        &self.location.key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStrategy {
    /// One PUT of the whole object
    Simple,
    /// Multipart session with independently uploaded parts
    Multipart,
}

impl Display for UploadStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStrategy::Simple => write!(f, "simple"),
            UploadStrategy::Multipart => write!(f, "multipart"),
        }
    }
}

/// One byte range of a multipart upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartDescriptor {
    /// 1-based part number as sent to the storage service
    pub part_number: i32,
    pub offset: u64,
    pub length: u64,
}

impl PartDescriptor {
    /// Exclusive end offset of the range
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}
