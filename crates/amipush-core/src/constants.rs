//! Fixed values of the publish workflow.

use std::time::Duration;

const GIB: u64 = 1024 * 1024 * 1024;

/// Objects larger than this are uploaded with a multipart session (4 GiB).
pub const MIN_SIZE_FOR_MULTIPART_UPLOAD: u64 = 4 * GIB;

/// Size of every multipart part except possibly the last one (1 GiB).
pub const MULTIPART_UPLOAD_PART_SIZE: u64 = GIB;

/// Upper bound on parts per multipart upload imposed by S3.
pub const MAX_MULTIPART_PARTS: u64 = 10_000;

/// End-to-end budget for one publish invocation, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Interval between two import task status checks.
pub const IMPORT_POLL_INTERVAL: Duration = Duration::from_secs(60);

pub const OBJECT_CONTENT_TYPE: &str = "application/octet-stream";

pub const IMPORT_DISK_FORMAT: &str = "raw";

pub const DEFAULT_DESCRIPTION_PREFIX: &str = "amipush";

pub const ROOT_DEVICE_NAME: &str = "/dev/sda1";

pub const ROOT_VOLUME_TYPE: &str = "standard";

pub const VIRTUALIZATION_TYPE: &str = "hvm";

pub const IMAGE_ARCHITECTURE: &str = "x86_64";

/// TPM version requested when TPM support is enabled.
pub const TPM_VERSION: &str = "v2.0";
