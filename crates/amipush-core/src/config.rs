//! Configuration module
//!
//! Validated, immutable settings for one publish invocation. Everything that
//! can be rejected without talking to the remote platform is rejected here,
//! before any network call is made.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_DESCRIPTION_PREFIX, DEFAULT_TIMEOUT_SECS, IMPORT_POLL_INTERVAL, MAX_MULTIPART_PARTS,
    MIN_SIZE_FOR_MULTIPART_UPLOAD, MULTIPART_UPLOAD_PART_SIZE,
};
use crate::error::{PublishError, PublishResult};
use crate::plan::{part_count, plan, UploadPlan};

/// Firmware the registered image boots with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootMode {
    #[default]
    Legacy,
    Uefi,
}

impl Display for BootMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BootMode::Legacy => write!(f, "legacy"),
            BootMode::Uefi => write!(f, "uefi"),
        }
    }
}

/// Image registration flags
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistrationOptions {
    pub boot_mode: BootMode,
    /// Attach a TPM device; only valid together with UEFI
    pub tpm: bool,
    pub ena: bool,
    pub sriov_net_support: Option<String>,
}

impl RegistrationOptions {
    /// Build options from raw invocation flags. An empty `sriov` disables it.
    pub fn from_flags(uefi: bool, tpm: bool, ena: bool, sriov: &str) -> Self {
        let sriov = sriov.trim();
        Self {
            boot_mode: if uefi { BootMode::Uefi } else { BootMode::Legacy },
            tpm,
            ena,
            sriov_net_support: (!sriov.is_empty()).then(|| sriov.to_string()),
        }
    }

    pub fn validate(&self) -> PublishResult<()> {
        if self.tpm && self.boot_mode != BootMode::Uefi {
            return Err(PublishError::Config(
                "Cannot use tpm without uefi mode".to_string(),
            ));
        }
        Ok(())
    }
}

/// How the image bytes are sent to object storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSettings {
    /// Objects up to and including this size use a single PUT
    pub multipart_threshold: u64,
    pub part_size: u64,
    /// Maximum parts in flight at once; 1 uploads strictly in order
    pub concurrency: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            multipart_threshold: MIN_SIZE_FOR_MULTIPART_UPLOAD,
            part_size: MULTIPART_UPLOAD_PART_SIZE,
            concurrency: 1,
        }
    }
}

impl UploadSettings {
    pub fn validate(&self) -> PublishResult<()> {
        if self.part_size == 0 {
            return Err(PublishError::Config(
                "Multipart part size must be greater than zero".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(PublishError::Config(
                "Upload concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Plan the upload of an object of `total_size` bytes.
    pub fn plan_for(&self, total_size: u64) -> PublishResult<UploadPlan> {
        self.validate()?;
        if total_size == 0 {
            return Err(PublishError::Config(
                "Refusing to publish an empty image".to_string(),
            ));
        }

        let parts = part_count(total_size, self.part_size);
        if total_size > self.multipart_threshold && parts > MAX_MULTIPART_PARTS {
            return Err(PublishError::Config(format!(
                "{} bytes at a part size of {} needs {} parts, more than the {} allowed",
                total_size, self.part_size, parts, MAX_MULTIPART_PARTS
            )));
        }
        Ok(plan(total_size, self.multipart_threshold, self.part_size))
    }
}

/// Everything one publish invocation needs
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub source_path: PathBuf,
    pub bucket: String,
    /// Overrides the image name derived from the source path
    pub name: Option<String>,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub description_prefix: String,
    pub registration: RegistrationOptions,
    pub upload: UploadSettings,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible object storage
    pub endpoint_url: Option<String>,
    /// Resume waiting on an existing import task instead of uploading
    pub import_task_id: Option<String>,
}

impl PublishConfig {
    pub fn new(source_path: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            bucket: bucket.into(),
            name: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: IMPORT_POLL_INTERVAL,
            description_prefix: DEFAULT_DESCRIPTION_PREFIX.to_string(),
            registration: RegistrationOptions::default(),
            upload: UploadSettings::default(),
            region: None,
            endpoint_url: None,
            import_task_id: None,
        }
    }

    pub fn validate(&self) -> PublishResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(PublishError::Config(
                "Please provide the bucket to use".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(PublishError::Config(
                "Timeout must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(PublishError::Config(
                "Poll interval must be greater than zero".to_string(),
            ));
        }
        if self.image_name().is_empty() {
            return Err(PublishError::Config(format!(
                "Cannot derive an image name from {}; pass one explicitly",
                self.source_path.display()
            )));
        }
        self.registration.validate()?;
        self.upload.validate()?;
        Ok(())
    }

    /// Image name: the override, or the file's base name without extension
    pub fn image_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_image_name(&self.source_path),
        }
    }

    /// Object key: the image name followed by the source file's extension
    pub fn object_key(&self) -> String {
        match self.source_path.extension() {
            Some(ext) => format!("{}.{}", self.image_name(), ext.to_string_lossy()),
            None => self.image_name(),
        }
    }

    /// Import task to resume; blank ids count as absent
    pub fn resume_task_id(&self) -> Option<&str> {
        self.import_task_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn import_description(&self) -> String {
        format!("{}: {}", self.description_prefix, self.image_name())
    }

    pub fn disk_description(&self) -> String {
        format!("{}: {} disk", self.description_prefix, self.image_name())
    }

    pub fn image_description(&self) -> String {
        format!("{}: {} image", self.description_prefix, self.image_name())
    }
}

fn default_image_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
