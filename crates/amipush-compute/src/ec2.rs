use crate::traits::{ComputeError, ComputeResult, ImageService};
use amipush_core::{BootMode, ImportRequest, ImportStatus, ImportTask, RegistrationRequest};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::config::retry::RetryConfig;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{
    ArchitectureValues, BlockDeviceMapping, BootModeValues, EbsBlockDevice,
    SnapshotDiskContainer, TpmSupportValues, UserBucket, VolumeType,
};
use aws_sdk_ec2::Client;

/// EC2 implementation of the import and registration calls
#[derive(Clone, Debug)]
pub struct Ec2ImageService {
    client: Client,
}

impl Ec2ImageService {
    /// Create the EC2 client from a loaded AWS configuration, with the SDK's
    /// own retries turned off.
    pub fn new(sdk_config: &SdkConfig) -> Self {
        let config = aws_sdk_ec2::config::Builder::from(sdk_config)
            .retry_config(RetryConfig::disabled())
            .build();

        Self {
            client: Client::from_conf(config),
        }
    }
}

#[async_trait]
impl ImageService for Ec2ImageService {
    async fn import_snapshot(&self, request: &ImportRequest) -> ComputeResult<String> {
        let user_bucket = UserBucket::builder()
            .s3_bucket(&request.source.bucket)
            .s3_key(&request.source.key)
            .build();

        let disk_container = SnapshotDiskContainer::builder()
            .description(&request.disk_description)
            .format(&request.format)
            .user_bucket(user_bucket)
            .build();

        tracing::debug!(?request, "ImportSnapshot");

        let output = self
            .client
            .import_snapshot()
            .description(&request.description)
            .disk_container(disk_container)
            .send()
            .await
            .map_err(|e| ComputeError::RequestFailed(DisplayErrorContext(&e).to_string()))?;

        output
            .import_task_id()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(ComputeError::MissingField("ImportTaskId"))
    }

    async fn describe_import_task(&self, task_id: &str) -> ComputeResult<Option<ImportTask>> {
        tracing::debug!(task_id, "DescribeImportSnapshotTasks");

        let output = self
            .client
            .describe_import_snapshot_tasks()
            .import_task_ids(task_id)
            .send()
            .await
            .map_err(|e| ComputeError::RequestFailed(DisplayErrorContext(&e).to_string()))?;

        let Some(task) = output.import_snapshot_tasks().first() else {
            return Ok(None);
        };

        let detail = task.snapshot_task_detail();
        let raw_status = detail
            .and_then(|d| d.status())
            .unwrap_or("active")
            .to_string();

        Ok(Some(ImportTask {
            task_id: task.import_task_id().unwrap_or(task_id).to_string(),
            status: ImportStatus::from_remote(&raw_status),
            raw_status,
            progress: detail.and_then(|d| d.progress()).map(str::to_string),
            status_message: detail.and_then(|d| d.status_message()).map(str::to_string),
            snapshot_id: detail.and_then(|d| d.snapshot_id()).map(str::to_string),
        }))
    }

    async fn register_image(&self, request: &RegistrationRequest) -> ComputeResult<String> {
        let ebs = EbsBlockDevice::builder()
            .delete_on_termination(request.delete_on_termination)
            .snapshot_id(&request.snapshot_id)
            .volume_type(VolumeType::from(request.volume_type.as_str()))
            .build();

        let root_device = BlockDeviceMapping::builder()
            .device_name(&request.root_device_name)
            .ebs(ebs)
            .build();

        let mut builder = self
            .client
            .register_image()
            .name(&request.name)
            .architecture(ArchitectureValues::from(request.architecture.as_str()))
            .block_device_mappings(root_device)
            .description(&request.description)
            .root_device_name(&request.root_device_name)
            .virtualization_type(&request.virtualization_type)
            .ena_support(request.ena_support)
            .set_sriov_net_support(request.sriov_net_support.clone());

        // Legacy images leave the boot mode to the platform default
        if request.boot_mode == BootMode::Uefi {
            builder = builder.boot_mode(BootModeValues::Uefi);
        }
        if let Some(tpm) = &request.tpm_support {
            builder = builder.tpm_support(TpmSupportValues::from(tpm.as_str()));
        }

        tracing::debug!(?request, "RegisterImage");

        let output = builder
            .send()
            .await
            .map_err(|e| ComputeError::RequestFailed(DisplayErrorContext(&e).to_string()))?;

        output
            .image_id()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(ComputeError::MissingField("ImageId"))
    }
}
