//! amipush: publish a raw disk image to AWS as a machine image.
//!
//! The image is uploaded to S3, imported as an EBS snapshot and registered
//! as an AMI. Credentials and region come from the usual AWS chain; a `.env`
//! file in the working directory is honoured.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use amipush_cli::{init_tracing, load_aws_config, Publisher};
use amipush_compute::Ec2ImageService;
use amipush_core::constants::{
    DEFAULT_DESCRIPTION_PREFIX, DEFAULT_TIMEOUT_SECS, IMPORT_POLL_INTERVAL,
    MIN_SIZE_FOR_MULTIPART_UPLOAD, MULTIPART_UPLOAD_PART_SIZE,
};
use amipush_core::{Deadline, PublishConfig, RegistrationOptions, UploadSettings};
use amipush_storage::S3Storage;
use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "amipush", about = "Publish a raw disk image to AWS as an AMI")]
struct Cli {
    /// Path to the raw disk image
    path: PathBuf,
    /// S3 bucket to upload the image to
    #[arg(long, env = "AMIPUSH_BUCKET", default_value = "")]
    bucket: String,
    /// Image name (defaults to the file name without extension)
    #[arg(long = "img-name", env = "AMIPUSH_IMAGE_NAME")]
    img_name: Option<String>,
    /// Overall deadline in seconds for upload, import and registration
    #[arg(long, env = "AMIPUSH_UPLOAD_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,
    /// Enable ENA networking
    #[arg(long)]
    ena: bool,
    /// SR-IOV network support, e.g. "simple" (empty disables it)
    #[arg(long, default_value = "")]
    sriov: String,
    /// Boot with UEFI firmware
    #[arg(long)]
    uefi: bool,
    /// Attach a TPM 2.0 device (requires --uefi)
    #[arg(long)]
    tpm: bool,
    /// AWS region (defaults to the profile)
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,
    /// Custom endpoint for S3-compatible storage
    #[arg(long, env = "AMIPUSH_ENDPOINT_URL")]
    endpoint_url: Option<String>,
    /// Multipart part size in bytes
    #[arg(long, default_value_t = MULTIPART_UPLOAD_PART_SIZE)]
    part_size: u64,
    /// Images larger than this many bytes use a multipart upload
    #[arg(long, default_value_t = MIN_SIZE_FOR_MULTIPART_UPLOAD)]
    multipart_threshold: u64,
    /// Parts uploaded concurrently
    #[arg(long, default_value_t = 1)]
    upload_concurrency: usize,
    /// Seconds between import status checks
    #[arg(long, default_value_t = IMPORT_POLL_INTERVAL.as_secs())]
    poll_interval: u64,
    /// Prefix of the descriptions attached to the snapshot and image
    #[arg(long, default_value = DEFAULT_DESCRIPTION_PREFIX)]
    description_prefix: String,
    /// Resume waiting on an existing import task instead of uploading
    #[arg(long)]
    import_task_id: Option<String>,
}

impl Cli {
    fn into_config(self) -> PublishConfig {
        let mut config = PublishConfig::new(self.path, self.bucket);
        config.name = self.img_name;
        config.timeout = Duration::from_secs(self.timeout);
        config.poll_interval = Duration::from_secs(self.poll_interval);
        config.description_prefix = self.description_prefix;
        config.registration =
            RegistrationOptions::from_flags(self.uefi, self.tpm, self.ena, &self.sriov);
        config.upload = UploadSettings {
            multipart_threshold: self.multipart_threshold,
            part_size: self.part_size,
            concurrency: self.upload_concurrency,
        };
        config.region = self.region;
        config.endpoint_url = self.endpoint_url;
        config.import_task_id = self.import_task_id;
        config
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize outcome")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = Cli::parse().into_config();
    config.validate().context("Invalid arguments")?;

    let token = CancellationToken::new();
    let deadline = Deadline::with_token(config.timeout, token.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling publish");
            token.cancel();
        }
    });

    let sdk_config = load_aws_config(config.region.clone()).await;
    let storage = Arc::new(S3Storage::new(&sdk_config, config.endpoint_url.as_deref()));
    let images = Arc::new(Ec2ImageService::new(&sdk_config));

    let outcome = Publisher::new(storage, images)
        .publish(&config, deadline)
        .await
        .map_err(|e| {
            tracing::error!(
                error_type = e.error_type(),
                import_task_id = e.resumable_task_id(),
                "{}",
                e.detailed_message()
            );
            e
        })
        .context("Failed to publish image")?;

    tracing::info!(
        image_id = %outcome.image_id,
        snapshot_id = %outcome.snapshot_id,
        "Image published"
    );
    print_json(&outcome)?;
    Ok(())
}
