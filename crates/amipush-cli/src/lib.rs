//! amipush CLI library: the publish pipeline plus start-up helpers shared by
//! the binary.

pub mod publish;

pub use publish::{PublishOutcome, Publisher};

use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load the shared AWS configuration (credentials chain, region).
///
/// An explicit `region` wins over the environment and profile. Retries are
/// disabled: every call the workflow makes is a single attempt.
pub async fn load_aws_config(region: Option<String>) -> SdkConfig {
    let region_provider = RegionProviderChain::first_try(region.map(Region::new))
        .or_default_provider();

    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .retry_config(RetryConfig::disabled())
        .load()
        .await
}
