//! AWS SDK configuration shared by every client.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::debug;

use crate::config::AwsConfig;

/// Resolve credentials and region, honouring an explicit profile or region.
pub async fn load_sdk_config(aws: &AwsConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &aws.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = &aws.profile {
        loader = loader.profile_name(profile);
    }

    let sdk_config = loader.load().await;
    debug!(region = ?sdk_config.region(), "Loaded AWS configuration");
    sdk_config
}
