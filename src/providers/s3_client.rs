use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::Client;

use super::StoreResult;

/// Region used when static keys are given without one
pub const DEFAULT_REGION: &str = "us-east-1";

pub struct S3ClientConfig<'a> {
    pub access_key_id: Option<&'a str>,
    pub secret_access_key: Option<&'a str>,
    pub region: Option<&'a str>,
    pub endpoint_url: Option<&'a str>,
    pub force_path_style: bool,
}

/// Build an S3 client.
///
/// With both static keys present the client is configured directly; otherwise
/// credentials and region come from the AWS default provider chain, which is
/// why this is async.
pub async fn create_s3_client(config: &S3ClientConfig<'_>) -> StoreResult<Client> {
    let mut builder = match (config.access_key_id, config.secret_access_key) {
        (Some(access_key_id), Some(secret_access_key)) => {
            let credentials =
                Credentials::new(access_key_id, secret_access_key, None, None, "s3-download");
            S3ConfigBuilder::new()
                .behavior_version(BehaviorVersion::latest())
                .credentials_provider(credentials)
                .region(Region::new(
                    config.region.unwrap_or(DEFAULT_REGION).to_string(),
                ))
        }
        (None, None) => {
            let sdk_config = load_default_config(config.region).await;
            S3ConfigBuilder::from(&sdk_config)
        }
        _ => {
            return Err("access_key_id and secret_access_key must be set together".into());
        }
    };

    if let Some(endpoint_url) = config.endpoint_url {
        builder = builder.endpoint_url(endpoint_url);
    }

    if config.force_path_style {
        builder = builder.force_path_style(true);
    }

    let s3_config = builder.build();
    Ok(Client::from_conf(s3_config))
}

async fn load_default_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}
