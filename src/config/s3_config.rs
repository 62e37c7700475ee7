use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{Client as S3Client, config::Credentials};

use crate::{
    config::StorageConfig,
    error::{AppError, Result},
};

pub async fn load_s3_client(storage: &StorageConfig) -> Result<S3Client> {
    let aws_access_key = std::env::var("AWS_ACCESS_KEY_ID")
        .map_err(|_| AppError::ConfigError("AWS_ACCESS_KEY_ID not set".to_string()))?;

    let aws_secret_key = std::env::var("AWS_SECRET_ACCESS_KEY")
        .map_err(|_| AppError::ConfigError("AWS_SECRET_ACCESS_KEY not set".to_string()))?;

    let credentials = Credentials::new(
        aws_access_key,
        aws_secret_key,
        None,
        None,
        "env-credentials",
    );

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(storage.region.clone()))
        .credentials_provider(credentials);

    // S3-compatible stores (R2, MinIO) need an explicit endpoint.
    if let Ok(endpoint) = std::env::var("S3_ENDPOINT") {
        loader = loader.endpoint_url(endpoint);
    }

    let config = loader.load().await;

    let s3_client = S3Client::new(&config);

    tracing::info!("S3 client initialized for bucket {}", storage.bucket);

    Ok(s3_client)
}

/// Client for code paths that never reach the network, such as router tests.
pub fn offline_s3_client(region: &str) -> S3Client {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(Credentials::new("test", "test", None, None, "static"))
        .build();

    S3Client::from_conf(config)
}
