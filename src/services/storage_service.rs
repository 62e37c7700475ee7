use aws_sdk_s3 as s3;
use aws_sdk_s3::primitives::ByteStream;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    services::upload_service::{UploadedFile, extension_for},
};

/// An object waiting to be written by [`Storage::put_many`].
pub struct PendingObject {
    pub key: String,
    pub content_type: String,
    pub data: ByteStream,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Bucket plus the public base URL objects are served from.
#[derive(Clone)]
pub struct Storage {
    pub client: s3::Client,
    pub bucket: String,
    pub assets_url: String,
}

impl Storage {
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.assets_url, key)
    }

    pub async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        data: impl Into<ByteStream>,
    ) -> Result<StoredObject> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(data.into())
            .send()
            .await
            .map_err(|e| {
                AppError::Upstream(format!("Failed to store object {}: {}", key, s3::Error::from(e)))
            })?;

        Ok(StoredObject {
            key: key.to_string(),
            url: self.public_url(key),
        })
    }

    /// Writes every object in order. If one write fails the objects
    /// already written by this call are removed again.
    pub async fn put_many(&self, objects: Vec<PendingObject>) -> Result<Vec<StoredObject>> {
        let mut stored: Vec<StoredObject> = Vec::with_capacity(objects.len());

        for object in objects {
            match self
                .put_object(&object.key, &object.content_type, object.data)
                .await
            {
                Ok(written) => stored.push(written),
                Err(e) => {
                    let keys: Vec<String> = stored.into_iter().map(|o| o.key).collect();
                    self.delete_keys(&keys).await;
                    return Err(e);
                }
            }
        }

        Ok(stored)
    }

    /// Stores every file under `prefix` with a fresh key per file.
    pub async fn put_batch(&self, prefix: &str, files: &[UploadedFile]) -> Result<Vec<StoredObject>> {
        let pending = files
            .iter()
            .map(|file| PendingObject {
                key: format!(
                    "{}/{}.{}",
                    prefix,
                    Uuid::new_v4(),
                    extension_for(&file.content_type)
                ),
                content_type: file.content_type.clone(),
                data: ByteStream::from(file.data.clone()),
            })
            .collect();

        let stored = self.put_many(pending).await?;

        tracing::info!("Stored {} objects under {}", stored.len(), prefix);

        Ok(stored)
    }

    pub async fn delete_object(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                AppError::Upstream(format!("Failed to delete object {}: {}", key, s3::Error::from(e)))
            })?;

        Ok(())
    }

    /// Best-effort cleanup; failures are logged, not returned.
    pub async fn delete_keys(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.delete_object(key).await {
                tracing::warn!("Storage cleanup failed: {}", e);
            }
        }
    }

    pub async fn delete_objects_by_prefix(&self, prefix: &str) -> Result<usize> {
        let mut objects_to_delete = Vec::new();

        let mut continuation_token: Option<String> = None;

        loop {
            let mut list_request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = continuation_token {
                list_request = list_request.continuation_token(token);
            }

            let response = list_request.send().await.map_err(|e| {
                AppError::Upstream(format!("Failed to list {}: {}", prefix, s3::Error::from(e)))
            })?;

            if let Some(contents) = response.contents {
                for object in contents {
                    if let Some(key) = object.key {
                        objects_to_delete.push(key);
                    }
                }
            }

            if !response.is_truncated.unwrap_or(false) {
                break;
            }

            continuation_token = response.next_continuation_token;
        }

        let delete_count = objects_to_delete.len();

        for key in &objects_to_delete {
            self.delete_object(key).await?;
        }

        Ok(delete_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::offline_s3_client;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region, retry::RetryConfig};

    fn storage_with(client: s3::Client) -> Storage {
        Storage {
            client,
            bucket: "assets".to_string(),
            assets_url: "https://cdn.example.com".to_string(),
        }
    }

    /// Points at a closed local port so every request fails fast.
    fn unreachable_storage() -> Storage {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "static"))
            .endpoint_url("http://127.0.0.1:1")
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .build();

        storage_with(s3::Client::from_conf(config))
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn public_url_joins_assets_base_and_key() {
        let storage = storage_with(offline_s3_client("us-east-1"));

        assert_eq!(
            storage.public_url("graphics-main/abc.png"),
            "https://cdn.example.com/graphics-main/abc.png"
        );
    }

    #[test]
    fn cleanup_futures_are_send() {
        let storage = storage_with(offline_s3_client("us-east-1"));
        let keys = vec!["graphics-main/a.png".to_string()];

        let cleanup = storage.delete_keys(&keys);
        assert_send(&cleanup);

        let batch = storage.put_batch("graphics-main", &[]);
        assert_send(&batch);
    }

    #[tokio::test]
    async fn put_many_with_nothing_to_write_is_empty() {
        let storage = unreachable_storage();

        let stored = storage.put_many(Vec::new()).await.unwrap();

        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn put_many_reports_upstream_failure() {
        let storage = unreachable_storage();
        let pending = vec![
            PendingObject {
                key: "jerseys-main/1/a.png".to_string(),
                content_type: "image/png".to_string(),
                data: ByteStream::from(vec![1u8, 2, 3]),
            },
            PendingObject {
                key: "jerseys-main/1/b.png".to_string(),
                content_type: "image/png".to_string(),
                data: ByteStream::from(vec![4u8, 5, 6]),
            },
        ];

        let err = storage.put_many(pending).await.unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
    }
}
