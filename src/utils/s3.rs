use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::ConfigLoader;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use aws_types::region::Region;

use crate::errors::MediaError;
use crate::utils::media::MediaStore;

pub async fn create_s3_client() -> S3Client {
    let aws_config = ConfigLoader::default()
        .region(std::env::var("AWS_REGION").ok().map(Region::new))
        .behavior_version(BehaviorVersion::latest())
        .load()
        .await;

    S3Client::new(&aws_config)
}

/// Media store backed by an S3 bucket; objects are served from `base_url`.
pub struct S3MediaStore {
    client: S3Client,
    bucket: String,
    base_url: String,
}

impl S3MediaStore {
    pub fn new(client: S3Client, bucket: String, base_url: String) -> Self {
        Self {
            client,
            bucket,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), MediaError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| MediaError::Storage(err.to_string()))?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<(), MediaError> {
        let prefix = format!("{}/", prefix.trim_end_matches('/'));
        let listing = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&prefix)
            .send()
            .await
            .map_err(|err| MediaError::Storage(err.to_string()))?;

        for object in listing.contents() {
            let Some(key) = object.key() else { continue };
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|err| MediaError::Storage(err.to_string()))?;
        }
        Ok(())
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}
