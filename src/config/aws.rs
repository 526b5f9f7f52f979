use crate::config::settings::{prefixed_key, StorageSettings};
use crate::domain::ports::{MessageQueue, Storage};
use crate::utils::error::{DisasterDataError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sqs::Client as SqsClient;

pub async fn load_aws_config(region: &str) -> aws_config::SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
    prefix: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String, prefix: String) -> Self {
        Self {
            client,
            bucket,
            prefix,
        }
    }

    pub async fn from_settings(settings: &StorageSettings) -> Self {
        let config = load_aws_config(&settings.region).await;
        Self::new(
            S3Client::new(&config),
            settings.bucket.clone(),
            settings.catalog_prefix.clone(),
        )
    }

    fn key(&self, path: &str) -> String {
        prefixed_key(&self.prefix, path)
    }
}

impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.key(path))
            .send()
            .await
            .map_err(|e| DisasterDataError::StorageError {
                message: format!("Failed to read s3://{}/{}: {}", self.bucket, self.key(path), DisplayErrorContext(&e)),
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| DisasterDataError::StorageError {
                message: format!("Failed to collect S3 data: {}", e),
            })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let key = self.key(path);
        tracing::debug!("Uploading s3://{}/{}", self.bucket, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| DisasterDataError::StorageError {
                message: format!("Failed to write s3://{}/{}: {}", self.bucket, key, DisplayErrorContext(&e)),
            })?;

        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.key(path))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => match err.into_service_error() {
                HeadObjectError::NotFound(_) => Ok(false),
                err => Err(DisasterDataError::StorageError {
                    message: format!("Failed to stat s3://{}/{}: {}", self.bucket, self.key(path), err),
                }),
            },
        }
    }

    fn location(&self, path: &str) -> String {
        format!("s3://{}/{}", self.bucket, self.key(path))
    }
}

/// SQS queue resolved by name.
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: SqsClient,
    queue_url: String,
}

impl SqsQueue {
    pub async fn connect(region: &str, queue_name: &str) -> Result<Self> {
        let config = load_aws_config(region).await;
        let client = SqsClient::new(&config);

        let output = client
            .get_queue_url()
            .queue_name(queue_name)
            .send()
            .await
            .map_err(|e| DisasterDataError::QueueError {
                message: format!("Failed to resolve queue {}: {}", queue_name, aws_sdk_sqs::error::DisplayErrorContext(&e)),
            })?;

        let queue_url = output
            .queue_url()
            .ok_or_else(|| DisasterDataError::QueueError {
                message: format!("Queue {} has no URL", queue_name),
            })?
            .to_string();

        Ok(Self { client, queue_url })
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn send(&self, body: String) -> Result<()> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| DisasterDataError::QueueError {
                message: format!("Failed to send to {}: {}", self.queue_url, aws_sdk_sqs::error::DisplayErrorContext(&e)),
            })?;
        Ok(())
    }
}
