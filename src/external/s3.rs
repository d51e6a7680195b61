use crate::config::Config;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{Client as S3Client, config::Region};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Storage for work order photos. Orders only keep the returned URLs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key` and return the public URL of the object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, String>;
    /// Delete the object behind a URL previously returned by `put`.
    async fn delete(&self, url: &str) -> Result<(), String>;
}

pub async fn get_client(config: &Config) -> Arc<S3Client> {
    let region = Region::new("us-east-1");
    let credentials = Credentials::new(
        &config.s3_access_key,
        &config.s3_secret_key,
        None,
        None,
        "manual",
    );
    let shared_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region.clone())
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_url)
        .load()
        .await;

    // Path-style addressing keeps MinIO-style endpoints working
    let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
        .force_path_style(true)
        .build();

    Arc::new(S3Client::from_conf(s3_config))
}

pub struct S3BlobStore {
    client: Arc<S3Client>,
    bucket: String,
    base_url: String,
}

impl S3BlobStore {
    pub async fn new(config: &Config) -> Self {
        Self {
            client: get_client(config).await,
            bucket: config.s3_bucket_id.clone(),
            base_url: format!(
                "{}/{}",
                config.s3_url.trim_end_matches('/'),
                config.s3_bucket_id
            ),
        }
    }

    fn key_from_url<'a>(&self, url: &'a str) -> &'a str {
        url.strip_prefix(&self.base_url)
            .map_or(url, |key| key.trim_start_matches('/'))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| format!("Failed to upload object to S3: {err}"))?;

        Ok(format!("{}/{key}", self.base_url))
    }

    async fn delete(&self, url: &str) -> Result<(), String> {
        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.key_from_url(url))
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => Err(format!("Failed to delete object from S3: {err}")),
        }
    }
}

/// Process-local blob store used when S3 is not configured and in tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    const URL_PREFIX: &'static str = "memory://";
}

#[cfg(test)]
impl MemoryBlobStore {
    pub fn contains(&self, url: &str) -> bool {
        self.objects
            .lock()
            .is_ok_and(|objects| objects.contains_key(url))
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map_or(0, |objects| objects.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String, String> {
        let url = format!("{}{key}", Self::URL_PREFIX);
        self.objects
            .lock()
            .map_err(|err| err.to_string())?
            .insert(url.clone(), bytes);
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), String> {
        self.objects
            .lock()
            .map_err(|err| err.to_string())?
            .remove(url)
            .map(|_| ())
            .ok_or_else(|| format!("No object stored at {url}"))
    }
}

/// Picks S3 when it is configured, the in-memory store otherwise.
pub async fn blob_store_from_config(config: &Config) -> Arc<dyn BlobStore> {
    if config.s3_configured() {
        Arc::new(S3BlobStore::new(config).await)
    } else {
        tracing::warn!("S3 is not configured, work order photos are kept in memory");
        Arc::new(MemoryBlobStore::default())
    }
}
