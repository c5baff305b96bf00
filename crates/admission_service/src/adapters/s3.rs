use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::config::S3Settings;
use crate::ports::{BlobError, BlobStore};

#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    public_base: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: impl Into<String>, public_base: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Builds the SDK client from the ambient AWS credentials plus our settings.
    pub async fn from_settings(settings: &S3Settings) -> Self {
        let region_provider =
            RegionProviderChain::first_try(Region::new(settings.region.clone())).or_default_provider();
        let aws_config = aws_config::from_env().region(region_provider).load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&aws_config);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.force_path_style(true).endpoint_url(endpoint);
        }
        let client = Client::from_conf(builder.build());

        let public_base = public_base_url(settings);
        Self::new(client, settings.bucket.clone(), public_base)
    }

    /// Creates the bucket when it does not exist yet (local MinIO setups).
    pub async fn ensure_bucket(&self) -> Result<(), BlobError> {
        if self.client.head_bucket().bucket(&self.bucket).send().await.is_ok() {
            return Ok(());
        }
        info!(bucket = %self.bucket, "creating upload bucket");
        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| BlobError(format!("create bucket {}: {e}", self.bucket)))?;
        Ok(())
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key.trim_start_matches('/'))
    }
}

/// Public URL prefix for stored objects.
pub fn public_base_url(settings: &S3Settings) -> String {
    if let Some(base) = &settings.public_base_url {
        return base.trim_end_matches('/').to_string();
    }
    match &settings.endpoint {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), settings.bucket),
        None => format!("https://{}.s3.{}.amazonaws.com", settings.bucket, settings.region),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn backend_tag(&self) -> &'static str {
        "s3"
    }

    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| BlobError(format!("S3 upload failed for {key}: {e}")))?;

        debug!(key, size, "object stored");
        Ok(self.object_url(key))
    }
}
