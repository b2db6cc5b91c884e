use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use uuid::Uuid;

use crate::config::StorageConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    UserImages,
    FoodImages,
}

impl Bucket {
    pub fn name(self) -> &'static str {
        match self {
            Bucket::UserImages => "user_bk",
            Bucket::FoodImages => "food_bk",
        }
    }
}

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(
        &self,
        bucket: Bucket,
        key: &str,
        body: Bytes,
        content_type: &str,
        upsert: bool,
    ) -> anyhow::Result<()>;
    async fn remove(&self, bucket: Bucket, keys: &[String]) -> anyhow::Result<()>;
    fn public_url(&self, bucket: Bucket, key: &str) -> String;
}

/// `public/<owner>/<millis>_<file name>`
pub fn object_path(owner: Uuid, uploaded_at_ms: i128, file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    format!("public/{}/{}_{}", owner, uploaded_at_ms, base)
}

pub fn public_url(base: &str, bucket: Bucket, key: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), bucket.name(), key)
}

/// Recovers the object path from a public URL. Only used for rows that were
/// written without a stored path.
pub fn path_from_public_url(bucket: Bucket, url: &str) -> Option<String> {
    let marker = format!("/{}/", bucket.name());
    url.split_once(&marker)
        .map(|(_, rest)| rest.split(['?', '#']).next().unwrap_or(rest).to_string())
        .filter(|p| !p.is_empty())
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    public_base: String,
}

impl Storage {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            public_base: cfg.public_url.clone(),
        })
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(
        &self,
        bucket: Bucket,
        key: &str,
        body: Bytes,
        content_type: &str,
        upsert: bool,
    ) -> anyhow::Result<()> {
        if !upsert {
            match self
                .client
                .head_object()
                .bucket(bucket.name())
                .key(key)
                .send()
                .await
            {
                Ok(_) => anyhow::bail!("The resource already exists: {}/{}", bucket.name(), key),
                Err(e) => match e.as_service_error() {
                    Some(se) if se.is_not_found() => {}
                    _ => return Err(anyhow::Error::new(e).context("s3 head_object")),
                },
            }
        }

        self.client
            .put_object()
            .bucket(bucket.name())
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    async fn remove(&self, bucket: Bucket, keys: &[String]) -> anyhow::Result<()> {
        for key in keys {
            self.client
                .delete_object()
                .bucket(bucket.name())
                .key(key)
                .send()
                .await
                .with_context(|| format!("s3 delete_object {}/{}", bucket.name(), key))?;
        }
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        public_url(&self.public_base, bucket, key)
    }
}
