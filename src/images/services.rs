use anyhow::Context;
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::storage::{object_path, Bucket, StorageClient};

/// A file picked in one of the forms, not yet stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
}

/// An object that now lives in a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: String,
    pub url: String,
}

/// Mirrors the pickers' `accept="image/*"` filter.
pub fn is_image(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

/// Displayable representation of a picked file, shown before upload.
pub fn preview_data_url(upload: &ImageUpload) -> String {
    format!(
        "data:{};base64,{}",
        upload.content_type,
        Base64::encode_string(&upload.body)
    )
}

pub(crate) fn now_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

pub async fn upload_image(
    storage: &dyn StorageClient,
    bucket: Bucket,
    owner: Uuid,
    upload: &ImageUpload,
) -> anyhow::Result<StoredImage> {
    let path = object_path(owner, now_millis(), &upload.file_name);
    storage
        .put_object(
            bucket,
            &path,
            upload.body.clone(),
            &upload.content_type,
            false,
        )
        .await
        .with_context(|| format!("upload {}/{}", bucket.name(), path))?;
    let url = storage.public_url(bucket, &path);
    debug!(bucket = bucket.name(), %path, "image uploaded");
    Ok(StoredImage { path, url })
}

/// Removal whose failure must not abort the surrounding flow.
pub async fn remove_best_effort(storage: &dyn StorageClient, bucket: Bucket, path: &str) {
    if let Err(e) = storage.remove(bucket, &[path.to_string()]).await {
        warn!(error = %e, bucket = bucket.name(), %path, "failed to remove stored image");
    }
}
