use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// S3-compatible object store holding the `user_bk` and `food_bk` buckets.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// Base that public object URLs are built from, without the bucket segment.
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub max_upload_bytes: usize,
}

const DEFAULT_SESSION_TTL_MINUTES: i64 = 60 * 24 * 7;
const DEFAULT_MAX_UPLOAD_MB: usize = 20;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let session = SessionConfig {
            secret: required("SESSION_SECRET")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "food-tracker".into()),
            audience: std::env::var("SESSION_AUDIENCE")
                .unwrap_or_else(|_| "food-tracker-web".into()),
            ttl_minutes: parse_or(
                std::env::var("SESSION_TTL_MINUTES").ok(),
                DEFAULT_SESSION_TTL_MINUTES,
            ),
        };
        let storage = StorageConfig {
            endpoint: required("STORAGE_ENDPOINT")?,
            region: std::env::var("STORAGE_REGION").unwrap_or_else(|_| "us-east-1".into()),
            access_key: required("STORAGE_ACCESS_KEY")?,
            secret_key: required("STORAGE_SECRET_KEY")?,
            public_url: required("STORAGE_PUBLIC_URL")?,
        };
        let max_upload_mb = parse_or(std::env::var("MAX_UPLOAD_MB").ok(), DEFAULT_MAX_UPLOAD_MB);

        Ok(Self {
            database_url,
            session,
            storage,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("{key} is not set"))
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}
