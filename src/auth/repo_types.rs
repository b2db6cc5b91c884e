use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Row of `user_tb`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String, // Argon2 hash, never sent back
    pub gender: String,
    pub user_image_url: Option<String>,
    pub user_image_path: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub email: String,
    pub password_hash: String,
    pub gender: String,
}

/// Full replacement of the mutable columns. `password_hash: None` keeps the stored one.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub fullname: String,
    pub email: String,
    pub gender: String,
    pub user_image_url: Option<String>,
    pub user_image_path: Option<String>,
    pub password_hash: Option<String>,
}
