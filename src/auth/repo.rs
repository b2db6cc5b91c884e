use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, UserChanges, UserRow};

/// The `user_tb.email` unique constraint rejected a write.
#[derive(Debug, thiserror::Error)]
#[error("email already registered")]
pub struct EmailTaken;

fn write_error(e: sqlx::Error, what: &'static str) -> anyhow::Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => anyhow::Error::new(EmailTaken),
        _ => anyhow::Error::new(e).context(what),
    }
}

const USER_COLUMNS: &str =
    "id, fullname, email, password, gender, user_image_url, user_image_path, created_at";

/// Row gateway for `user_tb`.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Every row with this email; callers decide what "exactly one" means.
    async fn select_by_email(&self, email: &str) -> anyhow::Result<Vec<UserRow>>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<UserRow>>;
    async fn insert(&self, new: NewUser) -> anyhow::Result<UserRow>;
    async fn update(&self, id: Uuid, changes: UserChanges) -> anyhow::Result<UserRow>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn select_by_email(&self, email: &str) -> anyhow::Result<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM user_tb WHERE email = $1"
        ))
        .bind(email)
        .fetch_all(&self.db)
        .await
        .context("select user_tb by email")?;
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM user_tb WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("select user_tb by id")?;
        Ok(row)
    }

    async fn insert(&self, new: NewUser) -> anyhow::Result<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO user_tb (fullname, email, password, gender)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.fullname)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.gender)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, "insert user_tb row"))?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> anyhow::Result<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE user_tb
               SET fullname = $2,
                   email = $3,
                   gender = $4,
                   user_image_url = $5,
                   user_image_path = $6,
                   password = COALESCE($7, password)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.fullname)
        .bind(&changes.email)
        .bind(&changes.gender)
        .bind(&changes.user_image_url)
        .bind(&changes.user_image_path)
        .bind(&changes.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, "update user_tb row"))?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM user_tb WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user_tb row")?;
        Ok(())
    }
}
