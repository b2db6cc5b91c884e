use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::foods::repo_types::{FoodChanges, FoodEntry, FoodRow, NewFoodEntry};

const FOOD_COLUMNS: &str =
    "id, user_id, foodname, meal, fooddate_at, food_image_url, food_image_path";

/// Row gateway for `food_tb`.
#[async_trait]
pub trait FoodRepo: Send + Sync {
    /// All entries of one owner, newest date first.
    async fn list_by_owner(&self, user_id: Uuid) -> anyhow::Result<Vec<FoodEntry>>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<FoodEntry>>;
    async fn insert(&self, new: NewFoodEntry) -> anyhow::Result<FoodEntry>;
    async fn update(&self, id: Uuid, changes: FoodChanges) -> anyhow::Result<FoodEntry>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgFoodRepo {
    db: PgPool,
}

impl PgFoodRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_entry(row: FoodRow) -> anyhow::Result<FoodEntry> {
    let id = row.id;
    FoodEntry::try_from(row).with_context(|| format!("decode food_tb row {id}"))
}

#[async_trait]
impl FoodRepo for PgFoodRepo {
    async fn list_by_owner(&self, user_id: Uuid) -> anyhow::Result<Vec<FoodEntry>> {
        let rows = sqlx::query_as::<_, FoodRow>(&format!(
            r#"
            SELECT {FOOD_COLUMNS}
              FROM food_tb
             WHERE user_id = $1
             ORDER BY fooddate_at DESC, created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("select food_tb by owner")?;
        rows.into_iter().map(into_entry).collect()
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<FoodEntry>> {
        let row = sqlx::query_as::<_, FoodRow>(&format!(
            "SELECT {FOOD_COLUMNS} FROM food_tb WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("select food_tb by id")?;
        row.map(into_entry).transpose()
    }

    async fn insert(&self, new: NewFoodEntry) -> anyhow::Result<FoodEntry> {
        let row = sqlx::query_as::<_, FoodRow>(&format!(
            r#"
            INSERT INTO food_tb (user_id, foodname, meal, fooddate_at, food_image_url, food_image_path)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {FOOD_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(&new.foodname)
        .bind(new.meal.as_str())
        .bind(new.fooddate_at)
        .bind(&new.food_image_url)
        .bind(&new.food_image_path)
        .fetch_one(&self.db)
        .await
        .context("insert food_tb row")?;
        into_entry(row)
    }

    async fn update(&self, id: Uuid, changes: FoodChanges) -> anyhow::Result<FoodEntry> {
        let row = sqlx::query_as::<_, FoodRow>(&format!(
            r#"
            UPDATE food_tb
               SET foodname = $2,
                   meal = $3,
                   fooddate_at = $4,
                   food_image_url = $5,
                   food_image_path = $6
             WHERE id = $1
            RETURNING {FOOD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.foodname)
        .bind(changes.meal.as_str())
        .bind(changes.fooddate_at)
        .bind(&changes.food_image_url)
        .bind(&changes.food_image_path)
        .fetch_one(&self.db)
        .await
        .context("update food_tb row")?;
        into_entry(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM food_tb WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete food_tb row")?;
        Ok(())
    }
}
