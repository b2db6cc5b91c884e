use serde::Serialize;
use sqlx::FromRow;
use time::Date;
use uuid::Uuid;

use crate::{error::AppError, foods::dto::MealType, forms::iso_date};

/// Row of `food_tb`.
#[derive(Debug, Clone, FromRow)]
pub struct FoodRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub foodname: String,
    pub meal: String,
    pub fooddate_at: Date,
    pub food_image_url: String,
    pub food_image_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub foodname: String,
    pub meal: MealType,
    #[serde(with = "iso_date")]
    pub fooddate_at: Date,
    pub food_image_url: String,
    /// Object path in `food_bk`; `None` for rows written before paths were stored.
    #[serde(skip_serializing)]
    pub food_image_path: Option<String>,
}

impl TryFrom<FoodRow> for FoodEntry {
    type Error = AppError;

    fn try_from(row: FoodRow) -> Result<Self, Self::Error> {
        Ok(Self {
            meal: row.meal.parse()?,
            id: row.id,
            user_id: row.user_id,
            foodname: row.foodname,
            fooddate_at: row.fooddate_at,
            food_image_url: row.food_image_url,
            food_image_path: row.food_image_path,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewFoodEntry {
    pub user_id: Uuid,
    pub foodname: String,
    pub meal: MealType,
    pub fooddate_at: Date,
    pub food_image_url: String,
    pub food_image_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FoodChanges {
    pub foodname: String,
    pub meal: MealType,
    pub fooddate_at: Date,
    pub food_image_url: String,
    pub food_image_path: Option<String>,
}
