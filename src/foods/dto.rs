use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::{
    auth::dto::PublicUser,
    error::AppError,
    foods::repo_types::FoodEntry,
    forms::{iso_date, parse_date, FormFields},
    images::services::ImageUpload,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MealType {
    #[default]
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Breakfast" => Ok(MealType::Breakfast),
            "Lunch" => Ok(MealType::Lunch),
            "Dinner" => Ok(MealType::Dinner),
            "Snack" => Ok(MealType::Snack),
            other => Err(AppError::Validation(format!("Unknown meal type: {other}"))),
        }
    }
}

/// State of the add/edit food form. `GET` answers with it, and Cancel returns to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodForm {
    pub foodname: String,
    pub meal: MealType,
    #[serde(with = "iso_date")]
    pub fooddate_at: Date,
    pub food_image_url: Option<String>,
}

impl FoodForm {
    pub fn blank(today: Date) -> Self {
        Self {
            foodname: String::new(),
            meal: MealType::default(),
            fooddate_at: today,
            food_image_url: None,
        }
    }
}

impl From<&FoodEntry> for FoodForm {
    fn from(entry: &FoodEntry) -> Self {
        Self {
            foodname: entry.foodname.clone(),
            meal: entry.meal,
            fooddate_at: entry.fooddate_at,
            food_image_url: Some(entry.food_image_url.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EditFoodView {
    pub id: Uuid,
    pub form: FoodForm,
}

/// Multipart body of `POST /addfood` and `POST /updatefood/:id`.
#[derive(Debug)]
pub struct FoodSubmission {
    pub foodname: String,
    pub meal: MealType,
    pub fooddate_at: Date,
    pub image: Option<ImageUpload>,
}

impl FoodSubmission {
    pub fn from_fields(mut fields: FormFields) -> Result<Self, AppError> {
        let foodname = fields.required("foodname", "Food name")?;
        let meal = match fields.text("meal") {
            Some(raw) => raw.parse()?,
            None => MealType::default(),
        };
        let fooddate_at = parse_date(&fields.required("fooddate_at", "Date")?)?;
        Ok(Self {
            foodname,
            meal,
            fooddate_at,
            image: fields.take_image("image")?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub search: Option<String>,
    pub page: Option<usize>,
}

/// One page of the dashboard table.
#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub search: String,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub showing_from: usize,
    pub showing_to: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub items: Vec<FoodEntry>,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub user: PublicUser,
    #[serde(flatten)]
    pub page: DashboardPage,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: Uuid,
    pub message: &'static str,
    #[serde(flatten)]
    pub page: DashboardPage,
}
