use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::repo_types::UserRow,
    error::AppError,
    forms::FormFields,
    images::services::ImageUpload,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            "Other" => Ok(Gender::Other),
            other => Err(AppError::Validation(format!("Unknown gender: {other}"))),
        }
    }
}

/// The user as the browser sees it, and the record the session keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub gender: Gender,
    pub user_image_url: Option<String>,
}

impl TryFrom<UserRow> for PublicUser {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            gender: row.gender.parse()?,
            id: row.id,
            fullname: row.fullname,
            email: row.email,
            user_image_url: row.user_image_url,
        })
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
    pub redirect: &'static str,
}

/// Multipart body of `POST /register`.
#[derive(Debug)]
pub struct RegisterForm {
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub gender: Gender,
    pub image: Option<ImageUpload>,
}

impl RegisterForm {
    pub fn from_fields(mut fields: FormFields) -> Result<Self, AppError> {
        Ok(Self {
            fullname: fields.required("fullname", "Full name")?,
            email: fields.required("email", "Email")?,
            password: fields
                .secret("password")
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation("Password is required".into()))?,
            gender: fields.text("gender").unwrap_or("Male").parse()?,
            image: fields.take_image("image")?,
        })
    }
}
