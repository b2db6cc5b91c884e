use serde::Serialize;

use crate::{
    auth::{dto::Gender, repo_types::UserRow},
    error::AppError,
    forms::FormFields,
    images::services::ImageUpload,
};

/// Profile form as first shown. The password field always starts empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileForm {
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub gender: Gender,
    pub user_image_url: Option<String>,
}

impl TryFrom<&UserRow> for ProfileForm {
    type Error = AppError;

    fn try_from(row: &UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            fullname: row.fullname.clone(),
            email: row.email.clone(),
            password: String::new(),
            gender: row.gender.parse()?,
            user_image_url: row.user_image_url.clone(),
        })
    }
}

/// Multipart body of `POST /profile`.
#[derive(Debug)]
pub struct ProfileSubmission {
    pub fullname: String,
    pub email: String,
    /// `None` keeps the current password.
    pub password: Option<String>,
    pub gender: Gender,
    pub image: Option<ImageUpload>,
}

impl ProfileSubmission {
    pub fn from_fields(mut fields: FormFields) -> Result<Self, AppError> {
        Ok(Self {
            fullname: fields.required("fullname", "Full name")?,
            email: fields.required("email", "Email")?,
            password: fields.secret("password").map(str::to_string),
            gender: fields.text("gender").unwrap_or("Male").parse()?,
            image: fields.take_image("image")?,
        })
    }
}
