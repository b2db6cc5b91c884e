//! Multipart form submissions shared by the register, food and profile flows.

use std::collections::HashMap;

use axum::extract::Multipart;
use time::{format_description::FormatItem, macros::format_description, Date};

use crate::{
    error::AppError,
    images::services::{is_image, ImageUpload},
};

#[derive(Debug, Default)]
pub struct FormFields {
    text: HashMap<String, String>,
    files: HashMap<String, ImageUpload>,
}

impl FormFields {
    pub async fn read(mut mp: Multipart) -> Result<Self, AppError> {
        let mut fields = FormFields::default();
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| AppError::MalformedPayload(e.to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .map(str::to_string)
                        .unwrap_or_else(|| "application/octet-stream".into());
                    let body = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::MalformedPayload(e.to_string()))?;
                    // Browsers send an empty part when no file was picked.
                    if file_name.is_empty() && body.is_empty() {
                        continue;
                    }
                    fields.insert_file(
                        name,
                        ImageUpload {
                            file_name,
                            content_type,
                            body,
                        },
                    );
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::MalformedPayload(e.to_string()))?;
                    fields.insert_text(name, value);
                }
            }
        }
        Ok(fields)
    }

    pub fn insert_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.text.insert(name.into(), value.into());
    }

    pub fn insert_file(&mut self, name: impl Into<String>, upload: ImageUpload) {
        self.files.insert(name.into(), upload);
    }

    /// Trimmed value, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.text
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Untrimmed value for passwords, `None` when absent or empty.
    pub fn secret(&self, name: &str) -> Option<&str> {
        self.text
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, name: &str, label: &str) -> Result<String, AppError> {
        self.text(name)
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation(format!("{label} is required")))
    }

    pub fn take_image(&mut self, name: &str) -> Result<Option<ImageUpload>, AppError> {
        match self.files.remove(name) {
            Some(upload) if !is_image(&upload.content_type) => Err(AppError::Validation(format!(
                "{} is not an image ({})",
                upload.file_name, upload.content_type
            ))),
            other => Ok(other),
        }
    }
}

const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw.trim(), ISO_DATE)
        .map_err(|_| AppError::Validation(format!("Invalid date: {raw}")))
}

/// `YYYY-MM-DD` on the wire, the value an `<input type="date">` carries.
pub mod iso_date {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        let text = date
            .format(super::ISO_DATE)
            .map_err(serde::ser::Error::custom)?;
        s.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let text = String::deserialize(d)?;
        Date::parse(&text, super::ISO_DATE).map_err(D::Error::custom)
    }
}
