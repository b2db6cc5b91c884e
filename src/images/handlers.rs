use axum::{extract::Multipart, routing::post, Json, Router};
use serde::Serialize;
use tracing::instrument;

use super::services::preview_data_url;
use crate::{error::AppError, forms::FormFields, state::AppState};

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub file_name: String,
    pub preview: String,
}

pub fn preview_routes() -> Router<AppState> {
    Router::new().route("/preview", post(preview))
}

/// POST /preview (multipart `image`), answers with a `data:` URL for the picked file.
/// Nothing is stored; dropping the preview is purely a client concern.
#[instrument(skip(mp))]
pub async fn preview(mp: Multipart) -> Result<Json<PreviewResponse>, AppError> {
    let mut fields = FormFields::read(mp).await?;
    let upload = fields
        .take_image("image")?
        .ok_or_else(|| AppError::Validation("Please choose an image".into()))?;
    Ok(Json(PreviewResponse {
        preview: preview_data_url(&upload),
        file_name: upload.file_name,
    }))
}
