use axum::{
    extract::{FromRef, Multipart, State},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::{error, instrument};

use crate::{
    error::AppError,
    forms::FormFields,
    profile::{
        dto::{ProfileForm, ProfileSubmission},
        services,
    },
    response::Navigate,
    session::{Session, SessionHolder},
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(profile_form).post(update_profile))
}

/// GET /profile
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn profile_form(
    State(state): State<AppState>,
    Session(user): Session,
) -> Result<Json<ProfileForm>, AppError> {
    Ok(Json(services::load_profile(&state, &user).await?))
}

/// POST /profile (multipart: fullname, email, password?, gender, image?)
#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    Session(user): Session,
    mp: Multipart,
) -> Result<Navigate, AppError> {
    let sub = ProfileSubmission::from_fields(FormFields::read(mp).await?)?;
    let updated = services::update_profile(&state, &user, sub).await?;
    let saved = SessionHolder::from_ref(&state).save(&updated).map_err(|e| {
        error!(error = %e, "session save failed");
        AppError::from(e)
    })?;
    Ok(Navigate {
        to: "/dashboard",
        cookie: Some(saved.set_cookie),
        body: json!({ "redirect": "/dashboard", "user": updated }),
    })
}
