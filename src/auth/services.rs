use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterForm},
        password::{hash_password, verify_password},
        repo::EmailTaken,
        repo_types::{NewUser, UserChanges, UserRow},
    },
    error::AppError,
    guard::Flow,
    images::services::{remove_best_effort, upload_image},
    state::AppState,
    storage::Bucket,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Inserts the row first so the profile image path can be scoped by the new
/// id, then uploads and links the image. A failure after the insert removes
/// whatever was created.
#[instrument(skip(st, form), fields(email = %form.email))]
pub async fn register(st: &AppState, mut form: RegisterForm) -> Result<PublicUser, AppError> {
    form.email = normalize_email(&form.email);
    if !is_valid_email(&form.email) {
        warn!("invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    let _slot = st.submissions.acquire(Flow::Register, form.email.as_str())?;

    if !st.users.select_by_email(&form.email).await?.is_empty() {
        warn!("email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&form.password)?;
    let row = st
        .users
        .insert(NewUser {
            fullname: form.fullname.trim().to_string(),
            email: form.email.clone(),
            password_hash,
            gender: form.gender.as_str().to_string(),
        })
        .await
        .map_err(|e| {
            error!(error = %e, "insert user failed");
            user_write_error(e)
        })?;

    let Some(image) = form.image else {
        info!(user_id = %row.id, "user registered");
        return PublicUser::try_from(row);
    };

    let stored = match upload_image(st.storage.as_ref(), Bucket::UserImages, row.id, &image).await
    {
        Ok(stored) => stored,
        Err(e) => {
            error!(error = %e, user_id = %row.id, "profile image upload failed");
            discard_user(st, row.id).await;
            return Err(AppError::Upload(e));
        }
    };

    let changes = UserChanges {
        fullname: row.fullname.clone(),
        email: row.email.clone(),
        gender: row.gender.clone(),
        user_image_url: Some(stored.url.clone()),
        user_image_path: Some(stored.path.clone()),
        password_hash: None,
    };
    let updated = match st.users.update(row.id, changes).await {
        Ok(updated) => updated,
        Err(e) => {
            error!(error = %e, user_id = %row.id, "linking profile image failed");
            remove_best_effort(st.storage.as_ref(), Bucket::UserImages, &stored.path).await;
            discard_user(st, row.id).await;
            return Err(e.into());
        }
    };

    info!(user_id = %updated.id, "user registered");
    PublicUser::try_from(updated)
}

/// Lost races on the email constraint surface as the same 409 as the pre-check.
pub(crate) fn user_write_error(e: anyhow::Error) -> AppError {
    if e.is::<EmailTaken>() {
        AppError::Conflict("Email already registered".into())
    } else {
        AppError::from(e)
    }
}

async fn discard_user(st: &AppState, id: Uuid) {
    if let Err(e) = st.users.delete(id).await {
        warn!(error = %e, user_id = %id, "failed to roll back user row");
    }
}

/// Exactly one row must match both email and password.
#[instrument(skip(st, req))]
pub async fn login(st: &AppState, req: LoginRequest) -> Result<PublicUser, AppError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }
    let _slot = st.submissions.acquire(Flow::Login, email.as_str())?;

    let rows = st.users.select_by_email(&email).await.map_err(|e| {
        error!(error = %e, "select_by_email failed");
        AppError::from(e)
    })?;

    let mut matching: Vec<UserRow> = rows
        .into_iter()
        .filter(|row| {
            verify_password(&req.password, &row.password).unwrap_or_else(|e| {
                warn!(error = %e, user_id = %row.id, "stored password hash unreadable");
                false
            })
        })
        .collect();

    if matching.len() != 1 {
        warn!(%email, matches = matching.len(), "login rejected");
        return Err(AppError::InvalidCredentials);
    }
    let user = matching.remove(0);
    info!(user_id = %user.id, "user logged in");
    PublicUser::try_from(user)
}
