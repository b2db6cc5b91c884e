use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::PublicUser,
        password::hash_password,
        repo_types::{UserChanges, UserRow},
        services::{is_valid_email, normalize_email, user_write_error},
    },
    error::AppError,
    guard::Flow,
    images::services::{remove_best_effort, upload_image},
    profile::dto::{ProfileForm, ProfileSubmission},
    state::AppState,
    storage::{path_from_public_url, Bucket},
};

async fn current_row(st: &AppState, user: &PublicUser) -> Result<UserRow, AppError> {
    st.users
        .find(user.id)
        .await?
        .ok_or(AppError::NotFound("User"))
}

#[instrument(skip(st, user), fields(user_id = %user.id))]
pub async fn load_profile(st: &AppState, user: &PublicUser) -> Result<ProfileForm, AppError> {
    let row = current_row(st, user).await?;
    ProfileForm::try_from(&row)
}

/// Optional new image first, then the row. A failed update removes the new
/// upload; the previous image is dropped only once the row points elsewhere.
#[instrument(skip(st, user, sub), fields(user_id = %user.id))]
pub async fn update_profile(
    st: &AppState,
    user: &PublicUser,
    sub: ProfileSubmission,
) -> Result<PublicUser, AppError> {
    let email = normalize_email(&sub.email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    let _slot = st.submissions.acquire(Flow::EditProfile, user.id.to_string())?;
    let current = current_row(st, user).await?;

    if email != current.email
        && st
            .users
            .select_by_email(&email)
            .await?
            .iter()
            .any(|row| row.id != current.id)
    {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = sub.password.as_deref().map(hash_password).transpose()?;

    let replacement = match &sub.image {
        Some(image) => Some(
            upload_image(st.storage.as_ref(), Bucket::UserImages, user.id, image)
                .await
                .map_err(|e| {
                    error!(error = %e, "profile image upload failed");
                    AppError::Upload(e)
                })?,
        ),
        None => None,
    };

    let (user_image_url, user_image_path) = match &replacement {
        Some(stored) => (Some(stored.url.clone()), Some(stored.path.clone())),
        None => (current.user_image_url.clone(), current.user_image_path.clone()),
    };
    let changes = UserChanges {
        fullname: sub.fullname,
        email,
        gender: sub.gender.as_str().to_string(),
        user_image_url,
        user_image_path,
        password_hash,
    };

    let updated = match st.users.update(current.id, changes).await {
        Ok(updated) => updated,
        Err(e) => {
            error!(error = %e, "update profile failed");
            if let Some(stored) = &replacement {
                remove_best_effort(st.storage.as_ref(), Bucket::UserImages, &stored.path).await;
            }
            return Err(user_write_error(e));
        }
    };

    if replacement.is_some() {
        let old = current.user_image_path.clone().or_else(|| {
            current
                .user_image_url
                .as_deref()
                .and_then(|url| path_from_public_url(Bucket::UserImages, url))
        });
        if let Some(old) = old {
            remove_best_effort(st.storage.as_ref(), Bucket::UserImages, &old).await;
        }
    }

    info!(
        password_changed = sub.password.is_some(),
        image_replaced = replacement.is_some(),
        "profile updated"
    );
    PublicUser::try_from(updated)
}
