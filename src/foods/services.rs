use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::dto::PublicUser,
    error::AppError,
    foods::{
        dto::FoodSubmission,
        repo_types::{FoodChanges, FoodEntry, NewFoodEntry},
    },
    guard::Flow,
    images::services::{remove_best_effort, upload_image},
    state::AppState,
    storage::{path_from_public_url, Bucket},
};

#[instrument(skip(st))]
pub async fn list_entries(st: &AppState, user_id: Uuid) -> Result<Vec<FoodEntry>, AppError> {
    st.foods.list_by_owner(user_id).await.map_err(|e| {
        error!(error = %e, %user_id, "fetching food entries failed");
        AppError::from(e)
    })
}

/// The entry, provided it belongs to `user_id`.
#[instrument(skip(st))]
pub async fn load_owned(st: &AppState, user_id: Uuid, id: Uuid) -> Result<FoodEntry, AppError> {
    let entry = st
        .foods
        .find(id)
        .await?
        .ok_or(AppError::NotFound("Food entry"))?;
    if entry.user_id != user_id {
        warn!(%user_id, food_id = %id, owner = %entry.user_id, "foreign food entry");
        return Err(AppError::Forbidden("You are not authorized to edit this item."));
    }
    Ok(entry)
}

/// Upload, then insert. A failed insert removes the fresh upload.
#[instrument(skip(st, user, sub), fields(user_id = %user.id))]
pub async fn add_food(
    st: &AppState,
    user: &PublicUser,
    sub: FoodSubmission,
) -> Result<FoodEntry, AppError> {
    let Some(image) = sub.image else {
        return Err(AppError::Validation("Please choose an image".into()));
    };
    let _slot = st.submissions.acquire(Flow::AddFood, user.id.to_string())?;

    let stored = upload_image(st.storage.as_ref(), Bucket::FoodImages, user.id, &image)
        .await
        .map_err(|e| {
            error!(error = %e, "food image upload failed");
            AppError::Upload(e)
        })?;

    let new = NewFoodEntry {
        user_id: user.id,
        foodname: sub.foodname,
        meal: sub.meal,
        fooddate_at: sub.fooddate_at,
        food_image_url: stored.url.clone(),
        food_image_path: Some(stored.path.clone()),
    };
    match st.foods.insert(new).await {
        Ok(entry) => {
            info!(food_id = %entry.id, "food entry added");
            Ok(entry)
        }
        Err(e) => {
            error!(error = %e, "insert food entry failed");
            remove_best_effort(st.storage.as_ref(), Bucket::FoodImages, &stored.path).await;
            Err(e.into())
        }
    }
}

/// With a new image: upload it, update the row, then drop the previous object.
/// A failed update removes the new upload and leaves the old one in place.
#[instrument(skip(st, user, sub), fields(user_id = %user.id))]
pub async fn update_food(
    st: &AppState,
    user: &PublicUser,
    id: Uuid,
    sub: FoodSubmission,
) -> Result<FoodEntry, AppError> {
    let current = load_owned(st, user.id, id).await?;
    let _slot = st.submissions.acquire(Flow::EditFood, entry_subject(user.id, id))?;

    let replacement = match &sub.image {
        Some(image) => Some(
            upload_image(st.storage.as_ref(), Bucket::FoodImages, user.id, image)
                .await
                .map_err(|e| {
                    error!(error = %e, food_id = %id, "food image upload failed");
                    AppError::Upload(e)
                })?,
        ),
        None => None,
    };

    let changes = FoodChanges {
        foodname: sub.foodname,
        meal: sub.meal,
        fooddate_at: sub.fooddate_at,
        food_image_url: replacement
            .as_ref()
            .map(|s| s.url.clone())
            .unwrap_or_else(|| current.food_image_url.clone()),
        food_image_path: match &replacement {
            Some(stored) => Some(stored.path.clone()),
            None => current.food_image_path.clone(),
        },
    };

    let updated = match st.foods.update(id, changes).await {
        Ok(updated) => updated,
        Err(e) => {
            error!(error = %e, food_id = %id, "update food entry failed");
            if let Some(stored) = &replacement {
                remove_best_effort(st.storage.as_ref(), Bucket::FoodImages, &stored.path).await;
            }
            return Err(e.into());
        }
    };

    if replacement.is_some() {
        if let Some(old) = stored_image_path(&current) {
            remove_best_effort(st.storage.as_ref(), Bucket::FoodImages, &old).await;
        }
    }
    info!(food_id = %id, image_replaced = replacement.is_some(), "food entry updated");
    Ok(updated)
}

/// Deletes the row, then its image. Image removal is best-effort.
#[instrument(skip(st, user), fields(user_id = %user.id))]
pub async fn delete_food(st: &AppState, user: &PublicUser, id: Uuid) -> Result<FoodEntry, AppError> {
    let entry = load_owned(st, user.id, id).await?;
    let _slot = st.submissions.acquire(Flow::DeleteFood, entry_subject(user.id, id))?;

    st.foods.delete(id).await.map_err(|e| {
        error!(error = %e, food_id = %id, "delete food entry failed");
        AppError::from(e)
    })?;

    match stored_image_path(&entry) {
        Some(path) => remove_best_effort(st.storage.as_ref(), Bucket::FoodImages, &path).await,
        None => warn!(food_id = %id, url = %entry.food_image_url, "no storage path for image"),
    }
    info!(food_id = %id, "food entry deleted");
    Ok(entry)
}

/// Edits and deletes are single-flight per entry, not per user.
fn entry_subject(user_id: Uuid, food_id: Uuid) -> String {
    format!("{user_id}:{food_id}")
}

fn stored_image_path(entry: &FoodEntry) -> Option<String> {
    entry
        .food_image_path
        .clone()
        .or_else(|| path_from_public_url(Bucket::FoodImages, &entry.food_image_url))
}
