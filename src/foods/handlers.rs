use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{delete, get},
    Json, Router,
};
use serde_json::json;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::AppError,
    foods::{
        dto::{DashboardQuery, DashboardView, DeletedResponse, EditFoodView, FoodForm, FoodSubmission},
        listing::Listing,
        repo_types::FoodEntry,
        services,
    },
    forms::FormFields,
    response::Navigate,
    session::Session,
    state::AppState,
};

pub fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/dashboard/:id", delete(delete_food))
        .route("/addfood", get(add_food_form).post(add_food))
        .route(
            "/updatefood/:id",
            get(edit_food_form).post(update_food).put(update_food),
        )
}

fn listing_for(entries: Vec<FoodEntry>, q: DashboardQuery) -> Listing {
    let mut listing = Listing::new(entries);
    if let Some(term) = q.search {
        listing.search(term);
    }
    if let Some(page) = q.page {
        listing.set_page(page);
    }
    listing
}

/// GET /dashboard?search=&page=
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    Session(user): Session,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<DashboardView>, AppError> {
    let listing = listing_for(services::list_entries(&state, user.id).await?, q);
    let page = listing.view();
    info!(total = page.total, page = page.page, "dashboard loaded");
    Ok(Json(DashboardView { user, page }))
}

/// DELETE /dashboard/:id?search=&page=
/// Answers with the dashboard page as it stands after the delete.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_food(
    State(state): State<AppState>,
    Session(user): Session,
    Path(id): Path<Uuid>,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<DeletedResponse>, AppError> {
    let mut listing = listing_for(services::list_entries(&state, user.id).await?, q);
    let entry = services::delete_food(&state, &user, id).await?;
    listing.remove(entry.id);
    Ok(Json(DeletedResponse {
        deleted: entry.id,
        message: "Food entry deleted",
        page: listing.view(),
    }))
}

/// GET /addfood: an empty form dated today (UTC).
pub async fn add_food_form(Session(_user): Session) -> Json<FoodForm> {
    Json(FoodForm::blank(OffsetDateTime::now_utc().date()))
}

/// POST /addfood (multipart: foodname, meal, fooddate_at, image)
#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn add_food(
    State(state): State<AppState>,
    Session(user): Session,
    mp: Multipart,
) -> Result<Navigate, AppError> {
    let sub = FoodSubmission::from_fields(FormFields::read(mp).await?)?;
    let entry = services::add_food(&state, &user, sub).await?;
    Ok(Navigate {
        to: "/dashboard",
        cookie: None,
        body: json!({ "redirect": "/dashboard", "food": entry }),
    })
}

/// GET /updatefood/:id: the stored values, also what Cancel restores.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn edit_food_form(
    State(state): State<AppState>,
    Session(user): Session,
    Path(id): Path<Uuid>,
) -> Result<Json<EditFoodView>, AppError> {
    let entry = services::load_owned(&state, user.id, id).await?;
    Ok(Json(EditFoodView {
        id: entry.id,
        form: FoodForm::from(&entry),
    }))
}

/// POST|PUT /updatefood/:id (multipart, image optional)
#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn update_food(
    State(state): State<AppState>,
    Session(user): Session,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> Result<Navigate, AppError> {
    let sub = FoodSubmission::from_fields(FormFields::read(mp).await?)?;
    let entry = services::update_food(&state, &user, id, sub).await?;
    Ok(Navigate {
        to: "/dashboard",
        cookie: None,
        body: json!({ "redirect": "/dashboard", "food": entry }),
    })
}
