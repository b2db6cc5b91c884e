use axum::{
    extract::{FromRef, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterForm},
        services,
    },
    error::AppError,
    forms::FormFields,
    response::Navigate,
    session::{Session, SessionHolder},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub title: &'static str,
    pub tagline: &'static str,
    pub register: &'static str,
    pub login: &'static str,
}

pub async fn home() -> Json<HomeView> {
    Json(HomeView {
        title: "Welcome to Food Tracker",
        tagline: "Track your meal!!!",
        register: "/register",
        login: "/login",
    })
}

/// POST /register (multipart: fullname, email, password, gender, image?)
#[instrument(skip(state, mp))]
pub async fn register(
    State(state): State<AppState>,
    mp: Multipart,
) -> Result<Navigate, AppError> {
    let form = RegisterForm::from_fields(FormFields::read(mp).await?)?;
    let user = services::register(&state, form).await?;
    Ok(Navigate {
        to: "/login",
        cookie: None,
        body: json!({ "redirect": "/login", "user": user }),
    })
}

/// POST /login { email, password }
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Navigate<AuthResponse>, AppError> {
    let user = services::login(&state, payload).await?;
    let holder = SessionHolder::from_ref(&state);
    let saved = holder.save(&user).map_err(|e| {
        error!(error = %e, "session save failed");
        AppError::from(e)
    })?;

    Ok(Navigate {
        to: "/dashboard",
        cookie: Some(saved.set_cookie),
        body: AuthResponse {
            token: saved.token,
            user,
            redirect: "/dashboard",
        },
    })
}

#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Option<Session>) -> Navigate {
    if let Some(Session(user)) = session {
        info!(user_id = %user.id, "user logged out");
    }
    Navigate::to("/login").with_cookie(SessionHolder::from_ref(&state).clear())
}
