use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::location::Location;
use crate::models::user::{ProfileUpdate, User};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/profile", get(get_profile).patch(update_profile))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub home_address: Location,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .authenticate(&payload.email, &payload.password)
        .await?;
    Ok(Json(user))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .register(
            &payload.name,
            &payload.email,
            &payload.password,
            &payload.confirm_password,
            payload.home_address,
        )
        .await?;
    Ok(Json(user))
}

async fn logout(State(state): State<Arc<AppState>>) -> StatusCode {
    state.store.logout();
    StatusCode::NO_CONTENT
}

async fn get_profile(State(state): State<Arc<AppState>>) -> Result<Json<User>, AppError> {
    let user = state.store.current_user().ok_or(AppError::NotAuthenticated)?;
    Ok(Json(user))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let user = state.store.update_profile(payload)?;
    Ok(Json(user))
}
