use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::delivery::{DeliveryRequest, DeliveryStatus};
use crate::models::drone::Drone;
use crate::models::location::Location;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/deliveries", post(create_delivery))
        .route("/deliveries/active", get(get_active))
        .route("/deliveries/history", get(get_history))
        .route("/deliveries/confirm-pickup", post(confirm_pickup))
        .route("/deliveries/status", post(transition_status))
        .route("/drone", get(get_drone))
}

#[derive(Deserialize)]
pub struct CreateDeliveryRequest {
    pub pickup: Location,
    pub delivery: Location,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: DeliveryStatus,
}

async fn create_delivery(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDeliveryRequest>,
) -> Result<Json<DeliveryRequest>, AppError> {
    let request = state
        .store
        .create_delivery(payload.pickup, payload.delivery)
        .await?;
    Ok(Json(request))
}

async fn get_active(State(state): State<Arc<AppState>>) -> Json<Option<DeliveryRequest>> {
    Json(state.store.active_delivery())
}

async fn get_history(State(state): State<Arc<AppState>>) -> Json<Vec<DeliveryRequest>> {
    Json(state.store.history())
}

async fn confirm_pickup(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeliveryRequest>, AppError> {
    state
        .store
        .confirm_pickup()
        .map(Json)
        .map_err(|err| count_rejection(&state, err))
}

async fn transition_status(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<DeliveryRequest>, AppError> {
    state
        .store
        .transition_status(payload.status)
        .map(Json)
        .map_err(|err| count_rejection(&state, err))
}

async fn get_drone(State(state): State<Arc<AppState>>) -> Json<Drone> {
    Json(state.store.drone())
}

fn count_rejection(state: &AppState, err: AppError) -> AppError {
    if matches!(err, AppError::InvalidTransition { .. }) {
        state.metrics.transitions_rejected_total.inc();
    }
    err
}
