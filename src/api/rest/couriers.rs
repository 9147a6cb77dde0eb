use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::courier::{Courier, GeoPoint};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/deliveries/drivers/register", post(register_driver))
        .route("/deliveries/drivers/available", get(list_available))
        .route(
            "/deliveries/drivers/:user_id/location",
            put(update_location),
        )
        .route(
            "/deliveries/drivers/:user_id/availability",
            put(update_availability),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDriverRequest {
    pub user_id: Uuid,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
pub struct LocationRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

fn validated_point(lat: f64, lng: f64) -> Result<GeoPoint, AppError> {
    let point = GeoPoint { lat, lng };
    if !point.is_valid() {
        return Err(AppError::BadRequest(format!(
            "invalid coordinates: ({lat}, {lng})"
        )));
    }
    Ok(point)
}

async fn register_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterDriverRequest>,
) -> Result<(StatusCode, Json<Courier>), AppError> {
    let location = validated_point(payload.lat, payload.lng)?;
    let courier = state.registry.register(payload.user_id, location)?;
    Ok((StatusCode::CREATED, Json(courier)))
}

async fn list_available(State(state): State<Arc<AppState>>) -> Json<Vec<Courier>> {
    Json(state.registry.list_available(1))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<LocationRequest>,
) -> Result<Json<Courier>, AppError> {
    let location = validated_point(payload.lat, payload.lng)?;
    let courier = state.registry.update_location(user_id, location)?;
    Ok(Json(courier))
}

async fn update_availability(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AvailabilityRequest>,
) -> Result<Json<Courier>, AppError> {
    let courier = state
        .registry
        .set_availability(user_id, payload.is_available)?;
    Ok(Json(courier))
}
