use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::orchestrator::{advance_delivery, create_delivery};
use crate::error::AppError;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::state::AppState;
use crate::tracking::{live_tracking, TrackingSnapshot};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/deliveries", post(create).get(list_for_driver))
        .route("/deliveries/live-tracking/:order_id", get(tracking))
        .route("/deliveries/:id", get(get_delivery))
        .route("/deliveries/:id/status", put(update_status))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeliveryRequest {
    pub order_id: Option<Uuid>,
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDeliveryRequest>,
) -> Result<(StatusCode, Json<Delivery>), AppError> {
    let order_id = payload
        .order_id
        .ok_or_else(|| AppError::BadRequest("orderId is required".to_string()))?;
    let delivery = create_delivery(&state, order_id).await?;
    Ok((StatusCode::CREATED, Json(delivery)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDeliveriesQuery {
    pub driver_id: Option<Uuid>,
}

async fn list_for_driver(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListDeliveriesQuery>,
) -> Result<Json<Vec<Delivery>>, AppError> {
    let driver_id = query
        .driver_id
        .ok_or_else(|| AppError::BadRequest("driverId query parameter is required".to_string()))?;

    Ok(Json(state.store.list_for_courier(driver_id)))
}

async fn get_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Delivery>, AppError> {
    let delivery = state
        .store
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("delivery {id} not found")))?;

    Ok(Json(delivery))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: DeliveryStatus,
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Delivery>, AppError> {
    let delivery = advance_delivery(&state, id, payload.status)?;
    Ok(Json(delivery))
}

async fn tracking(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<TrackingSnapshot>, AppError> {
    let snapshot = live_tracking(&state, order_id)?;
    Ok(Json(snapshot))
}
