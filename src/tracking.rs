use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::courier::GeoPoint;
use crate::models::delivery::DeliveryStatus;
use crate::state::AppState;

/// Live-tracking snapshot for client polling. Read-only assembly from the
/// delivery store and the courier registry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSnapshot {
    pub delivery_id: Uuid,
    pub order_id: Uuid,
    pub status: DeliveryStatus,
    pub courier_id: Uuid,
    pub courier_location: GeoPoint,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub dropoff_address: String,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
}

pub fn live_tracking(state: &AppState, order_id: Uuid) -> Result<TrackingSnapshot, AppError> {
    let delivery = state
        .store
        .get_by_order(order_id)
        .ok_or_else(|| AppError::NotFound(format!("no delivery for order {order_id}")))?;

    let courier_id = delivery
        .courier_id
        .ok_or(AppError::NoCourierAssigned(order_id))?;

    let courier = state
        .registry
        .get(courier_id)
        .ok_or(AppError::CourierLocationUnavailable(courier_id))?;

    Ok(TrackingSnapshot {
        delivery_id: delivery.id,
        order_id: delivery.order_id,
        status: delivery.status,
        courier_id,
        courier_location: courier.location,
        pickup: delivery.pickup,
        dropoff: delivery.dropoff,
        dropoff_address: delivery.dropoff_address,
        estimated_delivery_at: delivery.estimated_delivery_at,
    })
}
