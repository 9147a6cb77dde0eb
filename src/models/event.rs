use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::delivery::{Delivery, DeliveryStatus};

/// Broadcast on every lifecycle transition (Assigned, OutForDelivery,
/// Delivered, FailedToAssign); streamed to websocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEvent {
    pub delivery_id: Uuid,
    pub order_id: Uuid,
    pub courier_id: Option<Uuid>,
    pub status: DeliveryStatus,
    pub occurred_at: DateTime<Utc>,
}

impl From<&Delivery> for DeliveryEvent {
    fn from(delivery: &Delivery) -> Self {
        Self {
            delivery_id: delivery.id,
            order_id: delivery.order_id,
            courier_id: delivery.courier_id,
            status: delivery.status,
            occurred_at: delivery.updated_at,
        }
    }
}
