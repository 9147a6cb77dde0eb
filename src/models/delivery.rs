use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::courier::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Pending,
    Assigned,
    OutForDelivery,
    Delivered,
    FailedToAssign,
}

impl DeliveryStatus {
    /// Whether a courier-facing status update may move a delivery from
    /// `self` to `to`. `Pending -> Assigned` belongs to the matcher and
    /// `Pending -> FailedToAssign` to the retry scheduler, so neither is
    /// reachable through this check.
    pub fn can_courier_advance(self, to: DeliveryStatus) -> bool {
        matches!(
            (self, to),
            (DeliveryStatus::Assigned, DeliveryStatus::OutForDelivery)
                | (DeliveryStatus::OutForDelivery, DeliveryStatus::Delivered)
        )
    }

}

/// One delivery per order. Pickup and dropoff coordinates are captured at
/// creation time and never re-fetched from the upstream services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: Uuid,
    pub order_id: Uuid,
    pub courier_id: Option<Uuid>,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub dropoff_address: String,
    pub status: DeliveryStatus,
    pub retry_count: u32,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    pub fn new_pending(
        order_id: Uuid,
        pickup: GeoPoint,
        dropoff: GeoPoint,
        dropoff_address: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id,
            courier_id: None,
            pickup,
            dropoff,
            dropoff_address,
            status: DeliveryStatus::Pending,
            retry_count: 0,
            estimated_delivery_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Invariant check: a courier is attached iff the delivery has been
    /// assigned at some point and did not fail.
    pub fn courier_link_consistent(&self) -> bool {
        let expects_courier = matches!(
            self.status,
            DeliveryStatus::Assigned | DeliveryStatus::OutForDelivery | DeliveryStatus::Delivered
        );
        self.courier_id.is_some() == expects_courier
    }
}
