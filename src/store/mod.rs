use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::courier::GeoPoint;
use crate::models::delivery::{Delivery, DeliveryStatus};

/// Outcome of the assignment write. `NotPending` means the record was
/// concurrently advanced between candidate selection and the write; the
/// caller releases its courier claim and treats the match as a no-op.
pub enum AssignOutcome {
    Assigned(Delivery),
    NotPending,
}

/// Outcome of recording one failed match attempt during a retry pass.
pub enum RetryOutcome {
    /// Counter incremented; the delivery stays `Pending` for the next pass.
    Scheduled(u32),
    /// Counter reached the maximum; the delivery went terminal.
    FailedToAssign(Delivery),
    /// The delivery was no longer `Pending`; nothing changed.
    Skipped,
}

/// In-memory delivery record store: id-keyed records plus an order-id index
/// enforcing one delivery per order. Mutations run under the entry guard, so
/// lifecycle writes on a single delivery are serialized.
pub struct DeliveryStore {
    deliveries: DashMap<Uuid, Delivery>,
    by_order: DashMap<Uuid, Uuid>,
}

impl DeliveryStore {
    pub fn new() -> Self {
        Self {
            deliveries: DashMap::new(),
            by_order: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|entry| entry.value().status == DeliveryStatus::Pending)
            .count()
    }

    pub fn insert_pending(
        &self,
        order_id: Uuid,
        pickup: GeoPoint,
        dropoff: GeoPoint,
        dropoff_address: String,
    ) -> Result<Delivery, AppError> {
        // The order index entry is reserved first so a concurrent create for
        // the same order loses before any record exists.
        match self.by_order.entry(order_id) {
            Entry::Occupied(_) => Err(AppError::DuplicateOrder(order_id)),
            Entry::Vacant(slot) => {
                let delivery = Delivery::new_pending(order_id, pickup, dropoff, dropoff_address);
                slot.insert(delivery.id);
                self.deliveries.insert(delivery.id, delivery.clone());
                Ok(delivery)
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Delivery> {
        self.deliveries.get(&id).map(|entry| entry.value().clone())
    }

    pub fn get_by_order(&self, order_id: Uuid) -> Option<Delivery> {
        let delivery_id = *self.by_order.get(&order_id)?;
        self.get(delivery_id)
    }

    pub fn list_for_courier(&self, courier_id: Uuid) -> Vec<Delivery> {
        self.deliveries
            .iter()
            .filter_map(|entry| {
                let delivery = entry.value();
                if delivery.courier_id == Some(courier_id) {
                    Some(delivery.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Attaches a courier to a `Pending` delivery. The status check happens
    /// under the entry lock, after the registry claim has already succeeded.
    pub fn assign(
        &self,
        delivery_id: Uuid,
        courier_id: Uuid,
        estimated_delivery_at: DateTime<Utc>,
    ) -> AssignOutcome {
        let Some(mut delivery) = self.deliveries.get_mut(&delivery_id) else {
            return AssignOutcome::NotPending;
        };

        if delivery.status != DeliveryStatus::Pending {
            return AssignOutcome::NotPending;
        }

        delivery.status = DeliveryStatus::Assigned;
        delivery.courier_id = Some(courier_id);
        delivery.estimated_delivery_at = Some(estimated_delivery_at);
        delivery.updated_at = Utc::now();

        AssignOutcome::Assigned(delivery.clone())
    }

    /// Courier-facing lifecycle advancement. Only the forward transitions
    /// `Assigned -> OutForDelivery -> Delivered` are permitted.
    pub fn advance_status(&self, id: Uuid, to: DeliveryStatus) -> Result<Delivery, AppError> {
        let mut delivery = self
            .deliveries
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("delivery {id} not found")))?;

        if !delivery.status.can_courier_advance(to) {
            return Err(AppError::InvalidTransition {
                from: delivery.status,
                to,
            });
        }

        delivery.status = to;
        delivery.updated_at = Utc::now();
        if to == DeliveryStatus::Delivered {
            delivery.delivered_at = Some(delivery.updated_at);
        }

        Ok(delivery.clone())
    }

    /// Records a failed match attempt. Deliveries that already left
    /// `Pending` are skipped, which makes the retry pass idempotent.
    pub fn record_failed_attempt(&self, id: Uuid, max_retries: u32) -> RetryOutcome {
        let Some(mut delivery) = self.deliveries.get_mut(&id) else {
            return RetryOutcome::Skipped;
        };

        if delivery.status != DeliveryStatus::Pending {
            return RetryOutcome::Skipped;
        }

        delivery.retry_count += 1;
        delivery.updated_at = Utc::now();

        if delivery.retry_count >= max_retries {
            delivery.status = DeliveryStatus::FailedToAssign;
            RetryOutcome::FailedToAssign(delivery.clone())
        } else {
            RetryOutcome::Scheduled(delivery.retry_count)
        }
    }

    /// Pending deliveries old enough to be retried.
    pub fn pending_ready_for_retry(&self, min_age: Duration) -> Vec<Delivery> {
        let cutoff = Utc::now() - min_age;
        self.deliveries
            .iter()
            .filter_map(|entry| {
                let delivery = entry.value();
                if delivery.status == DeliveryStatus::Pending && delivery.created_at <= cutoff {
                    Some(delivery.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Deletes deliveries still `Pending` past `ttl`, along with their order
    /// index entries. The status is re-checked under the entry lock so a
    /// concurrently assigned delivery survives.
    pub fn remove_expired_pending(&self, ttl: Duration) -> usize {
        let cutoff = Utc::now() - ttl;
        let expired: Vec<(Uuid, Uuid)> = self
            .deliveries
            .iter()
            .filter_map(|entry| {
                let delivery = entry.value();
                if delivery.status == DeliveryStatus::Pending && delivery.created_at <= cutoff {
                    Some((delivery.id, delivery.order_id))
                } else {
                    None
                }
            })
            .collect();

        let mut removed = 0;
        for (delivery_id, order_id) in expired {
            let gone = self
                .deliveries
                .remove_if(&delivery_id, |_, delivery| {
                    delivery.status == DeliveryStatus::Pending
                })
                .is_some();
            if gone {
                self.by_order.remove(&order_id);
                removed += 1;
            }
        }

        removed
    }
}

impl Default for DeliveryStore {
    fn default() -> Self {
        Self::new()
    }
}
