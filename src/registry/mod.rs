use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::courier::{Courier, GeoPoint};

/// In-memory courier registry. All read-modify-write mutations go through a
/// `get_mut` entry guard, which serializes them per courier and makes
/// [`try_claim`](CourierRegistry::try_claim) a true check-and-increment.
pub struct CourierRegistry {
    couriers: DashMap<Uuid, Courier>,
    capacity: u8,
}

impl CourierRegistry {
    pub fn new(capacity: u8) -> Self {
        Self {
            couriers: DashMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> u8 {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.couriers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.couriers.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<Courier> {
        self.couriers.get(&id).map(|entry| entry.value().clone())
    }

    /// Creates a courier record with `is_available = true` and zero load.
    /// Re-registration surfaces as its own variant so callers that treat
    /// registration as idempotent can ignore it.
    pub fn register(&self, id: Uuid, location: GeoPoint) -> Result<Courier, AppError> {
        match self.couriers.entry(id) {
            Entry::Occupied(_) => Err(AppError::AlreadyRegistered(id)),
            Entry::Vacant(slot) => {
                let courier = Courier::new(id, location);
                slot.insert(courier.clone());
                Ok(courier)
            }
        }
    }

    pub fn update_location(&self, id: Uuid, location: GeoPoint) -> Result<Courier, AppError> {
        let mut courier = self
            .couriers
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("courier {id} not found")))?;

        courier.location = location;
        courier.updated_at = Utc::now();

        Ok(courier.clone())
    }

    /// Going offline is refused while the courier still carries deliveries.
    pub fn set_availability(&self, id: Uuid, available: bool) -> Result<Courier, AppError> {
        let mut courier = self
            .couriers
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("courier {id} not found")))?;

        if !available && courier.current_load > 0 {
            return Err(AppError::HasActiveDeliveries {
                courier_id: id,
                load: courier.current_load,
            });
        }

        courier.is_available = available;
        courier.updated_at = Utc::now();

        Ok(courier.clone())
    }

    /// All online couriers with at least `min_spare` free capacity slots.
    pub fn list_available(&self, min_spare: u8) -> Vec<Courier> {
        self.couriers
            .iter()
            .filter_map(|entry| {
                let courier = entry.value();
                let spare = self.capacity.saturating_sub(courier.current_load);
                if courier.is_available && spare >= min_spare {
                    Some(courier.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Claims one capacity slot for a match. The availability and capacity
    /// check happens under the entry lock, so two deliveries racing for a
    /// courier's last slot cannot both win.
    pub fn try_claim(&self, id: Uuid) -> bool {
        let Some(mut courier) = self.couriers.get_mut(&id) else {
            return false;
        };

        if !courier.is_available || courier.current_load >= self.capacity {
            return false;
        }

        courier.current_load += 1;
        courier.updated_at = Utc::now();
        true
    }

    /// Undoes a claim whose delivery turned out to no longer be assignable.
    pub fn release(&self, id: Uuid) {
        if let Some(mut courier) = self.couriers.get_mut(&id) {
            courier.current_load = courier.current_load.saturating_sub(1);
            courier.updated_at = Utc::now();
        }
    }

    /// Adjusts load by `delta`, clamped to `[0, capacity]`. Delivery
    /// completion uses this with `-1`.
    pub fn adjust_load(&self, id: Uuid, delta: i8) -> Result<Courier, AppError> {
        let mut courier = self
            .couriers
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("courier {id} not found")))?;

        let adjusted = (courier.current_load as i16 + delta as i16)
            .clamp(0, self.capacity as i16) as u8;
        courier.current_load = adjusted;
        courier.updated_at = Utc::now();

        Ok(courier.clone())
    }
}
