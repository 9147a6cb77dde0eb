use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Registry record for one courier: availability, in-flight load and
/// last-reported location. Capacity is a single global constant owned by the
/// registry, not stored per courier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Courier {
    pub id: Uuid,
    pub is_available: bool,
    pub current_load: u8,
    pub location: GeoPoint,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Courier {
    pub fn new(id: Uuid, location: GeoPoint) -> Self {
        let now = Utc::now();
        Self {
            id,
            is_available: true,
            current_load: 0,
            location,
            registered_at: now,
            updated_at: now,
        }
    }
}
