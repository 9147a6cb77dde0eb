pub mod http;
pub mod retry;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::courier::GeoPoint;

/// Order details read from the order service at delivery creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub restaurant_id: Uuid,
    pub dropoff_address: String,
    pub dropoff: GeoPoint,
}

/// Pickup coordinates read from the restaurant service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDetails {
    pub location: GeoPoint,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{endpoint}: not found")]
    NotFound { endpoint: String },

    #[error("{endpoint}: HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("{endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("{endpoint}: invalid response body: {reason}")]
    Decode { endpoint: String, reason: String },
}

impl UpstreamError {
    /// Transport failures and 5xx responses are worth another attempt;
    /// not-found and malformed bodies are surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Transport { .. } => true,
            UpstreamError::Status { status, .. } => *status >= 500,
            UpstreamError::NotFound { .. } | UpstreamError::Decode { .. } => false,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            UpstreamError::NotFound { endpoint }
            | UpstreamError::Status { endpoint, .. }
            | UpstreamError::Transport { endpoint, .. }
            | UpstreamError::Decode { endpoint, .. } => endpoint,
        }
    }
}

#[async_trait]
pub trait OrderSource: Send + Sync {
    async fn fetch_order(&self, order_id: Uuid) -> Result<OrderDetails, UpstreamError>;
}

#[async_trait]
pub trait RestaurantSource: Send + Sync {
    async fn fetch_restaurant(
        &self,
        restaurant_id: Uuid,
    ) -> Result<RestaurantDetails, UpstreamError>;
}
