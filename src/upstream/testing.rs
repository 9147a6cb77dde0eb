use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::upstream::{
    OrderDetails, OrderSource, RestaurantDetails, RestaurantSource, UpstreamError,
};

/// Sources that fail every fetch, for tests that never reach the
/// orchestrator's upstream calls.
pub fn unreachable_sources() -> (Arc<dyn OrderSource>, Arc<dyn RestaurantSource>) {
    (Arc::new(Unreachable), Arc::new(Unreachable))
}

struct Unreachable;

fn refused(endpoint: &str) -> UpstreamError {
    UpstreamError::Transport {
        endpoint: endpoint.to_string(),
        reason: "connection refused".to_string(),
    }
}

#[async_trait]
impl OrderSource for Unreachable {
    async fn fetch_order(&self, _order_id: Uuid) -> Result<OrderDetails, UpstreamError> {
        Err(refused("http://orders.invalid"))
    }
}

#[async_trait]
impl RestaurantSource for Unreachable {
    async fn fetch_restaurant(
        &self,
        _restaurant_id: Uuid,
    ) -> Result<RestaurantDetails, UpstreamError> {
        Err(refused("http://restaurants.invalid"))
    }
}
