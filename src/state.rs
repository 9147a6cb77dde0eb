use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::DispatchConfig;
use crate::models::delivery::Delivery;
use crate::models::event::DeliveryEvent;
use crate::observability::metrics::Metrics;
use crate::registry::CourierRegistry;
use crate::store::DeliveryStore;
use crate::upstream::{OrderSource, RestaurantSource};

pub struct AppState {
    pub registry: CourierRegistry,
    pub store: DeliveryStore,
    pub order_source: Arc<dyn OrderSource>,
    pub restaurant_source: Arc<dyn RestaurantSource>,
    pub delivery_events_tx: broadcast::Sender<DeliveryEvent>,
    pub metrics: Metrics,
    pub dispatch: DispatchConfig,
}

impl AppState {
    pub fn new(
        dispatch: DispatchConfig,
        order_source: Arc<dyn OrderSource>,
        restaurant_source: Arc<dyn RestaurantSource>,
        event_buffer_size: usize,
    ) -> Self {
        let (delivery_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            registry: CourierRegistry::new(dispatch.courier_capacity),
            store: DeliveryStore::new(),
            order_source,
            restaurant_source,
            delivery_events_tx,
            metrics: Metrics::new(),
            dispatch,
        }
    }

    /// Send errors only mean no subscriber is connected right now.
    pub fn publish_delivery_event(&self, delivery: &Delivery) {
        let _ = self.delivery_events_tx.send(DeliveryEvent::from(delivery));
    }

    pub fn refresh_pending_gauge(&self) {
        self.metrics
            .deliveries_pending
            .set(self.store.pending_count() as i64);
    }
}
