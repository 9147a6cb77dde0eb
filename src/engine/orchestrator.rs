use tracing::warn;
use uuid::Uuid;

use crate::engine::matching::{attempt_match, MatchOutcome};
use crate::error::AppError;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::state::AppState;
use crate::upstream::retry::fetch_with_retry;
use crate::upstream::UpstreamError;

fn map_upstream(err: UpstreamError) -> AppError {
    match err {
        UpstreamError::NotFound { endpoint } => {
            AppError::NotFound(format!("upstream record missing: {endpoint}"))
        }
        other => AppError::Upstream {
            endpoint: other.endpoint().to_string(),
            reason: other.to_string(),
        },
    }
}

/// Creates the delivery record for an order and attempts matching inline.
///
/// Both collaborator fetches run behind the bounded retry wrapper. A failed
/// match is not a creation failure: the caller gets the `Pending` record
/// back and the retry scheduler picks it up later.
pub async fn create_delivery(state: &AppState, order_id: Uuid) -> Result<Delivery, AppError> {
    let order = fetch_with_retry("order", || state.order_source.fetch_order(order_id))
        .await
        .map_err(map_upstream)?;
    let restaurant = fetch_with_retry("restaurant", || {
        state.restaurant_source.fetch_restaurant(order.restaurant_id)
    })
    .await
    .map_err(map_upstream)?;

    let delivery = state.store.insert_pending(
        order_id,
        restaurant.location,
        order.dropoff,
        order.dropoff_address,
    )?;
    state.refresh_pending_gauge();

    match attempt_match(state, &delivery) {
        MatchOutcome::Assigned(assigned) => Ok(assigned),
        MatchOutcome::NoCandidate => {
            warn!(
                delivery_id = %delivery.id,
                order_id = %order_id,
                "no courier available at creation; delivery left pending"
            );
            Ok(delivery)
        }
        // Someone else advanced the record already; return what is stored.
        MatchOutcome::NotPending => Ok(state.store.get(delivery.id).unwrap_or(delivery)),
    }
}

/// Courier-facing lifecycle advancement. Completing a delivery frees one
/// capacity slot on the courier; a missing courier record is logged and the
/// delivery still completes.
pub fn advance_delivery(
    state: &AppState,
    delivery_id: Uuid,
    to: DeliveryStatus,
) -> Result<Delivery, AppError> {
    let delivery = state.store.advance_status(delivery_id, to)?;

    if to == DeliveryStatus::Delivered {
        if let Some(courier_id) = delivery.courier_id {
            match state.registry.adjust_load(courier_id, -1) {
                Ok(courier) => {
                    let utilization =
                        courier.current_load as f64 / state.registry.capacity() as f64;
                    state
                        .metrics
                        .courier_utilization
                        .with_label_values(&[&courier.id.to_string()])
                        .set(utilization);
                }
                Err(err) => {
                    warn!(
                        delivery_id = %delivery.id,
                        courier_id = %courier_id,
                        error = %err,
                        "could not release courier load on completion"
                    );
                }
            }
        }
    }

    state.publish_delivery_event(&delivery);
    Ok(delivery)
}
