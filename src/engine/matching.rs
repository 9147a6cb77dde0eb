use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::geo::distance_km;
use crate::models::courier::{Courier, GeoPoint};
use crate::models::delivery::Delivery;
use crate::state::AppState;
use crate::store::AssignOutcome;

/// Assumed courier speed for the delivery-time estimate.
const AVERAGE_SPEED_KMH: f64 = 25.0;

pub enum MatchOutcome {
    Assigned(Delivery),
    /// No available courier with spare capacity; the delivery stays Pending.
    NoCandidate,
    /// The delivery left Pending between selection and the write; no-op.
    NotPending,
}

/// Candidate cost: one in-flight delivery weighs the same as one km of
/// distance to the pickup. Lower is better.
pub fn match_score(courier: &Courier, pickup: &GeoPoint) -> f64 {
    courier.current_load as f64 + distance_km(&courier.location, pickup)
}

fn estimated_arrival(courier: &Courier, delivery: &Delivery) -> DateTime<Utc> {
    let total_km = distance_km(&courier.location, &delivery.pickup)
        + distance_km(&delivery.pickup, &delivery.dropoff);
    let travel_secs = (total_km / AVERAGE_SPEED_KMH * 3600.0).ceil() as i64;
    Utc::now() + Duration::seconds(travel_secs)
}

/// Picks the minimum-score candidate (ties broken by courier id ascending)
/// and claims it. The registry claim happens before the delivery write; a
/// lost claim falls through to the next candidate in score order, and a
/// delivery that is concurrently advanced gets its claim released.
pub fn attempt_match(state: &AppState, delivery: &Delivery) -> MatchOutcome {
    let start = Instant::now();
    let outcome = select_and_claim(state, delivery);

    let label = match &outcome {
        MatchOutcome::Assigned(_) => "assigned",
        MatchOutcome::NoCandidate => "no_candidate",
        MatchOutcome::NotPending => "not_pending",
    };
    state
        .metrics
        .match_attempts_total
        .with_label_values(&[label])
        .inc();
    state
        .metrics
        .match_latency_seconds
        .with_label_values(&[label])
        .observe(start.elapsed().as_secs_f64());

    outcome
}

fn select_and_claim(state: &AppState, delivery: &Delivery) -> MatchOutcome {
    let mut candidates: Vec<(f64, Courier)> = state
        .registry
        .list_available(1)
        .into_iter()
        .map(|courier| (match_score(&courier, &delivery.pickup), courier))
        .collect();

    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

    for (score, candidate) in candidates {
        if !state.registry.try_claim(candidate.id) {
            // Lost the slot to a concurrent match; try the next-best.
            continue;
        }

        let eta = estimated_arrival(&candidate, delivery);
        match state.store.assign(delivery.id, candidate.id, eta) {
            AssignOutcome::Assigned(assigned) => {
                if let Some(courier) = state.registry.get(candidate.id) {
                    let utilization =
                        courier.current_load as f64 / state.registry.capacity() as f64;
                    state
                        .metrics
                        .courier_utilization
                        .with_label_values(&[&courier.id.to_string()])
                        .set(utilization);
                }

                state.publish_delivery_event(&assigned);
                state.refresh_pending_gauge();

                info!(
                    delivery_id = %assigned.id,
                    order_id = %assigned.order_id,
                    courier_id = %candidate.id,
                    score,
                    "delivery assigned"
                );
                return MatchOutcome::Assigned(assigned);
            }
            AssignOutcome::NotPending => {
                state.registry.release(candidate.id);
                return MatchOutcome::NotPending;
            }
        }
    }

    MatchOutcome::NoCandidate
}
