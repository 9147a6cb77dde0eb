use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::matching::{attempt_match, MatchOutcome};
use crate::state::AppState;
use crate::store::RetryOutcome;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RetryPassStats {
    pub examined: usize,
    pub matched: usize,
    pub rescheduled: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Periodic matching retry for stuck deliveries. `MissedTickBehavior::Skip`
/// keeps a pass that overruns its period from stacking on the next tick.
pub async fn run_retry_scheduler(state: Arc<AppState>) {
    let mut ticker = interval(Duration::from_secs(state.dispatch.retry_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        interval_secs = state.dispatch.retry_interval_secs,
        min_age_secs = state.dispatch.retry_min_age_secs,
        max_retries = state.dispatch.max_match_retries,
        "retry scheduler started"
    );

    loop {
        ticker.tick().await;
        let stats = run_retry_pass(&state);
        if stats.examined > 0 {
            info!(
                examined = stats.examined,
                matched = stats.matched,
                rescheduled = stats.rescheduled,
                failed = stats.failed,
                skipped = stats.skipped,
                "retry pass finished"
            );
        }
    }
}

/// One retry pass. Each delivery's outcome is independent, so a single
/// record cannot abort the batch.
pub fn run_retry_pass(state: &AppState) -> RetryPassStats {
    let min_age = ChronoDuration::seconds(state.dispatch.retry_min_age_secs);
    let ready = state.store.pending_ready_for_retry(min_age);

    let mut stats = RetryPassStats {
        examined: ready.len(),
        ..RetryPassStats::default()
    };

    for delivery in ready {
        match attempt_match(state, &delivery) {
            MatchOutcome::Assigned(assigned) => {
                stats.matched += 1;
                debug!(
                    delivery_id = %assigned.id,
                    retry_count = assigned.retry_count,
                    "retry pass matched delivery"
                );
            }
            MatchOutcome::NotPending => stats.skipped += 1,
            MatchOutcome::NoCandidate => {
                match state
                    .store
                    .record_failed_attempt(delivery.id, state.dispatch.max_match_retries)
                {
                    RetryOutcome::Scheduled(count) => {
                        stats.rescheduled += 1;
                        debug!(
                            delivery_id = %delivery.id,
                            retry_count = count,
                            "no courier available, will retry"
                        );
                    }
                    RetryOutcome::FailedToAssign(failed) => {
                        stats.failed += 1;
                        state.publish_delivery_event(&failed);
                        warn!(
                            delivery_id = %failed.id,
                            order_id = %failed.order_id,
                            retry_count = failed.retry_count,
                            "delivery permanently failed to assign"
                        );
                    }
                    RetryOutcome::Skipped => stats.skipped += 1,
                }
            }
        }
    }

    state.refresh_pending_gauge();
    stats
}

/// Periodic deletion of deliveries stuck `Pending` past the TTL, bounding
/// storage growth from permanently unmatchable orders.
pub async fn run_cleanup_scheduler(state: Arc<AppState>) {
    let mut ticker = interval(Duration::from_secs(state.dispatch.cleanup_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        interval_secs = state.dispatch.cleanup_interval_secs,
        ttl_secs = state.dispatch.pending_ttl_secs,
        "cleanup scheduler started"
    );

    loop {
        ticker.tick().await;
        let removed = run_cleanup_pass(&state);
        if removed > 0 {
            info!(removed, "cleanup pass deleted expired pending deliveries");
        }
    }
}

pub fn run_cleanup_pass(state: &AppState) -> usize {
    let ttl = ChronoDuration::seconds(state.dispatch.pending_ttl_secs);
    let removed = state.store.remove_expired_pending(ttl);
    state.refresh_pending_gauge();
    removed
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::config::DispatchConfig;
    use crate::models::courier::GeoPoint;
    use crate::models::delivery::DeliveryStatus;
    use crate::upstream::testing::unreachable_sources;

    fn test_state(dispatch: DispatchConfig) -> AppState {
        let (orders, restaurants) = unreachable_sources();
        AppState::new(dispatch, orders, restaurants, 16)
    }

    fn eager_dispatch() -> DispatchConfig {
        DispatchConfig {
            retry_min_age_secs: 0,
            pending_ttl_secs: 0,
            ..DispatchConfig::default()
        }
    }

    fn point() -> GeoPoint {
        GeoPoint { lat: 0.0, lng: 0.0 }
    }

    #[test]
    fn pass_matches_once_a_courier_appears() {
        let state = test_state(eager_dispatch());
        let delivery = state
            .store
            .insert_pending(Uuid::new_v4(), point(), point(), "4 Quay St".to_string())
            .unwrap();

        let stats = run_retry_pass(&state);
        assert_eq!(stats.examined, 1);
        assert_eq!(stats.rescheduled, 1);

        let courier = Uuid::new_v4();
        state.registry.register(courier, point()).unwrap();

        let stats = run_retry_pass(&state);
        assert_eq!(stats.matched, 1);
        assert_eq!(
            state.store.get(delivery.id).unwrap().courier_id,
            Some(courier)
        );
    }

    #[test]
    fn exhausted_retries_go_terminal_and_stay_there() {
        let state = test_state(eager_dispatch());
        let delivery = state
            .store
            .insert_pending(Uuid::new_v4(), point(), point(), "4 Quay St".to_string())
            .unwrap();

        for _ in 0..4 {
            let stats = run_retry_pass(&state);
            assert_eq!(stats.rescheduled, 1);
        }

        let stats = run_retry_pass(&state);
        assert_eq!(stats.failed, 1);

        let stored = state.store.get(delivery.id).unwrap();
        assert_eq!(stored.status, DeliveryStatus::FailedToAssign);
        assert_eq!(stored.retry_count, 5);

        // Terminal deliveries are not selected again.
        let stats = run_retry_pass(&state);
        assert_eq!(stats, RetryPassStats::default());
        assert_eq!(state.store.get(delivery.id).unwrap().retry_count, 5);
    }

    #[test]
    fn young_pending_deliveries_are_not_retried() {
        let state = test_state(DispatchConfig::default());
        state
            .store
            .insert_pending(Uuid::new_v4(), point(), point(), "4 Quay St".to_string())
            .unwrap();

        let stats = run_retry_pass(&state);
        assert_eq!(stats.examined, 0);
    }

    #[test]
    fn assigned_deliveries_survive_cleanup() {
        let state = test_state(eager_dispatch());
        let stuck = state
            .store
            .insert_pending(Uuid::new_v4(), point(), point(), "4 Quay St".to_string())
            .unwrap();
        let moving = state
            .store
            .insert_pending(Uuid::new_v4(), point(), point(), "5 Quay St".to_string())
            .unwrap();
        state
            .store
            .assign(moving.id, Uuid::new_v4(), chrono::Utc::now());

        assert_eq!(run_cleanup_pass(&state), 1);
        assert!(state.store.get(stuck.id).is_none());
        assert!(state.store.get(moving.id).is_some());
    }
}
