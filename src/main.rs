mod api;
mod config;
mod engine;
mod error;
mod geo;
mod models;
mod observability;
mod registry;
mod state;
mod store;
mod tracking;
mod upstream;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::upstream::http::{build_client, HttpOrderSource, HttpRestaurantSource};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let client = build_client(&config.upstream)?;
    let order_source = Arc::new(HttpOrderSource::new(
        client.clone(),
        &config.upstream.order_service_url,
    ));
    let restaurant_source = Arc::new(HttpRestaurantSource::new(
        client,
        &config.upstream.restaurant_service_url,
    ));

    let shared_state = Arc::new(state::AppState::new(
        config.dispatch.clone(),
        order_source,
        restaurant_source,
        config.event_buffer_size,
    ));

    tokio::spawn(engine::scheduler::run_retry_scheduler(shared_state.clone()));
    tokio::spawn(engine::scheduler::run_cleanup_scheduler(
        shared_state.clone(),
    ));

    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        courier_capacity = config.dispatch.courier_capacity,
        retry_interval_secs = config.dispatch.retry_interval_secs,
        "dispatch engine started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
