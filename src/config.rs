use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub upstream: UpstreamConfig,
    pub dispatch: DispatchConfig,
}

/// Base URLs and timeout for the order/restaurant collaborator services.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub order_service_url: String,
    pub restaurant_service_url: String,
    pub timeout_secs: u64,
}

/// Knobs for the matching engine and its background passes.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Max in-flight deliveries per courier.
    pub courier_capacity: u8,
    pub retry_interval_secs: u64,
    /// Pending deliveries younger than this are skipped by the retry pass,
    /// so the creation-time attempt is not immediately re-raced.
    pub retry_min_age_secs: i64,
    /// Failed attempts before a delivery goes terminal (FailedToAssign).
    pub max_match_retries: u32,
    pub cleanup_interval_secs: u64,
    /// Pending deliveries older than this are deleted by the cleanup pass.
    pub pending_ttl_secs: i64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            courier_capacity: 3,
            retry_interval_secs: 60,
            retry_min_age_secs: 30,
            max_match_retries: 5,
            cleanup_interval_secs: 300,
            pending_ttl_secs: 1800,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            upstream: UpstreamConfig {
                order_service_url: env::var("ORDER_SERVICE_URL")
                    .unwrap_or_else(|_| "http://localhost:3001".to_string()),
                restaurant_service_url: env::var("RESTAURANT_SERVICE_URL")
                    .unwrap_or_else(|_| "http://localhost:3002".to_string()),
                timeout_secs: parse_or_default("UPSTREAM_TIMEOUT_SECS", 5)?,
            },
            dispatch: DispatchConfig {
                courier_capacity: parse_or_default("COURIER_CAPACITY", 3)?,
                retry_interval_secs: parse_or_default("RETRY_INTERVAL_SECS", 60)?,
                retry_min_age_secs: parse_or_default("RETRY_MIN_AGE_SECS", 30)?,
                max_match_retries: parse_or_default("MAX_MATCH_RETRIES", 5)?,
                cleanup_interval_secs: parse_or_default("CLEANUP_INTERVAL_SECS", 300)?,
                pending_ttl_secs: parse_or_default("PENDING_TTL_SECS", 1800)?,
            },
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
