use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::config::UpstreamConfig;
use crate::upstream::{
    OrderDetails, OrderSource, RestaurantDetails, RestaurantSource, UpstreamError,
};

/// One `reqwest::Client` with the configured per-call timeout, shared by
/// both collaborator clients.
pub fn build_client(config: &UpstreamConfig) -> Result<reqwest::Client, crate::error::AppError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|err| {
            crate::error::AppError::Internal(format!("failed to build upstream client: {err}"))
        })
}

async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: String,
) -> Result<T, UpstreamError> {
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|err| UpstreamError::Transport {
            endpoint: url.clone(),
            reason: err.to_string(),
        })?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(UpstreamError::NotFound { endpoint: url });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::Status {
            endpoint: url,
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|err| UpstreamError::Decode {
            endpoint: url,
            reason: err.to_string(),
        })
}

pub struct HttpOrderSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrderSource {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl OrderSource for HttpOrderSource {
    async fn fetch_order(&self, order_id: Uuid) -> Result<OrderDetails, UpstreamError> {
        let url = format!("{}/orders/{order_id}", self.base_url);
        get_json(&self.client, url).await
    }
}

pub struct HttpRestaurantSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRestaurantSource {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RestaurantSource for HttpRestaurantSource {
    async fn fetch_restaurant(
        &self,
        restaurant_id: Uuid,
    ) -> Result<RestaurantDetails, UpstreamError> {
        let url = format!("{}/restaurants/{restaurant_id}", self.base_url);
        get_json(&self.client, url).await
    }
}
