use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::delivery::DeliveryStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("courier {0} is already registered")]
    AlreadyRegistered(Uuid),

    #[error("a delivery for order {0} already exists")]
    DuplicateOrder(Uuid),

    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    #[error("courier {courier_id} still has {load} active deliveries")]
    HasActiveDeliveries { courier_id: Uuid, load: u8 },

    #[error("no courier assigned for order {0}")]
    NoCourierAssigned(Uuid),

    #[error("location unavailable for courier {0}")]
    CourierLocationUnavailable(Uuid),

    #[error("upstream {endpoint} unavailable: {reason}")]
    Upstream { endpoint: String, reason: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) | AppError::HasActiveDeliveries { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_)
            | AppError::NoCourierAssigned(_)
            | AppError::CourierLocationUnavailable(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyRegistered(_)
            | AppError::DuplicateOrder(_)
            | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::Upstream { .. } | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
