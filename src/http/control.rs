use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::http::{ControlResponse, FailureResponse};

#[derive(Debug, Deserialize)]
struct ControlRequest {
    #[serde(default)]
    action: Value
}

/// `POST /api/kafka`: acknowledges consumer control requests without acting on them.
pub async fn control_consumer(body: Bytes) -> Response {
    let request: ControlRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(error) => {
            error!("Control request could not be parsed: {error}");
            let body = FailureResponse::new("Failed to process request", None);
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }
    };

    match request.action.as_str() {
        Some(action @ ("start" | "stop")) => {
            info!("Kafka consumer {action} requested");

            let body = ControlResponse {
                success: true,
                message: format!("Kafka consumer {action} requested - not implemented yet")
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        _ => (StatusCode::BAD_REQUEST, Json(FailureResponse::new("Invalid action", None))).into_response()
    }
}
