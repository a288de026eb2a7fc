use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use crate::broker::Broker;
use crate::collector::{Snapshot, SnapshotStatus};
use crate::http::{AppState, FailureResponse, SnapshotResponse};

/// `GET /api/kafka`: one bounded collection from the live topic.
pub async fn fetch_snapshot<B: Broker>(State(state): State<AppState<B>>) -> Response {
    let collector = state.collector.clone();
    let address = collector.address().to_string();
    let AppState { topic, max_messages, snapshot_timeout, .. } = state;

    //NOTE: The collection runs on its own task so a client hanging up mid-request cannot skip the disconnect.
    let collection = tokio::spawn(async move {
        collector.collect(&topic, max_messages, snapshot_timeout).await
    });

    match collection.await {
        Ok(snapshot) => Json(snapshot_response(snapshot, &address)).into_response(),
        Err(error) => {
            error!("Snapshot collection did not complete: {error}");
            let body = FailureResponse::new("Failed to fetch transaction data", Some(address));
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

fn snapshot_response(snapshot: Snapshot, address: &str) -> SnapshotResponse {
    match snapshot.status {
        SnapshotStatus::BrokerUnavailable(detail) => {
            warn!("Snapshot could not reach {address}: {detail}");

            SnapshotResponse {
                success: false,
                data: Vec::new(),
                message: format!("Kafka broker not available on {address}. Please start your Kafka producer."),
                broker: format!("{address} (offline)")
            }
        }
        SnapshotStatus::Interrupted(detail) => SnapshotResponse {
            success: false,
            message: format!("Kafka consumer on {address} stopped after {} transactions: {detail}", snapshot.transactions.len()),
            data: snapshot.transactions,
            broker: address.to_string()
        },
        SnapshotStatus::Full | SnapshotStatus::TimedOut => SnapshotResponse {
            success: true,
            message: format!("Retrieved {} transactions from Kafka", snapshot.transactions.len()),
            data: snapshot.transactions,
            broker: address.to_string()
        }
    }
}
