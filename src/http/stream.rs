use axum::extract::State;
use axum::http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures::StreamExt;

use crate::broker::Broker;
use crate::http::AppState;

/// `GET /api/kafka/stream`: one `data:` frame per event for as long as the client stays connected.
///
/// Hyper drops the body when the client goes away, which drops the event stream and cancels
/// its broker session.
pub async fn stream_transactions<B: Broker>(State(state): State<AppState<B>>) -> impl IntoResponse {
    let events = state.relay.open_stream(&state.topic)
        .map(|event| Event::default().json_data(event));

    (
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "Cache-Control")
        ],
        Sse::new(events).keep_alive(KeepAlive::default())
    )
}

/// `OPTIONS /api/kafka/stream`
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Cache-Control")
        ]
    )
}
