mod control;
mod health;
mod responses;
mod snapshot;
mod stream;

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::broker::Broker;
use crate::collector::SnapshotCollector;
use crate::config::Config;
use crate::relay::StreamRelay;
use crate::session::SessionManager;

pub use responses::{ControlResponse, FailureResponse, SnapshotResponse};

/// Shared by every request. Holds the broker configuration only, never a live session.
pub struct AppState<B: Broker> {
    pub collector: Arc<SnapshotCollector<B>>,
    pub relay: Arc<StreamRelay<B>>,
    pub topic: String,
    pub max_messages: usize,
    pub snapshot_timeout: Duration
}

impl<B: Broker> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            collector: self.collector.clone(),
            relay: self.relay.clone(),
            topic: self.topic.clone(),
            max_messages: self.max_messages,
            snapshot_timeout: self.snapshot_timeout
        }
    }
}

impl<B: Broker> AppState<B> {
    /// `shutdown` ends every open stream when cancelled.
    pub fn new(broker: Arc<B>, config: &Config, shutdown: CancellationToken) -> Self {
        let snapshot_sessions = SessionManager::new(broker.clone(), &config.snapshot_client_id);
        let stream_sessions = SessionManager::new(broker, &config.stream_client_id);

        Self {
            collector: Arc::new(SnapshotCollector::new(snapshot_sessions, &config.snapshot_group_prefix)),
            relay: Arc::new(StreamRelay::new(stream_sessions, &config.stream_group_prefix, config.stream_buffer, shutdown)),
            topic: config.topic.clone(),
            max_messages: config.max_messages,
            snapshot_timeout: config.snapshot_timeout()
        }
    }
}

/// Create the HTTP router with all routes
pub fn create_router<B: Broker>(state: AppState<B>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, CACHE_CONTROL]);

    //NOTE: The stream route answers its own preflight, so it stays outside the CORS layer
    let stream = Router::new()
        .route("/api/kafka/stream", get(stream::stream_transactions::<B>).options(stream::preflight));

    Router::new()
        .merge(health::create_health_router())
        .route("/api/kafka", get(snapshot::fetch_snapshot::<B>).post(control::control_consumer))
        .layer(cors)
        .merge(stream)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
