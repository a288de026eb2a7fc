use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

pub fn create_health_router<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new().route("/health", get(health_check))
}

/// Always OK while the process serves requests. Broker reachability is reported by the snapshot.
pub async fn health_check() -> impl IntoResponse {
    "OK"
}
