use std::io::stderr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use transaction_stream_bridge::broker::KafkaBroker;
use transaction_stream_bridge::config::Config;
use transaction_stream_bridge::http::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    setup_logging(parse_log_level(&config.log_level));
    config.validate()?;

    let shutdown = CancellationToken::new();
    let broker = Arc::new(KafkaBroker::new(config.kafka_settings()));
    let router = create_router(AppState::new(broker, &config, shutdown.clone()));

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!("Serving [{}] from Kafka broker {} on {}", config.topic, config.broker, config.listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'info'", level);
            LevelFilter::INFO
        }
    }
}

fn setup_logging(level: LevelFilter) {
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

//NOTE: Open event streams never finish on their own, cancelling the token ends them so the
//      graceful shutdown can drain their connections.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(error) = signal::ctrl_c().await {
        error!("Could not listen for the shutdown signal: {error}");
    }

    info!("Shutdown requested, closing open streams");
    shutdown.cancel();
}
