//! PagePilot HTTP server
//!
//! Starts an Axum web server exposing the assistant core to the UI
//! collaborator: query execution, routing decisions, usage metering, health,
//! and metrics.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use clap::Parser;
use pagepilot::{
    cli::{Cli, Command},
    config::Config,
    handlers::{self, AppState},
    metrics::Metrics,
    middleware::request_id_middleware,
    service::Assistant,
    store::Store,
    telemetry,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = pagepilot::cli::generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                println!("Wrote configuration template to {path}");
            }
            None => print!("{template}"),
        }
        return Ok(());
    }

    // Load configuration
    let config = Config::from_file(&cli.config)?;

    // Initialize telemetry
    telemetry::init(&config.observability.log_level);

    tracing::info!(
        "Starting PagePilot server on {}:{}",
        config.server.host,
        config.server.port
    );

    // Construct components explicitly and inject them; no globals
    let store = Arc::new(Store::open(&config.storage.path)?);
    let metrics = Metrics::new()?;
    let assistant = Arc::new(Assistant::new(&config, store, metrics.clone()));
    let state = AppState::new(assistant, metrics);

    // Build router
    let app = Router::new()
        .route("/assist", post(handlers::assist::handler))
        .route("/decide", post(handlers::assist::decide_handler))
        .route("/usage", get(handlers::usage::check_handler))
        .route("/usage/reset", post(handlers::usage::reset_handler))
        .route("/health", get(handlers::health::handler))
        .route("/metrics", get(handlers::metrics::handler))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Create socket address
    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([127, 0, 0, 1])),
        config.server.port,
    ));

    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
