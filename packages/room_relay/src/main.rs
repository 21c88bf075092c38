use anyhow::{Context, Result};
use axum::{Router, routing::get};
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tower_http::cors::CorsLayer;
use tower_http::trace::MakeSpan;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use uuid::Uuid;

mod config;
mod handlers;
mod metrics;
#[cfg(test)]
mod test_helpers;
mod ws;

use room_broadcaster::Broadcaster;

use crate::config::{CliOverrides, FileConfig, ServerConfig};
use crate::metrics::ServerMetrics;

/// Custom span maker that adds a unique request ID to each incoming request
#[derive(Clone)]
struct RequestIdMakeSpan;

impl<B> MakeSpan<B> for RequestIdMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> tracing::Span {
        let request_id = Uuid::new_v4().to_string();
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "WebSocket chat relay with room-scoped broadcast")]
struct Cli {
    /// Path to the config file (missing file = defaults)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Port for the web server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(short = 'b', long)]
    host: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Clone)]
pub(crate) struct AppState {
    /// Room membership and fan-out, shared by every connection
    pub broadcaster: Arc<Broadcaster>,
    /// Server runtime configuration
    pub server_config: Arc<ServerConfig>,
    /// Server metrics for observability
    pub metrics: Arc<ServerMetrics>,
}

impl AppState {
    pub fn new(server_config: ServerConfig) -> Self {
        let broadcaster = Arc::new(Broadcaster::new(server_config.broadcaster_config()));
        Self {
            broadcaster,
            server_config: Arc::new(server_config),
            metrics: Arc::new(ServerMetrics::new()),
        }
    }
}

pub(crate) fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root_handler))
        .route("/ws", get(handlers::chat_websocket_handler))
        .route("/api/rooms", get(handlers::list_rooms_handler))
        // Health endpoints
        .route("/health", get(handlers::health_handler))
        .route("/health/live", get(handlers::health_live_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http().make_span_with(RequestIdMakeSpan))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_directive = if cli.debug {
        "room_relay=debug,room_broadcaster=debug,tower_http=debug,info"
    } else {
        "room_relay=info,room_broadcaster=info,tower_http=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let file_config: FileConfig = config::load_config(&cli.config)
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let overrides = CliOverrides {
        host: cli.host,
        port: cli.port,
    };
    let server_config = ServerConfig::from_file(&file_config, &overrides)?;

    run_server(server_config).await
}

async fn run_server(server_config: ServerConfig) -> Result<()> {
    info!("Starting room relay");
    info!(
        "Server config: send_channel_capacity={}, default_display_name={}",
        server_config.websocket.send_channel_capacity, server_config.websocket.default_display_name
    );

    let addr = server_config.bind_addr;
    let app_state = AppState::new(server_config);
    let broadcaster_for_shutdown = app_state.broadcaster.clone();
    let app = build_app(app_state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let actual_addr = listener.local_addr()?;

    info!("Room relay listening on http://{}", actual_addr);
    info!("  GET /ws         - Chat WebSocket (?name=<display name>)");
    info!("  GET /api/rooms  - List rooms");
    info!("  GET /health     - Health check");

    // Closing every outbound queue ends the writer tasks, which close
    // their sockets; the server can then drain.
    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, cleaning up...");
        let closed = broadcaster_for_shutdown.shutdown().await;
        info!("Closed {} chat connections", closed);
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}
