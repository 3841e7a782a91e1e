//! HTTP server module for the stats API.
//!
//! Provides a small REST API consumed by the portfolio front end.

pub mod routes;
pub mod state;

use crate::server::routes::{config, health, stats};
use crate::server::state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the router with all routes and layers.
pub fn router(state: AppState) -> Router {
    // CORS layer for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Stats API
        .route("/api/stats", get(stats::get_stats))
        .route("/api/stats/progress", get(stats::get_progress))
        .route("/api/stats/heatmap", get(stats::get_heatmap))
        .route("/api/stats/monthly", get(stats::get_monthly))
        .route("/api/heatmap", post(stats::post_heatmap))
        // Config API
        .route("/api/config", get(config::get_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Runs the server until `shutdown` resolves.
pub async fn run_server(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
