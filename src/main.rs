//! cpstats - LeetCode stats service
//!
//! Serves the portfolio's competitive-programming dashboard data.

use anyhow::{Context, Result};
use clap::Parser;
use cpstats::config::{AppConfig, CliArgs};
use cpstats::server::{run_server, state::AppState};
use cpstats::store::StatsCache;
use cpstats::upstream::LeetCodeClient;
use std::sync::Arc;
use tokio::sync::watch;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cpstats=info,tower_http=info")),
        )
        .init();

    let args = CliArgs::parse();
    let config = AppConfig::from_sources(&args).context("failed to load configuration")?;

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║              cpstats - LeetCode Stats Service              ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    println!("🔧 Building upstream client...");
    let client = LeetCodeClient::new(config.graphql_url.clone(), config.request_timeout)
        .context("failed to construct HTTP client")?;
    println!("   ✓ {} (timeout {}s)", config.graphql_url, config.request_timeout.as_secs());

    let cache = Arc::new(StatsCache::new(
        Arc::new(client),
        config.username.clone(),
        config.freshness,
        config.retry,
    ));
    println!(
        "   ✓ Caching stats for '{}' for {}s",
        config.username,
        config.freshness.as_secs()
    );

    // Shutdown signal
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        println!("\n🛑 Shutdown signal received...");
        let _ = shutdown_tx.send(true);
    })
    .context("failed to install Ctrl+C handler")?;

    let addr = config.bind;
    let state = AppState::new(Arc::clone(&cache), config);

    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("🌐 API available at http://{}", addr);
    println!("   • GET /health              - Liveness");
    println!("   • GET /api/stats           - LeetCode snapshot");
    println!("   • GET /api/stats/progress  - Per-difficulty progress");
    println!("   • GET /api/stats/heatmap   - Submission heatmap");
    println!("   • GET /api/stats/monthly   - Monthly submissions");
    println!("   • POST /api/heatmap        - Heatmap of a supplied calendar");
    println!("   • GET /api/config          - Effective configuration");
    println!("════════════════════════════════════════════════════════════════");
    println!();

    let rt = tokio::runtime::Runtime::new().context("failed to create Tokio runtime")?;
    rt.block_on(async move {
        let shutdown = async move {
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        };
        run_server(addr, state, shutdown).await
    })
    .with_context(|| format!("HTTP server on {addr} failed"))?;

    let status = cache.status();
    tracing::info!(
        cached = status.has_snapshot,
        age_secs = status.age.map(|a| a.as_secs()),
        "Server stopped"
    );
    println!("\n👋 cpstats has exited. Goodbye!");
    Ok(())
}
