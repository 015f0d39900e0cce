// =============================================================================
// Aurora Chart — Main Entry Point
// =============================================================================
//
// Serves one synchronized chart over HTTP and WebSocket. Bars arrive from the
// data collaborators through `POST /api/v1/bars` and `/api/v1/bars/live`; an
// optional seed file can preload a range at startup.
// =============================================================================

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use aurora_chart::api;
use aurora_chart::app_state::AppState;
use aurora_chart::market_data::{RawBar, RawVolume};
use aurora_chart::runtime_config::RuntimeConfig;
use aurora_chart::update_queue::ChartCommand;

/// Layout of the `AURORA_SEED_BARS` file.
#[derive(Deserialize)]
struct SeedFile {
    bars: Vec<RawBar>,
    #[serde(default)]
    volume: Vec<RawVolume>,
}

fn load_seed(path: &Path) -> anyhow::Result<SeedFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed bars from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse seed bars from {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Aurora Chart — Starting Up                        ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path =
        std::env::var("AURORA_CHART_CONFIG").unwrap_or_else(|_| "chart_config.json".into());
    let config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config));

    // ── 3. Optional seed range ───────────────────────────────────────────
    if let Ok(seed_path) = std::env::var("AURORA_SEED_BARS") {
        let seed = load_seed(Path::new(&seed_path))?;
        let command = ChartCommand::ReplaceRange {
            bars: seed.bars,
            volume: seed.volume,
        };
        match state.updates.submit(command).await? {
            Ok(outcome) => info!(path = %seed_path, ?outcome, "Seed range loaded"),
            Err(e) => error!(path = %seed_path, error = %e, "Seed range rejected"),
        }
    }

    // ── 4. Start the API server ──────────────────────────────────────────
    let bind_addr =
        std::env::var("AURORA_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let app = api::router(state.clone());
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    info!("Chart service running. Press Ctrl+C to stop.");

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for shutdown signal")?;
            warn!("Shutdown signal received — stopping gracefully");
        }
        served = server => {
            served.context("API server task panicked")?.context("API server failed")?;
        }
    }

    info!(
        state_version = state.current_state_version(),
        "Aurora Chart shut down complete."
    );
    Ok(())
}
