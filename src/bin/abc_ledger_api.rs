//! ABC Ledger API Server
//!
//! REST API over a single in-memory ABC token
//!
//! Usage:
//!   cargo run --bin abc_ledger_api
//!
//! Environment:
//!   ABC_LEDGER_CONFIG - Deployment JSON (default: fixture deployment)
//!   PORT / ABC_LEDGER_PORT - Server port (default: 8080)
//!   ABC_LEDGER_HOST   - Server host (default: 0.0.0.0)
//!   RUST_LOG          - Log level (default: info)

use abc_ledger::api::{create_router, start_cleanup_task, AppState};
use abc_ledger::utils::constants::{tokens, DEMO_SEED_BASE_WEI, DEMO_SEED_TOKENS};
use abc_ledger::{ApiConfig, DeploymentConfig, LedgerTelemetry};
use alloy_primitives::U256;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = DeploymentConfig::load()?;
    let telemetry = Arc::new(LedgerTelemetry::new());
    let telemetry_for_shutdown = telemetry.clone();

    let state = Arc::new(AppState::new(&config, telemetry)?);

    // Give the pair some depth so swap-and-liquify has somewhere to go
    {
        let mut token = state.token.lock().await;
        let owner = token.owner();
        match token.seed_liquidity(owner, tokens(DEMO_SEED_TOKENS), U256::from(DEMO_SEED_BASE_WEI)) {
            Ok(receipt) => info!(liquidity = %receipt.liquidity, "💧 Pair seeded by owner"),
            Err(e) => warn!("⚠️ Pair not seeded: {}", e),
        }
    }

    start_cleanup_task(state.accounts.clone());
    info!("🧹 Background cleanup task started");

    let app = create_router(state);
    let addr = ApiConfig::from_env().socket_addr()?;

    info!("🚀 ABC Ledger API starting on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /v1/token                      - Token metadata");
    info!("  GET  /v1/balance/:address           - Balance");
    info!("  GET  /v1/allowance/:owner/:spender  - Allowance");
    info!("  POST /v1/transfer                   - Fee-on-transfer");
    info!("  POST /v1/approve                    - Approve spender");
    info!("  POST /v1/transfer-from              - Spend allowance");
    info!("  POST /v1/unlock/:pool               - Release vested tokens");
    info!("  GET  /v1/vesting/:pool              - Pool schedule & progress");
    info!("  GET  /v1/events?since=&limit=       - Event log page");
    info!("  GET  /v1/stats                      - Session statistics");
    info!("  GET  /v1/health                     - Health check");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 Shutdown signal received, exporting telemetry...");
    let stats = telemetry_for_shutdown.get_stats();
    info!("   Transfers: {} ({} rejected)", stats.transfers, stats.rejected_transfers);
    info!("   Swaps: {} ({} failed)", stats.swaps, stats.failed_swaps);
    info!("   Unlocks: {}", stats.unlocks);

    match telemetry_for_shutdown.export_stats_json() {
        Ok(path) => info!("   ✅ Stats exported to: {}", path.display()),
        Err(e) => warn!("   ⚠️ Failed to export stats: {}", e),
    }

    info!("👋 ABC Ledger API shutdown complete");
    Ok(())
}
