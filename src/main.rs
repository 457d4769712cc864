//! ABC Ledger - scenario replayer
//!
//! Usage:
//!   abc_ledger <scenario.json>
//!
//! Replays the scenario's steps against an in-memory token and prints each
//! step outcome, the event log and session statistics.
//!
//! Environment:
//!   RUST_LOG - Log level (default: info)

use abc_ledger::{run_scenario, Scenario};

use eyre::{eyre, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| eyre!("usage: abc_ledger <scenario.json>"))?;

    let scenario = Scenario::from_file(&path)?;
    info!(path = %path, steps = scenario.steps.len(), "📄 Scenario loaded");

    let report = run_scenario(&scenario)?;

    println!("\n📋 Steps:");
    for outcome in &report.outcomes {
        match (&outcome.error_code, &outcome.message) {
            (Some(code), Some(message)) => {
                println!("   ❌ #{:<3} {:<15} [{}] {}", outcome.index, outcome.op, code, message)
            }
            _ => println!("   ✅ #{:<3} {}", outcome.index, outcome.op),
        }
    }

    println!("\n📜 Events ({}):", report.events.len());
    for event in &report.events {
        println!("   {}", serde_json::to_string(event)?);
    }

    let stats = &report.stats;
    println!("\n📊 Statistics:");
    println!("   Transfers:         {}", stats.transfers);
    println!("   Rejected:          {}", stats.rejected_transfers);
    println!("   Dev fees:          {:.8} ABC", stats.dev_fees_collected);
    println!("   Liquidity fees:    {:.8} ABC", stats.liquidity_fees_collected);
    println!("   Swaps (failed):    {} ({})", stats.swaps, stats.failed_swaps);
    println!("   Unlocks:           {}", stats.unlocks);
    println!("   Tokens released:   {:.8} ABC", stats.tokens_released);

    if report.total_supply != report.sum_of_balances {
        return Err(eyre!(
            "conservation violated: supply {} != balances {}",
            report.total_supply,
            report.sum_of_balances
        ));
    }
    println!("\n   ⚖️  Σ balances == total supply ({})", report.total_supply);

    Ok(())
}
