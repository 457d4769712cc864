//! Telemetry Module for the ABC ledger
//!
//! Counts what the ledger did during a session:
//! - Transfers accepted / rejected (by error code)
//! - Fees collected per bucket
//! - Swap-and-liquify runs and isolated router failures
//! - Vesting unlocks and tokens released

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::models::errors::ErrorCode;
use crate::models::types::FeeSplit;
use crate::utils::constants::to_whole_tokens;

/// Aggregated statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryStats {
    pub transfers: u64,
    pub rejected_transfers: u64,
    /// Rejections keyed by error code string
    pub rejections_by_code: HashMap<String, u64>,
    /// Whole-token totals per fee bucket
    pub dev_fees_collected: f64,
    pub buy_back_fees_collected: f64,
    pub liquidity_fees_collected: f64,
    pub swaps: u64,
    pub failed_swaps: u64,
    pub unlocks: u64,
    pub tokens_released: f64,
    pub period_start: u64,
    pub period_end: u64,
}

impl TelemetryStats {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{:.8},{:.8},{},{},{}\n",
            self.period_start,
            self.period_end,
            self.transfers,
            self.rejected_transfers,
            self.dev_fees_collected,
            self.liquidity_fees_collected,
            self.swaps,
            self.failed_swaps,
            self.unlocks,
        )
    }
}

#[derive(Default)]
struct FeeTotals {
    dev: U256,
    buy_back: U256,
    liquidity: U256,
    released: U256,
}

/// Session telemetry collector
pub struct LedgerTelemetry {
    transfers: AtomicU64,
    rejected: AtomicU64,
    swaps: AtomicU64,
    failed_swaps: AtomicU64,
    unlocks: AtomicU64,
    totals: RwLock<FeeTotals>,
    rejections: RwLock<HashMap<ErrorCode, u64>>,
    session_start: u64,
    export_dir: PathBuf,
}

impl LedgerTelemetry {
    pub fn new() -> Self {
        Self::with_export_dir(PathBuf::from("./telemetry"))
    }

    pub fn with_export_dir(export_dir: PathBuf) -> Self {
        Self {
            transfers: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            swaps: AtomicU64::new(0),
            failed_swaps: AtomicU64::new(0),
            unlocks: AtomicU64::new(0),
            totals: RwLock::new(FeeTotals::default()),
            rejections: RwLock::new(HashMap::new()),
            session_start: current_timestamp(),
            export_dir,
        }
    }

    pub fn record_transfer(&self, fees: &FeeSplit) {
        self.transfers.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut totals) = self.totals.write() {
            totals.dev = totals.dev.saturating_add(fees.dev_token);
            totals.buy_back = totals.buy_back.saturating_add(fees.buy_back);
            totals.liquidity = totals.liquidity.saturating_add(fees.liquidity);
        }
    }

    pub fn record_rejection(&self, code: ErrorCode) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut counts) = self.rejections.write() {
            *counts.entry(code).or_insert(0) += 1;
        }
    }

    pub fn record_swap(&self, succeeded: bool) {
        if succeeded {
            self.swaps.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_swaps.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_unlock(&self, amount: U256) {
        self.unlocks.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut totals) = self.totals.write() {
            totals.released = totals.released.saturating_add(amount);
        }
    }

    pub fn get_stats(&self) -> TelemetryStats {
        let (dev, buy_back, liquidity, released) = self
            .totals
            .read()
            .map(|t| {
                (
                    to_whole_tokens(t.dev),
                    to_whole_tokens(t.buy_back),
                    to_whole_tokens(t.liquidity),
                    to_whole_tokens(t.released),
                )
            })
            .unwrap_or_default();

        let rejections_by_code = self
            .rejections
            .read()
            .map(|counts| {
                counts
                    .iter()
                    .map(|(code, n)| (code.as_str().to_string(), *n))
                    .collect()
            })
            .unwrap_or_default();

        TelemetryStats {
            transfers: self.transfers.load(Ordering::Relaxed),
            rejected_transfers: self.rejected.load(Ordering::Relaxed),
            rejections_by_code,
            dev_fees_collected: dev,
            buy_back_fees_collected: buy_back,
            liquidity_fees_collected: liquidity,
            swaps: self.swaps.load(Ordering::Relaxed),
            failed_swaps: self.failed_swaps.load(Ordering::Relaxed),
            unlocks: self.unlocks.load(Ordering::Relaxed),
            tokens_released: released,
            period_start: self.session_start,
            period_end: current_timestamp(),
        }
    }

    /// Export current stats to a timestamped JSON file
    pub fn export_stats_json(&self) -> Result<PathBuf, std::io::Error> {
        fs::create_dir_all(&self.export_dir)?;
        let stats = self.get_stats();
        let path = self
            .export_dir
            .join(format!("ledger_stats_{}.json", current_timestamp()));

        let json = serde_json::to_string_pretty(&stats)?;
        fs::write(&path, json)?;

        Ok(path)
    }

    /// Append stats to the CSV history
    pub fn export_stats_csv(&self) -> Result<PathBuf, std::io::Error> {
        fs::create_dir_all(&self.export_dir)?;
        let stats = self.get_stats();
        let path = self.export_dir.join("ledger_history.csv");

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if file.metadata()?.len() == 0 {
            writeln!(
                file,
                "period_start,period_end,transfers,rejected,dev_fees,liquidity_fees,swaps,failed_swaps,unlocks"
            )?;
        }
        write!(file, "{}", stats.to_csv_row())?;

        Ok(path)
    }
}

impl Default for LedgerTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

fn current_timestamp() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
