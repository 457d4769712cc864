//! ABC Ledger Library
//!
//! Accounting core of a fee-on-transfer token:
//! - Ledger with per-transfer dev / buy-back / liquidity fees
//! - Anti-bot cooldown between transfers
//! - Liquidity accumulator with a re-entrancy locked swap-and-liquify
//! - Six-pool vesting registry with breakpoint release tables

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::scenario::{run_scenario, Scenario, ScenarioReport, Step};
pub use crate::core::token::Token;
pub use models::config::{ApiConfig, DeploymentConfig};
pub use models::errors::{ErrorCode, LedgerError, LedgerResult};
pub use models::types::{LedgerEvent, PoolId, SwapOutcome, TransferReceipt};
pub use providers::router::{ConstantProductRouter, Router, TokenGateway};
pub use utils::clock::{Clock, ManualClock, SystemClock};
pub use utils::telemetry::{LedgerTelemetry, TelemetryStats};
