//! API Request/Response Types

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::core::events::EventPage;
use crate::core::vesting::{AllocationPool, Breakpoint};
use crate::models::errors::LedgerError;
use crate::models::types::{FeeSplit, LedgerEvent, PoolId, PoolState, SwapOutcome, TransferReceipt};
use crate::utils::constants::to_whole_tokens;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            code: "RATE_LIMITED".to_string(),
            message: "too many writes from this account".to_string(),
            details: Some(format!("retry after {}s", retry_after_secs)),
        }
    }
}

impl From<&LedgerError> for ApiError {
    fn from(err: &LedgerError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: err.code.is_retryable().then(|| "retryable".to_string()),
        }
    }
}

// ============================================
// Token
// ============================================

#[derive(Debug, Serialize)]
pub struct TokenInfoData {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub owner: Address,
    pub contract: Address,
    pub pair: Address,
    pub router: Address,
    pub wrapped_base: Address,
    pub vesting_vault: Address,
    pub swap_threshold: U256,
    pub cooldown_secs: u64,
    pub contract_balance: U256,
    pub base_currency_balance: U256,
    pub dev_base_fee_accrued: U256,
    pub seconds_since_deploy: u64,
}

#[derive(Debug, Serialize)]
pub struct BalanceData {
    pub address: Address,
    pub balance: U256,
    pub balance_tokens: f64,
}

#[derive(Debug, Serialize)]
pub struct AllowanceData {
    pub owner: Address,
    pub spender: Address,
    pub allowance: U256,
}

// ============================================
// Transfers
// ============================================

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    /// Smallest units, decimal or 0x-hex
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferFromRequest {
    pub spender: String,
    pub from: String,
    pub to: String,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub owner: String,
    pub spender: String,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct TransferData {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub fees: FeeSplit,
    pub swap: SwapOutcome,
}

impl From<TransferReceipt> for TransferData {
    fn from(receipt: TransferReceipt) -> Self {
        Self {
            from: receipt.from,
            to: receipt.to,
            amount: receipt.amount,
            fees: receipt.fees,
            swap: receipt.swap,
        }
    }
}

// ============================================
// Vesting
// ============================================

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    pub caller: String,
}

#[derive(Debug, Serialize)]
pub struct UnlockData {
    pub pool: PoolId,
    pub released: U256,
}

#[derive(Debug, Serialize)]
pub struct VestingData {
    pub pool: PoolId,
    pub beneficiary: Address,
    pub state: PoolState,
    pub total: U256,
    pub released: U256,
    pub unlockable_now: U256,
    pub released_percent: f64,
    pub schedule: Vec<Breakpoint>,
}

impl VestingData {
    pub fn new(pool: &AllocationPool, unlockable_now: U256) -> Self {
        let total = to_whole_tokens(pool.total);
        let released_percent = if total > 0.0 {
            to_whole_tokens(pool.released) / total * 100.0
        } else {
            0.0
        };
        Self {
            pool: pool.id,
            beneficiary: pool.beneficiary,
            state: pool.state,
            total: pool.total,
            released: pool.released,
            unlockable_now,
            released_percent,
            schedule: pool.schedule.breakpoints().to_vec(),
        }
    }
}

// ============================================
// Stats / Health
// ============================================

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub transfers: u64,
    pub rejected_transfers: u64,
    pub dev_fees_collected: f64,
    pub liquidity_fees_collected: f64,
    pub swaps: u64,
    pub failed_swaps: u64,
    pub unlocks: u64,
    pub tokens_released: f64,
    pub uptime_seconds: u64,
    pub api_version: String,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// `GET /v1/events?since=&limit=`
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub since: Option<u64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EventsData {
    pub from: u64,
    /// Pass as `since` to continue
    pub next: u64,
    /// Events before `from` were already dropped
    pub truncated: bool,
    pub count: usize,
    pub events: Vec<LedgerEvent>,
}

impl From<EventPage> for EventsData {
    fn from(page: EventPage) -> Self {
        Self {
            from: page.from,
            next: page.next,
            truncated: page.truncated,
            count: page.events.len(),
            events: page.events,
        }
    }
}
