//! API Request Handlers

use alloy_primitives::{Address, U256};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::middleware::{AccountLimiter, Admission};
use super::types::*;
use crate::core::token::Token;
use crate::models::config::DeploymentConfig;
use crate::models::errors::{LedgerError, LedgerResult};
use crate::models::types::PoolId;
use crate::providers::router::ConstantProductRouter;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::constants::{to_whole_tokens, EVENTS_PAGE_DEFAULT, EVENTS_PAGE_MAX};
use crate::utils::telemetry::LedgerTelemetry;

/// Token served by the API
pub type ApiToken<C = SystemClock> = Token<ConstantProductRouter, C>;

type ApiFailure = (StatusCode, Json<ApiResponse<()>>);
type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiFailure>;

/// Shared application state
pub struct AppState<C: Clock = SystemClock> {
    /// One lock: calls are observed strictly in sequence
    pub token: Mutex<ApiToken<C>>,
    pub telemetry: Arc<LedgerTelemetry>,
    /// Write budget per sending account
    pub accounts: Arc<AccountLimiter>,
    pub start_time: Instant,
}

impl AppState<SystemClock> {
    pub fn new(config: &DeploymentConfig, telemetry: Arc<LedgerTelemetry>) -> LedgerResult<Self> {
        let token = Token::with_pair_router(config, SystemClock)?;
        Ok(Self::with_token(token, telemetry))
    }
}

impl<C: Clock> AppState<C> {
    pub fn with_token(token: ApiToken<C>, telemetry: Arc<LedgerTelemetry>) -> Self {
        Self {
            token: Mutex::new(token.with_telemetry(telemetry.clone())),
            telemetry,
            accounts: Arc::new(AccountLimiter::default()),
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn latency(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn bad_request(message: impl Into<String>, start: Instant) -> ApiFailure {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(ApiError::bad_request(message), latency(start))),
    )
}

fn ledger_failure(err: &LedgerError, start: Instant) -> ApiFailure {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(ApiError::from(err), latency(start))),
    )
}

fn admit<C: Clock>(state: &AppState<C>, account: Address, start: Instant) -> Result<(), ApiFailure> {
    match state.accounts.check(account) {
        Admission::Allowed { .. } => Ok(()),
        Admission::Limited { retry_after_secs } => {
            warn!(account = %account, "Account write limit exceeded");
            Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(ApiResponse::error(
                    ApiError::rate_limited(retry_after_secs),
                    latency(start),
                )),
            ))
        }
    }
}

fn parse_address(raw: &str, field: &str, start: Instant) -> Result<Address, ApiFailure> {
    raw.trim()
        .parse()
        .map_err(|_| bad_request(format!("Invalid {} address format", field), start))
}

/// Decimal or 0x-prefixed hex, smallest units
fn parse_amount(raw: &str, start: Instant) -> Result<U256, ApiFailure> {
    raw.trim()
        .parse()
        .map_err(|_| bad_request("Invalid amount, expected an integer in smallest units", start))
}

fn parse_pool(raw: &str, start: Instant) -> Result<PoolId, ApiFailure> {
    raw.parse::<PoolId>()
        .map_err(|e| ledger_failure(&e, start))
}

// ============================================
// Health Check
// ============================================

pub async fn health_check<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, latency(start)))
}

// ============================================
// Token Views
// ============================================

pub async fn token_info<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
) -> Json<ApiResponse<TokenInfoData>> {
    let start = Instant::now();
    let token = state.token.lock().await;

    let data = TokenInfoData {
        name: token.name().to_string(),
        symbol: token.symbol().to_string(),
        decimals: token.decimals(),
        total_supply: token.total_supply(),
        owner: token.owner(),
        contract: token.contract_address(),
        pair: token.pair_address(),
        router: token.router_address(),
        wrapped_base: token.wrapped_base_address(),
        vesting_vault: token.vesting_vault(),
        swap_threshold: token.swap_threshold(),
        cooldown_secs: token.cooldown().min_interval(),
        contract_balance: token.balance_of(&token.contract_address()),
        base_currency_balance: token.base_currency_balance(),
        dev_base_fee_accrued: token.dev_base_fee_accrued(),
        seconds_since_deploy: token.elapsed(),
    };

    Json(ApiResponse::success(data, latency(start)))
}

pub async fn get_balance<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
    Path(address): Path<String>,
) -> ApiResult<BalanceData> {
    let start = Instant::now();
    let address = parse_address(&address, "account", start)?;
    let balance = state.token.lock().await.balance_of(&address);

    Ok(Json(ApiResponse::success(
        BalanceData {
            address,
            balance,
            balance_tokens: to_whole_tokens(balance),
        },
        latency(start),
    )))
}

pub async fn get_allowance<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
    Path((owner, spender)): Path<(String, String)>,
) -> ApiResult<AllowanceData> {
    let start = Instant::now();
    let owner = parse_address(&owner, "owner", start)?;
    let spender = parse_address(&spender, "spender", start)?;
    let allowance = state.token.lock().await.allowance(&owner, &spender);

    Ok(Json(ApiResponse::success(
        AllowanceData {
            owner,
            spender,
            allowance,
        },
        latency(start),
    )))
}

// ============================================
// Transfers
// ============================================

pub async fn transfer<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<TransferData> {
    let start = Instant::now();
    let from = parse_address(&req.from, "from", start)?;
    let to = parse_address(&req.to, "to", start)?;
    let amount = parse_amount(&req.amount, start)?;
    admit(&state, from, start)?;

    let receipt = state
        .token
        .lock()
        .await
        .transfer(from, to, amount)
        .map_err(|e| ledger_failure(&e, start))?;

    info!(from = %from, to = %to, amount = %amount, "💸 Transfer via API");
    Ok(Json(ApiResponse::success(receipt.into(), latency(start))))
}

pub async fn transfer_from<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
    Json(req): Json<TransferFromRequest>,
) -> ApiResult<TransferData> {
    let start = Instant::now();
    let spender = parse_address(&req.spender, "spender", start)?;
    let from = parse_address(&req.from, "from", start)?;
    let to = parse_address(&req.to, "to", start)?;
    let amount = parse_amount(&req.amount, start)?;
    admit(&state, from, start)?;

    let receipt = state
        .token
        .lock()
        .await
        .transfer_from(spender, from, to, amount)
        .map_err(|e| ledger_failure(&e, start))?;

    Ok(Json(ApiResponse::success(receipt.into(), latency(start))))
}

pub async fn approve<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
    Json(req): Json<ApproveRequest>,
) -> ApiResult<AllowanceData> {
    let start = Instant::now();
    let owner = parse_address(&req.owner, "owner", start)?;
    let spender = parse_address(&req.spender, "spender", start)?;
    let amount = parse_amount(&req.amount, start)?;
    admit(&state, owner, start)?;

    let mut token = state.token.lock().await;
    token
        .approve(owner, spender, amount)
        .map_err(|e| ledger_failure(&e, start))?;

    Ok(Json(ApiResponse::success(
        AllowanceData {
            owner,
            spender,
            allowance: token.allowance(&owner, &spender),
        },
        latency(start),
    )))
}

// ============================================
// Vesting
// ============================================

pub async fn unlock<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
    Path(pool): Path<String>,
    Json(req): Json<UnlockRequest>,
) -> ApiResult<UnlockData> {
    let start = Instant::now();
    let pool = parse_pool(&pool, start)?;
    let caller = parse_address(&req.caller, "caller", start)?;
    admit(&state, caller, start)?;

    let released = state
        .token
        .lock()
        .await
        .unlock(caller, pool)
        .map_err(|e| {
            warn!(pool = %pool, code = e.code_str(), "Unlock via API rejected");
            ledger_failure(&e, start)
        })?;

    Ok(Json(ApiResponse::success(
        UnlockData { pool, released },
        latency(start),
    )))
}

pub async fn get_vesting<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
    Path(pool): Path<String>,
) -> ApiResult<VestingData> {
    let start = Instant::now();
    let pool = parse_pool(&pool, start)?;

    let token = state.token.lock().await;
    let data = token
        .pool(pool)
        .and_then(|p| Ok(VestingData::new(p, token.unlockable(pool)?)))
        .map_err(|e| ledger_failure(&e, start))?;

    Ok(Json(ApiResponse::success(data, latency(start))))
}

// ============================================
// Events & Stats
// ============================================

/// One page of the event log, oldest first
pub async fn get_events<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
    Query(query): Query<EventsQuery>,
) -> Json<ApiResponse<EventsData>> {
    let start = Instant::now();
    let limit = query
        .limit
        .unwrap_or(EVENTS_PAGE_DEFAULT)
        .clamp(1, EVENTS_PAGE_MAX);
    let page = state
        .token
        .lock()
        .await
        .events_page(query.since.unwrap_or(0), limit);

    Json(ApiResponse::success(page.into(), latency(start)))
}

pub async fn get_stats<C: Clock>(
    State(state): State<Arc<AppState<C>>>,
) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();
    let stats = state.telemetry.get_stats();

    let data = StatsData {
        transfers: stats.transfers,
        rejected_transfers: stats.rejected_transfers,
        dev_fees_collected: stats.dev_fees_collected,
        liquidity_fees_collected: stats.liquidity_fees_collected,
        swaps: stats.swaps,
        failed_swaps: stats.failed_swaps,
        unlocks: stats.unlocks,
        tokens_released: stats.tokens_released,
        uptime_seconds: state.uptime_seconds(),
        api_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Json(ApiResponse::success(data, latency(start)))
}
