//! Constants Module - Single Source of Truth
//!
//! Every fixture value of the ABC deployment lives here: token metadata,
//! well-known addresses, fee rates, cooldown, swap threshold and the six
//! vesting tables. Other modules read these through `DeploymentConfig`.

use alloy_primitives::{address, Address, U256};

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "ABCLedger";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// TOKEN METADATA
// ============================================

pub const TOKEN_NAME: &str = "ABCToken";
pub const TOKEN_SYMBOL: &str = "ABC";
pub const TOKEN_DECIMALS: u8 = 8;

/// 10^8, one whole ABC in smallest units
pub const TOKEN_UNIT: u64 = 100_000_000;

/// Total supply in whole tokens (100M ABC)
pub const TOTAL_SUPPLY_TOKENS: u64 = 100_000_000;

// ============================================
// FEES (tenths of a percent, 36 = 3.6%)
// ============================================

/// Denominator for every fee rate
pub const FEE_DENOMINATOR: u64 = 1_000;

pub const DEV_TOKEN_FEE: u64 = 36;
pub const DEV_BASE_FEE: u64 = 0;
pub const BUY_BACK_FEE: u64 = 0;
pub const LIQUIDITY_FEE: u64 = 24;

// ============================================
// ANTI-BOT / LIQUIDITY
// ============================================

/// Minimum seconds between two transfers from the same non-excluded sender
pub const MIN_TRANSFER_INTERVAL_SECS: u64 = 10;

/// Contract self-balance (whole tokens) that triggers swap-and-liquify
pub const SWAP_THRESHOLD_TOKENS: u64 = 5_000;

/// Deadline offset handed to the router for add-liquidity
pub const LIQUIDITY_DEADLINE_SECS: u64 = 300;

/// Pair seed used by the API server: tokens from the owner (whole ABC)
pub const DEMO_SEED_TOKENS: u64 = 1_000_000;

/// Pair seed used by the API server: base currency in wei (100 units at 18 decimals)
pub const DEMO_SEED_BASE_WEI: u128 = 100_000_000_000_000_000_000;

/// Events retained in memory before the oldest are dropped
pub const EVENT_LOG_CAPACITY: usize = 10_000;

/// `GET /v1/events` page size when `limit` is absent, and its ceiling
pub const EVENTS_PAGE_DEFAULT: usize = 100;
pub const EVENTS_PAGE_MAX: usize = 1_000;

/// Writes per account per rate window on the HTTP surface
pub const ACCOUNT_WRITES_PER_WINDOW: u32 = 30;

/// Requests per client IP per rate window
pub const IP_REQUESTS_PER_WINDOW: u32 = 120;

pub const RATE_WINDOW_SECS: u64 = 60;

// ============================================
// TIME
// ============================================

pub const DAY_SECS: u64 = 24 * 60 * 60;

/// Vesting month, fixed at 30 days
pub const MONTH_SECS: u64 = 30 * DAY_SECS;

// ============================================
// WELL-KNOWN ADDRESSES
// ============================================

/// Deployer / owner, fee-excluded
pub const DEFAULT_OWNER: Address = address!("5B38Da6a701c568545dCfcB03FcB875f56beddC4");

/// Dev wallet receiving the token-denominated dev fee
pub const DEV_ADDRESS: Address = address!("6148E01353EF1104bA85DDe9B60675A9D61B61A1");

/// Buy-back wallet
pub const BUY_BACK_ADDRESS: Address = address!("Ab8483F64d9C6d1EcF9b849Ae677dD3315835cb2");

/// The token contract itself; holds liquidity fees until swap-and-liquify
pub const CONTRACT_ADDRESS: Address = address!("abc0000000000000000000000000000000000abc");

/// Escrow holding unreleased vesting allocations
pub const VESTING_VAULT_ADDRESS: Address = address!("abc000000000000000000000000000000000fe57");

/// ABC/base-currency AMM pair
pub const PAIR_ADDRESS: Address = address!("abc0000000000000000000000000000000000a11");

/// Uniswap V2 compatible router
pub const ROUTER_ADDRESS: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");

/// Wrapped base currency
pub const WRAPPED_BASE_ADDRESS: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

pub const CORE_TEAM_BENEFICIARY: Address = address!("4B20993Bc481177ec7E8f571ceCaE8A9e22C02db");
pub const ADVISORS_BENEFICIARY: Address = address!("78731D3Ca6b7E34aC0F824c42a7cC18A495cabaB");
pub const RESERVE_BENEFICIARY: Address = address!("617F2E2fD72FD9D5503197092aC168c91465E7f2");
pub const STAKING_BENEFICIARY: Address = address!("17F6AD8Ef982297579C203069C1DbfFE4348c372");
pub const ECOSYSTEM_BENEFICIARY: Address = address!("5c6B0f7Bf3E7ce046039Bd8FABdfD3f9F5021678");
pub const PLAY_TO_EARN_BENEFICIARY: Address =
    address!("03C6FcED478cBbC9a4FAB34eF9f40767739D1Ff7");

// ============================================
// VESTING TABLES
// (elapsed months, cumulative whole tokens)
// ============================================

pub const CORE_TEAM_SCHEDULE: &[(u64, u64)] =
    &[(14, 5_000_000), (20, 10_000_000), (36, 15_000_000)];

pub const ADVISORS_SCHEDULE: &[(u64, u64)] = &[(6, 1_000_000), (12, 2_500_000), (24, 5_000_000)];

pub const RESERVE_SCHEDULE: &[(u64, u64)] = &[
    (12, 2_500_000),
    (24, 5_000_000),
    (36, 7_500_000),
    (48, 10_000_000),
];

pub const STAKING_SCHEDULE: &[(u64, u64)] = &[
    (1, 2_000_000),
    (6, 8_000_000),
    (12, 14_000_000),
    (24, 20_000_000),
];

pub const ECOSYSTEM_SCHEDULE: &[(u64, u64)] = &[(3, 2_000_000), (9, 5_000_000), (18, 10_000_000)];

pub const PLAY_TO_EARN_SCHEDULE: &[(u64, u64)] = &[
    (1, 2_500_000),
    (12, 12_500_000),
    (24, 20_000_000),
    (36, 25_000_000),
];

// ============================================
// CONVERSION HELPERS
// ============================================

/// Whole tokens -> smallest units
#[inline]
pub fn tokens(whole: u64) -> U256 {
    U256::from(whole) * U256::from(TOKEN_UNIT)
}

/// Smallest units -> whole tokens (display only, truncates)
pub fn to_whole_tokens(amount: U256) -> f64 {
    let whole: u128 = (amount / U256::from(TOKEN_UNIT)).try_into().unwrap_or(u128::MAX);
    let frac: u128 = (amount % U256::from(TOKEN_UNIT)).try_into().unwrap_or(0);
    whole as f64 + frac as f64 / TOKEN_UNIT as f64
}

/// Whole months elapsed between two deployment-relative instants
#[inline]
pub fn elapsed_months(start: u64, now: u64) -> u64 {
    now.saturating_sub(start) / MONTH_SECS
}
