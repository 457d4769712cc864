//! Deployment configuration for the ABC ledger
//!
//! Defaults come from utils/constants.rs. A JSON file named by
//! `ABC_LEDGER_CONFIG` may override any field; every loaded config is
//! validated before a token is built from it.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use tracing::{info, warn};

use super::errors::{ErrorCode, LedgerError, LedgerResult};
use super::types::{PoolId, UnlockPolicy};
use crate::core::fees::FeeRates;
use crate::core::vesting::{Breakpoint, ReleaseSchedule};
use crate::utils::constants::*;

/// Env var naming a JSON deployment file
pub const CONFIG_ENV: &str = "ABC_LEDGER_CONFIG";

/// One vesting allocation as deployed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolConfig {
    pub id: PoolId,
    pub beneficiary: Address,
    pub schedule: Vec<Breakpoint>,
}

impl PoolConfig {
    /// Build from a (month, whole tokens) fixture table
    pub fn from_table(id: PoolId, beneficiary: Address, table: &[(u64, u64)]) -> Self {
        Self {
            id,
            beneficiary,
            schedule: table
                .iter()
                .map(|&(month, whole)| Breakpoint {
                    month,
                    cumulative: tokens(whole),
                })
                .collect(),
        }
    }

    /// Allocation total (last breakpoint)
    pub fn total(&self) -> U256 {
        self.schedule
            .last()
            .map(|b| b.cumulative)
            .unwrap_or_default()
    }
}

/// Everything fixed at deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    /// Deployer; receives the unallocated supply and the LP tokens
    pub owner: Address,
    /// The token's own address (liquidity fee accumulator)
    pub contract: Address,
    pub dev_address: Address,
    pub buy_back_address: Address,
    pub vesting_vault: Address,
    pub pair: Address,
    pub router: Address,
    pub wrapped_base: Address,
    pub fee_rates: FeeRates,
    /// Fee/cooldown exempt accounts besides owner and contract
    pub fee_excluded: Vec<Address>,
    pub cooldown_secs: u64,
    pub swap_threshold: U256,
    pub unlock_policy: UnlockPolicy,
    pub pools: Vec<PoolConfig>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: TOKEN_DECIMALS,
            total_supply: tokens(TOTAL_SUPPLY_TOKENS),
            owner: DEFAULT_OWNER,
            contract: CONTRACT_ADDRESS,
            dev_address: DEV_ADDRESS,
            buy_back_address: BUY_BACK_ADDRESS,
            vesting_vault: VESTING_VAULT_ADDRESS,
            pair: PAIR_ADDRESS,
            router: ROUTER_ADDRESS,
            wrapped_base: WRAPPED_BASE_ADDRESS,
            fee_rates: FeeRates::default(),
            fee_excluded: Vec::new(),
            cooldown_secs: MIN_TRANSFER_INTERVAL_SECS,
            swap_threshold: tokens(SWAP_THRESHOLD_TOKENS),
            unlock_policy: UnlockPolicy::default(),
            pools: default_pools(),
        }
    }
}

/// The six fixture allocations
pub fn default_pools() -> Vec<PoolConfig> {
    vec![
        PoolConfig::from_table(PoolId::CoreTeam, CORE_TEAM_BENEFICIARY, CORE_TEAM_SCHEDULE),
        PoolConfig::from_table(PoolId::Advisors, ADVISORS_BENEFICIARY, ADVISORS_SCHEDULE),
        PoolConfig::from_table(PoolId::Reserve, RESERVE_BENEFICIARY, RESERVE_SCHEDULE),
        PoolConfig::from_table(PoolId::Staking, STAKING_BENEFICIARY, STAKING_SCHEDULE),
        PoolConfig::from_table(PoolId::Ecosystem, ECOSYSTEM_BENEFICIARY, ECOSYSTEM_SCHEDULE),
        PoolConfig::from_table(
            PoolId::PlayToEarn,
            PLAY_TO_EARN_BENEFICIARY,
            PLAY_TO_EARN_SCHEDULE,
        ),
    ]
}

impl DeploymentConfig {
    /// Fixture deployment without vesting pools: the owner holds the whole supply
    pub fn without_pools() -> Self {
        Self {
            pools: Vec::new(),
            ..Self::default()
        }
    }

    /// Load from `ABC_LEDGER_CONFIG` if set, else the fixture deployment
    pub fn load() -> LedgerResult<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => {
                info!("⚙️ {} not set, using fixture deployment", CONFIG_ENV);
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        info!(path = %path.display(), "⚙️ Deployment config loaded");
        Ok(config)
    }

    pub fn from_json(raw: &str) -> LedgerResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Sum of all pool allocations
    pub fn allocated_to_pools(&self) -> U256 {
        self.pools
            .iter()
            .fold(U256::ZERO, |acc, p| acc.saturating_add(p.total()))
    }

    /// Reject anything a token cannot be deployed with
    pub fn validate(&self) -> LedgerResult<()> {
        let required = [
            ("owner", self.owner),
            ("contract", self.contract),
            ("dev_address", self.dev_address),
            ("buy_back_address", self.buy_back_address),
            ("vesting_vault", self.vesting_vault),
            ("pair", self.pair),
        ];
        for (field, address) in required {
            if address == Address::ZERO {
                return Err(LedgerError::invalid_config(format!(
                    "{} must not be the zero address",
                    field
                )));
            }
        }

        if self.owner == self.vesting_vault {
            return Err(LedgerError::invalid_config(
                "owner must differ from the vesting vault",
            ));
        }

        if self.contract == self.vesting_vault || self.contract == self.pair {
            return Err(LedgerError::invalid_config(
                "contract address must differ from vesting vault and pair",
            ));
        }

        if self.total_supply.is_zero() {
            return Err(LedgerError::invalid_config("total_supply must be positive"));
        }

        if self.swap_threshold.is_zero() {
            return Err(LedgerError::invalid_config("swap_threshold must be positive"));
        }

        self.fee_rates.validate()?;

        let mut seen = HashSet::new();
        for pool in &self.pools {
            if !seen.insert(pool.id) {
                return Err(LedgerError::invalid_schedule(format!(
                    "pool {} configured twice",
                    pool.id
                )));
            }
            if pool.beneficiary == Address::ZERO {
                return Err(LedgerError::invalid_config(format!(
                    "pool {} beneficiary must not be the zero address",
                    pool.id
                )));
            }
            ReleaseSchedule::new(pool.schedule.clone())?;
        }

        let allocated = self.allocated_to_pools();
        if allocated > self.total_supply {
            // Tables written in 18-decimal units against an 8-decimal supply land here
            warn!(
                allocated = %allocated,
                total_supply = %self.total_supply,
                "Vesting tables exceed total supply, check token units"
            );
            return Err(LedgerError::new(
                ErrorCode::ScheduleExceedsSupply,
                format!(
                    "vesting allocations {} exceed total supply {} (unit mismatch?)",
                    allocated, self.total_supply
                ),
            ));
        }

        Ok(())
    }
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl ApiConfig {
    /// `ABC_LEDGER_HOST`, then `PORT` or `ABC_LEDGER_PORT`
    pub fn from_env() -> Self {
        let host = std::env::var("ABC_LEDGER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("ABC_LEDGER_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        Self { host, port }
    }

    pub fn socket_addr(&self) -> LedgerResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| {
                LedgerError::invalid_config(format!(
                    "invalid listen address {}:{}",
                    self.host, self.port
                ))
            })
    }
}
