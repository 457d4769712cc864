//! Vesting Registry
//!
//! Six allocation pools share one release algorithm; only their breakpoint
//! tables differ. Elapsed time is counted in whole 30-day months from the
//! deployment instant.
//!
//! Unlock algorithm:
//! 1. `elapsed` = whole months since deployment
//! 2. Before the first breakpoint -> `TooSoon`
//! 3. `cumulative` = amount at the greatest breakpoint <= elapsed
//! 4. `delta = cumulative - released`; zero -> `NothingToUnlock`
//! 5. `released += delta`, vault pays `delta` to the beneficiary

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::config::PoolConfig;
use crate::models::errors::{LedgerError, LedgerResult};
use crate::models::types::{PoolId, PoolState, UnlockPolicy};
use crate::utils::constants::elapsed_months;

/// (elapsed months, cumulative unlockable amount)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub month: u64,
    pub cumulative: U256,
}

/// Validated breakpoint table: non-empty, strictly increasing in both fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseSchedule {
    breakpoints: Vec<Breakpoint>,
}

impl ReleaseSchedule {
    pub fn new(breakpoints: Vec<Breakpoint>) -> LedgerResult<Self> {
        let first = breakpoints
            .first()
            .ok_or_else(|| LedgerError::invalid_schedule("schedule has no breakpoints"))?;
        if first.cumulative.is_zero() {
            return Err(LedgerError::invalid_schedule(
                "first breakpoint must release a positive amount",
            ));
        }
        for pair in breakpoints.windows(2) {
            if pair[1].month <= pair[0].month {
                return Err(LedgerError::invalid_schedule(format!(
                    "breakpoint months must strictly increase ({} then {})",
                    pair[0].month, pair[1].month
                )));
            }
            if pair[1].cumulative <= pair[0].cumulative {
                return Err(LedgerError::invalid_schedule(format!(
                    "cumulative amounts must strictly increase (month {})",
                    pair[1].month
                )));
            }
        }
        Ok(Self { breakpoints })
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// First breakpoint month
    pub fn cliff(&self) -> u64 {
        self.breakpoints[0].month
    }

    /// Final cumulative amount == total allocation
    pub fn total(&self) -> U256 {
        self.breakpoints[self.breakpoints.len() - 1].cumulative
    }

    /// Cumulative amount unlockable at `elapsed` months; None before the cliff
    pub fn cumulative_at(&self, elapsed: u64) -> Option<U256> {
        self.breakpoints
            .iter()
            .take_while(|b| b.month <= elapsed)
            .last()
            .map(|b| b.cumulative.min(self.total()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationPool {
    pub id: PoolId,
    pub beneficiary: Address,
    pub total: U256,
    pub released: U256,
    pub state: PoolState,
    pub schedule: ReleaseSchedule,
}

impl AllocationPool {
    pub fn new(config: &PoolConfig) -> LedgerResult<Self> {
        let schedule = ReleaseSchedule::new(config.schedule.clone())?;
        Ok(Self {
            id: config.id,
            beneficiary: config.beneficiary,
            total: schedule.total(),
            released: U256::ZERO,
            state: PoolState::Locked,
            schedule,
        })
    }

    /// Newly releasable amount at `elapsed` months
    pub fn releasable(&self, elapsed: u64) -> LedgerResult<U256> {
        let cumulative = self
            .schedule
            .cumulative_at(elapsed)
            .ok_or_else(LedgerError::too_soon)?;
        let delta = cumulative.saturating_sub(self.released);
        if delta.is_zero() {
            return Err(LedgerError::nothing_to_unlock());
        }
        Ok(delta)
    }

    fn apply(&mut self, delta: U256) {
        self.released += delta;
        self.state = if self.released >= self.total {
            PoolState::FullyReleased
        } else {
            PoolState::Vesting
        };
    }
}

/// A checked release not yet written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRelease {
    pub pool: PoolId,
    pub beneficiary: Address,
    pub amount: U256,
}

#[derive(Debug, Clone)]
pub struct VestingRegistry {
    pools: BTreeMap<PoolId, AllocationPool>,
    /// Deployment instant, shared by every pool
    start: u64,
    policy: UnlockPolicy,
}

impl VestingRegistry {
    pub fn new(start: u64, policy: UnlockPolicy, configs: &[PoolConfig]) -> LedgerResult<Self> {
        let mut pools = BTreeMap::new();
        for config in configs {
            let pool = AllocationPool::new(config)?;
            if pools.insert(pool.id, pool).is_some() {
                return Err(LedgerError::invalid_schedule(format!(
                    "pool {} configured twice",
                    config.id
                )));
            }
        }
        Ok(Self {
            pools,
            start,
            policy,
        })
    }

    pub fn policy(&self) -> UnlockPolicy {
        self.policy
    }

    pub fn pool(&self, id: PoolId) -> LedgerResult<&AllocationPool> {
        self.pools
            .get(&id)
            .ok_or_else(|| LedgerError::unknown_pool(id.as_str()))
    }

    pub fn pools(&self) -> impl Iterator<Item = &AllocationPool> {
        self.pools.values()
    }

    pub fn total_allocated(&self) -> U256 {
        self.pools.values().fold(U256::ZERO, |acc, p| acc + p.total)
    }

    /// Released so far
    pub fn unlocked(&self, id: PoolId) -> LedgerResult<U256> {
        Ok(self.pool(id)?.released)
    }

    /// What an unlock at `now` would release, zero when it would fail
    pub fn unlockable(&self, id: PoolId, now: u64) -> LedgerResult<U256> {
        let pool = self.pool(id)?;
        Ok(pool
            .releasable(elapsed_months(self.start, now))
            .unwrap_or(U256::ZERO))
    }

    /// Validate an unlock without mutating anything
    pub fn prepare_unlock(
        &self,
        caller: &Address,
        id: PoolId,
        now: u64,
    ) -> LedgerResult<PendingRelease> {
        let pool = self.pool(id)?;
        if self.policy == UnlockPolicy::BeneficiaryOnly && *caller != pool.beneficiary {
            return Err(LedgerError::unauthorized(format!(
                "only the {} beneficiary can unlock",
                id
            )));
        }
        let amount = pool.releasable(elapsed_months(self.start, now))?;
        Ok(PendingRelease {
            pool: id,
            beneficiary: pool.beneficiary,
            amount,
        })
    }

    /// Record a release once the ledger credit succeeded. Returns the new total.
    pub fn commit(&mut self, release: &PendingRelease) -> LedgerResult<U256> {
        let pool = self
            .pools
            .get_mut(&release.pool)
            .ok_or_else(|| LedgerError::unknown_pool(release.pool.as_str()))?;
        pool.apply(release.amount);
        Ok(pool.released)
    }
}
