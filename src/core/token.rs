//! Transfer Orchestrator
//!
//! `Token` composes the ledger, fee policy, cooldown guard, liquidity
//! accumulator and vesting registry behind one ERC20-like surface.
//!
//! Transfer pipeline:
//! 1. Protected senders and cooldown check (non-excluded senders)
//! 2. Fee split, one ledger debit and up to four credits
//! 3. Trigger check on the contract's self-balance as it stood before this
//!    transfer's fee, so the transfer after the crossing is the one that swaps
//! 4. Optional swap-and-liquify through the router (best effort)
//!
//! Steps 1-2 are all or nothing. A router failure in step 4 never undoes them.
//!
//! The vesting vault only pays out through `unlock`, and the contract only
//! sends while its own swap holds the lock.
//!
//! The router gets `&mut TransferEngine` as its `TokenGateway` while `Token`
//! keeps the vesting registry, router and clock in separate fields.

use alloy_primitives::{Address, U256};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::cooldown::CooldownGuard;
use crate::core::events::{EventLog, EventPage};
use crate::core::fees::FeePolicy;
use crate::core::ledger::Ledger;
use crate::core::liquidity::{LiquidityAccumulator, Trigger};
use crate::core::vesting::{AllocationPool, VestingRegistry};
use crate::models::config::DeploymentConfig;
use crate::models::errors::{LedgerError, LedgerResult};
use crate::models::types::{
    FeeSplit, LedgerEvent, PoolId, SwapAndLiquify, SwapOutcome, TransferReceipt,
};
use crate::providers::router::{ConstantProductRouter, LiquidityReceipt, Router, TokenGateway};
use crate::utils::clock::Clock;
use crate::utils::constants::{to_whole_tokens, LIQUIDITY_DEADLINE_SECS};
use crate::utils::telemetry::LedgerTelemetry;

// ============================================
// TRANSFER ENGINE
// ============================================

/// Everything a transfer touches. Handed to the router as its gateway.
pub struct TransferEngine {
    ledger: Ledger,
    fees: FeePolicy,
    cooldown: CooldownGuard,
    accumulator: LiquidityAccumulator,
    events: EventLog,
    contract: Address,
    vesting_vault: Address,
    dev_address: Address,
    buy_back_address: Address,
    dev_base_accrued: U256,
    telemetry: Option<Arc<LedgerTelemetry>>,
    /// Deployment-relative seconds, fixed at call entry
    now: u64,
}

impl TransferEngine {
    /// Steps 1-3 of a transfer. Nested router moves are counted like any other.
    fn execute(&mut self, from: Address, to: Address, amount: U256) -> LedgerResult<(FeeSplit, Trigger)> {
        let result = self.apply(from, to, amount);
        if let Some(telemetry) = &self.telemetry {
            match &result {
                Ok((fees, _)) => telemetry.record_transfer(fees),
                Err(e) => telemetry.record_rejection(e.code),
            }
        }
        result
    }

    fn apply(&mut self, from: Address, to: Address, amount: U256) -> LedgerResult<(FeeSplit, Trigger)> {
        if from == Address::ZERO {
            return Err(LedgerError::zero_sender());
        }
        if to == Address::ZERO {
            return Err(LedgerError::zero_recipient());
        }
        if amount.is_zero() {
            return Err(LedgerError::zero_amount());
        }
        if from == self.vesting_vault {
            return Err(LedgerError::protected_account("vesting vault"));
        }
        if from == self.contract && !self.accumulator.is_swapping() {
            return Err(LedgerError::protected_account("contract"));
        }

        let guarded = !self.fees.is_excluded(&from);
        if guarded {
            self.cooldown.check(&from, self.now)?;
        }

        let split = self.fees.split(amount, &from, &to);
        let accrued = self
            .dev_base_accrued
            .checked_add(split.dev_base)
            .ok_or_else(|| LedgerError::overflow("dev base-currency accrual"))?;

        let credits: Vec<(Address, U256)> = [
            (to, split.recipient_amount),
            (self.dev_address, split.dev_token),
            (self.buy_back_address, split.buy_back),
            (self.contract, split.liquidity),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_zero())
        .collect();

        let self_balance = self.ledger.balance_of(&self.contract);
        self.ledger.distribute(from, &credits)?;

        // Committed from here on
        self.dev_base_accrued = accrued;
        if guarded {
            self.cooldown.record(from, self.now);
        }
        for (recipient, value) in credits {
            self.events.push(LedgerEvent::Transfer {
                from,
                to: recipient,
                value,
            });
        }

        debug!(
            from = %from,
            to = %to,
            amount = %amount,
            received = %split.recipient_amount,
            dev = %split.dev_token,
            liquidity = %split.liquidity,
            "Transfer applied"
        );

        let trigger = self.accumulator.evaluate(self_balance, &from);
        if trigger == Trigger::Locked {
            debug!(from = %from, "Swap in progress, trigger suppressed");
        }
        Ok((split, trigger))
    }
}

impl TokenGateway for TransferEngine {
    fn contract_address(&self) -> Address {
        self.contract
    }

    fn now(&self) -> u64 {
        self.now
    }

    fn balance_of(&self, account: &Address) -> U256 {
        self.ledger.balance_of(account)
    }

    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> LedgerResult<()> {
        self.execute(from, to, amount).map(|_| ())
    }

    fn receive_base(&mut self, amount: U256) -> LedgerResult<()> {
        self.accumulator.credit_base(amount)
    }

    fn pay_base(&mut self, amount: U256) -> LedgerResult<()> {
        self.accumulator.debit_base(amount)
    }
}

// ============================================
// TOKEN
// ============================================

pub struct Token<R: Router, C: Clock> {
    name: String,
    symbol: String,
    decimals: u8,
    owner: Address,
    pair: Address,
    router_address: Address,
    wrapped_base: Address,
    vesting_vault: Address,
    engine: TransferEngine,
    vesting: VestingRegistry,
    router: R,
    clock: C,
    deployed_at: u64,
}

impl<C: Clock> Token<ConstantProductRouter, C> {
    /// Deploy against an in-memory pair at `config.pair`
    pub fn with_pair_router(config: &DeploymentConfig, clock: C) -> LedgerResult<Self> {
        Self::deploy(config, ConstantProductRouter::new(config.pair), clock)
    }

    /// Deposit tokens and base currency into the pair
    pub fn seed_liquidity(
        &mut self,
        provider: Address,
        token_amount: U256,
        base_amount: U256,
    ) -> LedgerResult<LiquidityReceipt> {
        self.enter();
        self.router
            .seed_liquidity(&mut self.engine, provider, token_amount, base_amount)
    }
}

impl<R: Router, C: Clock> Token<R, C> {
    /// Genesis: validate, mint pool totals to the vesting vault and the rest to the owner
    pub fn deploy(config: &DeploymentConfig, router: R, clock: C) -> LedgerResult<Self> {
        config.validate()?;

        let mut excluded = vec![config.owner, config.contract];
        excluded.extend(config.fee_excluded.iter().copied());
        let fees = FeePolicy::new(config.fee_rates, excluded)?;

        let vesting = VestingRegistry::new(0, config.unlock_policy, &config.pools)?;
        let allocated = vesting.total_allocated();
        let owner_share = config
            .total_supply
            .checked_sub(allocated)
            .ok_or_else(|| LedgerError::invalid_config("vesting allocations exceed total supply"))?;

        let mut ledger = Ledger::new();
        let mut events = EventLog::default();
        for (account, amount) in [(config.vesting_vault, allocated), (config.owner, owner_share)] {
            if amount.is_zero() {
                continue;
            }
            ledger.mint_genesis(account, amount)?;
            events.push(LedgerEvent::Transfer {
                from: Address::ZERO,
                to: account,
                value: amount,
            });
        }

        let deployed_at = clock.now();
        info!(
            name = %config.name,
            symbol = %config.symbol,
            supply = to_whole_tokens(config.total_supply),
            vested = to_whole_tokens(allocated),
            owner = %config.owner,
            "🚀 Token deployed"
        );

        Ok(Self {
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            decimals: config.decimals,
            owner: config.owner,
            pair: config.pair,
            router_address: config.router,
            wrapped_base: config.wrapped_base,
            vesting_vault: config.vesting_vault,
            engine: TransferEngine {
                ledger,
                fees,
                cooldown: CooldownGuard::new(config.cooldown_secs),
                accumulator: LiquidityAccumulator::new(config.swap_threshold, config.pair),
                events,
                contract: config.contract,
                vesting_vault: config.vesting_vault,
                dev_address: config.dev_address,
                buy_back_address: config.buy_back_address,
                dev_base_accrued: U256::ZERO,
                telemetry: None,
                now: 0,
            },
            vesting,
            router,
            clock,
            deployed_at,
        })
    }

    pub fn with_telemetry(mut self, telemetry: Arc<LedgerTelemetry>) -> Self {
        self.engine.telemetry = Some(telemetry);
        self
    }

    /// Pin the call-entry time
    fn enter(&mut self) -> u64 {
        let now = self.clock.now().saturating_sub(self.deployed_at);
        self.engine.now = now;
        now
    }

    // ============================================
    // METADATA & VIEWS
    // ============================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn contract_address(&self) -> Address {
        self.engine.contract
    }

    pub fn pair_address(&self) -> Address {
        self.pair
    }

    /// AMM router the contract swaps and adds liquidity through
    pub fn router_address(&self) -> Address {
        self.router_address
    }

    /// Wrapped base currency paired with the token
    pub fn wrapped_base_address(&self) -> Address {
        self.wrapped_base
    }

    pub fn vesting_vault(&self) -> Address {
        self.vesting_vault
    }

    pub fn deployed_at(&self) -> u64 {
        self.deployed_at
    }

    /// Seconds since deployment
    pub fn elapsed(&self) -> u64 {
        self.clock.now().saturating_sub(self.deployed_at)
    }

    pub fn total_supply(&self) -> U256 {
        self.engine.ledger.total_supply()
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.engine.ledger.balance_of(account)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.engine.ledger.allowance(owner, spender)
    }

    pub fn sum_of_balances(&self) -> U256 {
        self.engine.ledger.sum_of_balances()
    }

    pub fn fee_policy(&self) -> &FeePolicy {
        &self.engine.fees
    }

    pub fn cooldown(&self) -> &CooldownGuard {
        &self.engine.cooldown
    }

    pub fn swap_threshold(&self) -> U256 {
        self.engine.accumulator.threshold()
    }

    pub fn dev_base_fee_accrued(&self) -> U256 {
        self.engine.dev_base_accrued
    }

    /// Base currency held by the contract between swap and add-liquidity
    pub fn base_currency_balance(&self) -> U256 {
        self.engine.accumulator.base_balance()
    }

    pub fn is_swapping(&self) -> bool {
        self.engine.accumulator.is_swapping()
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    /// Retained events, oldest first
    pub fn events(&self) -> &[LedgerEvent] {
        self.engine.events.as_slice()
    }

    /// Up to `limit` events from sequence number `since`
    pub fn events_page(&self, since: u64, limit: usize) -> EventPage {
        self.engine.events.page(since, limit)
    }

    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        self.engine.events.drain()
    }

    // ============================================
    // ERC20 SURFACE
    // ============================================

    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) -> LedgerResult<()> {
        self.engine.ledger.approve(owner, spender, amount)?;
        self.engine.events.push(LedgerEvent::Approval {
            owner,
            spender,
            value: amount,
        });
        Ok(())
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> LedgerResult<TransferReceipt> {
        self.enter();
        let (fees, trigger) = match self.engine.execute(from, to, amount) {
            Ok(applied) => applied,
            Err(e) => {
                warn!(from = %from, to = %to, code = e.code_str(), "Transfer rejected: {}", e.message);
                return Err(e);
            }
        };

        let swap = match trigger {
            Trigger::Idle => SwapOutcome::NotTriggered,
            Trigger::Locked => SwapOutcome::Locked,
            Trigger::Fire => self.swap_and_liquify(),
        };

        Ok(TransferReceipt {
            from,
            to,
            amount,
            fees,
            swap,
        })
    }

    /// Allowance is checked up front and spent only once the transfer went through
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> LedgerResult<TransferReceipt> {
        if self.allowance(&from, &spender) < amount {
            let err = LedgerError::insufficient_allowance();
            if let Some(telemetry) = &self.engine.telemetry {
                telemetry.record_rejection(err.code);
            }
            return Err(err);
        }
        let receipt = self.transfer(from, to, amount)?;
        self.engine.ledger.spend_allowance(from, spender, amount)?;
        Ok(receipt)
    }

    // ============================================
    // SWAP AND LIQUIFY
    // ============================================

    fn swap_and_liquify(&mut self) -> SwapOutcome {
        let balance = self.engine.ledger.balance_of(&self.engine.contract);
        let half = balance / U256::from(2u64);
        let other_half = balance - half;

        self.engine.accumulator.lock();
        let result = self.run_swap(half, other_half);
        self.engine.accumulator.unlock();

        match result {
            Ok(event) => {
                info!(
                    swapped = %event.tokens_swapped,
                    received = %event.base_currency_received,
                    liquidity = %event.tokens_into_liquidity,
                    "💧 SwapAndLiquify"
                );
                self.engine.events.push(LedgerEvent::SwapAndLiquify(event));
                if let Some(telemetry) = &self.engine.telemetry {
                    telemetry.record_swap(true);
                }
                SwapOutcome::Executed(event)
            }
            Err(e) => {
                warn!(code = e.code_str(), "⚠️ Swap-and-liquify failed, transfer kept: {}", e.message);
                if let Some(telemetry) = &self.engine.telemetry {
                    telemetry.record_swap(false);
                }
                SwapOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn run_swap(&mut self, half: U256, other_half: U256) -> LedgerResult<SwapAndLiquify> {
        let base_before = self.engine.accumulator.base_balance();
        self.router
            .swap_exact_tokens_for_base(&mut self.engine, half)?;
        let received = self
            .engine
            .accumulator
            .base_balance()
            .saturating_sub(base_before);

        let deadline = self.engine.now + LIQUIDITY_DEADLINE_SECS;
        let receipt = self.router.add_liquidity(
            &mut self.engine,
            other_half,
            received,
            U256::ZERO,
            U256::ZERO,
            self.owner,
            deadline,
        )?;

        Ok(SwapAndLiquify {
            tokens_swapped: half,
            base_currency_received: received,
            tokens_into_liquidity: receipt.used_token,
        })
    }

    // ============================================
    // VESTING
    // ============================================

    /// Release what `pool` has vested so far to its beneficiary. Returns the new released total.
    pub fn unlock(&mut self, caller: Address, pool: PoolId) -> LedgerResult<U256> {
        let now = self.enter();
        let release = match self.vesting.prepare_unlock(&caller, pool, now) {
            Ok(release) => release,
            Err(e) => {
                warn!(pool = %pool, caller = %caller, code = e.code_str(), "Unlock rejected: {}", e.message);
                return Err(e);
            }
        };

        self.engine
            .ledger
            .move_balance(self.vesting_vault, release.beneficiary, release.amount)?;
        let released = self.vesting.commit(&release)?;

        self.engine.events.push(LedgerEvent::Transfer {
            from: self.vesting_vault,
            to: release.beneficiary,
            value: release.amount,
        });
        self.engine.events.push(LedgerEvent::Unlocked {
            pool,
            beneficiary: release.beneficiary,
            amount: release.amount,
            released,
        });
        if let Some(telemetry) = &self.engine.telemetry {
            telemetry.record_unlock(release.amount);
        }

        info!(
            pool = %pool,
            beneficiary = %release.beneficiary,
            amount = to_whole_tokens(release.amount),
            released = to_whole_tokens(released),
            "🔓 Vesting unlocked"
        );
        Ok(released)
    }

    /// Released so far
    pub fn unlocked(&self, pool: PoolId) -> LedgerResult<U256> {
        self.vesting.unlocked(pool)
    }

    /// What `unlock` would release right now, zero when it would fail
    pub fn unlockable(&self, pool: PoolId) -> LedgerResult<U256> {
        self.vesting.unlockable(pool, self.elapsed())
    }

    pub fn pool(&self, pool: PoolId) -> LedgerResult<&AllocationPool> {
        self.vesting.pool(pool)
    }

    pub fn pools(&self) -> impl Iterator<Item = &AllocationPool> {
        self.vesting.pools()
    }
}
