//! Liquidity Accumulator
//!
//! Liquidity fees accrue on the contract's own token balance. Once that
//! balance has reached the threshold, the next qualifying transfer converts it:
//! half is swapped for base currency, the rest is paired with the proceeds
//! as pool liquidity. `swapping` is held for the whole router sequence.

use alloy_primitives::{Address, U256};

use crate::models::errors::{LedgerError, LedgerResult};

/// Trigger decision for one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Below threshold, or the sender is the AMM pair
    Idle,
    /// Threshold reached but a swap is already running
    Locked,
    Fire,
}

#[derive(Debug, Clone)]
pub struct LiquidityAccumulator {
    threshold: U256,
    swapping: bool,
    /// Contract-held base currency (swap proceeds not yet paired)
    base_balance: U256,
    pair: Address,
}

impl LiquidityAccumulator {
    pub fn new(threshold: U256, pair: Address) -> Self {
        Self {
            threshold,
            swapping: false,
            base_balance: U256::ZERO,
            pair,
        }
    }

    pub fn threshold(&self) -> U256 {
        self.threshold
    }

    pub fn is_swapping(&self) -> bool {
        self.swapping
    }

    pub fn base_balance(&self) -> U256 {
        self.base_balance
    }

    /// `self_balance` is the contract balance before the current transfer's fee
    pub fn evaluate(&self, self_balance: U256, sender: &Address) -> Trigger {
        // Buys out of the pool never convert fees
        if *sender == self.pair || self_balance < self.threshold {
            return Trigger::Idle;
        }
        if self.swapping {
            Trigger::Locked
        } else {
            Trigger::Fire
        }
    }

    pub fn lock(&mut self) {
        self.swapping = true;
    }

    pub fn unlock(&mut self) {
        self.swapping = false;
    }

    pub fn credit_base(&mut self, amount: U256) -> LedgerResult<()> {
        self.base_balance = self
            .base_balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow("contract base balance"))?;
        Ok(())
    }

    pub fn debit_base(&mut self, amount: U256) -> LedgerResult<()> {
        self.base_balance = self
            .base_balance
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::router("contract base balance too low for liquidity"))?;
        Ok(())
    }
}
