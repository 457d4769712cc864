//! Fee Policy
//!
//! Rates are in tenths of a percent (36 = 3.6%). Each fee is
//! `amount * rate / 1000`, truncating. Excluded accounts waive all fees on
//! either side of a transfer.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::errors::{ErrorCode, LedgerError, LedgerResult};
use crate::models::types::FeeSplit;
use crate::utils::constants::{
    BUY_BACK_FEE, DEV_BASE_FEE, DEV_TOKEN_FEE, FEE_DENOMINATOR, LIQUIDITY_FEE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRates {
    pub dev_token: u64,
    pub dev_base: u64,
    pub buy_back: u64,
    pub liquidity: u64,
}

impl Default for FeeRates {
    fn default() -> Self {
        Self {
            dev_token: DEV_TOKEN_FEE,
            dev_base: DEV_BASE_FEE,
            buy_back: BUY_BACK_FEE,
            liquidity: LIQUIDITY_FEE,
        }
    }
}

impl FeeRates {
    pub fn zero() -> Self {
        Self {
            dev_token: 0,
            dev_base: 0,
            buy_back: 0,
            liquidity: 0,
        }
    }

    /// Rates deducted from the recipient
    pub fn token_total(&self) -> u64 {
        self.dev_token
            .saturating_add(self.buy_back)
            .saturating_add(self.liquidity)
    }

    /// Token-denominated rates must stay strictly below 100.0%
    pub fn validate(&self) -> LedgerResult<()> {
        if self.token_total() >= FEE_DENOMINATOR {
            return Err(LedgerError::new(
                ErrorCode::FeeRatesTooHigh,
                format!(
                    "token fee rates sum to {}/1000, must be below 1000",
                    self.token_total()
                ),
            ));
        }
        if self.dev_base >= FEE_DENOMINATOR {
            return Err(LedgerError::new(
                ErrorCode::FeeRatesTooHigh,
                format!("dev base-currency fee {}/1000 must be below 1000", self.dev_base),
            ));
        }
        Ok(())
    }
}

/// Rates plus the exclusion set
#[derive(Debug, Clone)]
pub struct FeePolicy {
    rates: FeeRates,
    excluded: HashSet<Address>,
}

impl FeePolicy {
    pub fn new(rates: FeeRates, excluded: impl IntoIterator<Item = Address>) -> LedgerResult<Self> {
        rates.validate()?;
        Ok(Self {
            rates,
            excluded: excluded.into_iter().collect(),
        })
    }

    pub fn rates(&self) -> &FeeRates {
        &self.rates
    }

    pub fn is_excluded(&self, account: &Address) -> bool {
        self.excluded.contains(account)
    }

    /// Split `amount` for a transfer. Pure.
    pub fn split(&self, amount: U256, sender: &Address, recipient: &Address) -> FeeSplit {
        if self.is_excluded(sender) || self.is_excluded(recipient) {
            return FeeSplit::exempt(amount);
        }

        let dev_token = portion(amount, self.rates.dev_token);
        let dev_base = portion(amount, self.rates.dev_base);
        let buy_back = portion(amount, self.rates.buy_back);
        let liquidity = portion(amount, self.rates.liquidity);

        // token_total < 1000 keeps the sum of truncated fees below amount
        let recipient_amount = amount - dev_token - buy_back - liquidity;

        FeeSplit {
            recipient_amount,
            dev_token,
            dev_base,
            buy_back,
            liquidity,
        }
    }
}

/// `amount * rate / 1000`, truncating; saturates instead of wrapping near U256::MAX
#[inline]
fn portion(amount: U256, rate: u64) -> U256 {
    if rate == 0 {
        return U256::ZERO;
    }
    let denominator = U256::from(FEE_DENOMINATOR);
    match amount.checked_mul(U256::from(rate)) {
        Some(scaled) => scaled / denominator,
        None => amount / denominator * U256::from(rate),
    }
}
