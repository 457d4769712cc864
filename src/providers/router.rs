//! Router Provider - AMM collaborator for swap-and-liquify
//!
//! The token consumes exactly two router operations:
//! 1. `swap_exact_tokens_for_base(amount_in) -> amount_out`
//! 2. `add_liquidity(token, base, min_token, min_base, to, deadline)`
//!
//! A router moves tokens by calling back into the token through a
//! `TokenGateway`. Those calls run the ordinary transfer path while the
//! swap lock is held, which is the re-entrancy the accumulator guards.
//!
//! `ConstantProductRouter` is an in-memory x*y=k pair with the 0.3% input fee
//! and Uniswap-V2 LP minting, used by the binaries and tests.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::models::errors::{LedgerError, LedgerResult};

// ============================================
// PAIR CONSTANTS
// ============================================

/// LP units locked forever on the first mint
pub const MINIMUM_LIQUIDITY: u64 = 1_000;

/// Input fee numerator/denominator (0.3%)
const FEE_NUMERATOR: u64 = 997;
const FEE_DENOMINATOR: u64 = 1_000;

/// Token-side handle a router uses to move value
pub trait TokenGateway {
    /// The token contract's own account
    fn contract_address(&self) -> Address;

    /// Call-entry time of the outer operation
    fn now(&self) -> u64;

    fn balance_of(&self, account: &Address) -> U256;

    /// Full transfer path: cooldown, fees, ledger, events. The liquidity
    /// trigger stays suppressed while a swap is running.
    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> LedgerResult<()>;

    /// Base currency paid out to the contract
    fn receive_base(&mut self, amount: U256) -> LedgerResult<()>;

    /// Base currency spent by the contract
    fn pay_base(&mut self, amount: U256) -> LedgerResult<()>;
}

/// Amounts actually consumed by `add_liquidity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityReceipt {
    pub used_token: U256,
    pub used_base: U256,
    pub liquidity: U256,
}

/// External AMM router
pub trait Router {
    fn swap_exact_tokens_for_base(
        &mut self,
        gateway: &mut dyn TokenGateway,
        amount_in: U256,
    ) -> LedgerResult<U256>;

    #[allow(clippy::too_many_arguments)]
    fn add_liquidity(
        &mut self,
        gateway: &mut dyn TokenGateway,
        token_amount: U256,
        base_amount: U256,
        min_token: U256,
        min_base: U256,
        to: Address,
        deadline: u64,
    ) -> LedgerResult<LiquidityReceipt>;
}

// ============================================
// CONSTANT PRODUCT PAIR
// ============================================

/// Public view of the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairReserves {
    pub token: U256,
    pub base: U256,
    pub lp_supply: U256,
}

/// Single token/base pair with its router
#[derive(Debug, Clone)]
pub struct ConstantProductRouter {
    pair: Address,
    reserve_token: U256,
    reserve_base: U256,
    lp_supply: U256,
    lp_balances: HashMap<Address, U256>,
}

impl ConstantProductRouter {
    pub fn new(pair: Address) -> Self {
        Self {
            pair,
            reserve_token: U256::ZERO,
            reserve_base: U256::ZERO,
            lp_supply: U256::ZERO,
            lp_balances: HashMap::new(),
        }
    }

    pub fn pair(&self) -> Address {
        self.pair
    }

    pub fn reserves(&self) -> PairReserves {
        PairReserves {
            token: self.reserve_token,
            base: self.reserve_base,
            lp_supply: self.lp_supply,
        }
    }

    pub fn lp_balance(&self, account: &Address) -> U256 {
        self.lp_balances.get(account).copied().unwrap_or_default()
    }

    /// Provider deposits both sides directly into the pair.
    /// Base currency enters from outside the token ledger.
    pub fn seed_liquidity(
        &mut self,
        gateway: &mut dyn TokenGateway,
        provider: Address,
        token_amount: U256,
        base_amount: U256,
    ) -> LedgerResult<LiquidityReceipt> {
        if token_amount.is_zero() || base_amount.is_zero() {
            return Err(LedgerError::router("INSUFFICIENT_INPUT_AMOUNT"));
        }
        let before = gateway.balance_of(&self.pair);
        gateway.transfer(provider, self.pair, token_amount)?;
        let received = gateway.balance_of(&self.pair).saturating_sub(before);

        let liquidity = self.mint(provider, received, base_amount)?;
        self.reserve_token = gateway.balance_of(&self.pair);
        self.reserve_base += base_amount;

        info!(
            provider = %provider,
            token = %received,
            base = %base_amount,
            liquidity = %liquidity,
            "💧 Pair seeded"
        );
        Ok(LiquidityReceipt {
            used_token: received,
            used_base: base_amount,
            liquidity,
        })
    }

    /// LP units for a deposit, credited to `to`
    fn mint(&mut self, to: Address, token_in: U256, base_in: U256) -> LedgerResult<U256> {
        let liquidity = if self.lp_supply.is_zero() {
            let product = token_in
                .checked_mul(base_in)
                .ok_or_else(|| LedgerError::router("liquidity product overflow"))?;
            let root = isqrt(product);
            let minimum = U256::from(MINIMUM_LIQUIDITY);
            if root <= minimum {
                return Err(LedgerError::router("INSUFFICIENT_LIQUIDITY_MINTED"));
            }
            // Locked to the zero account
            self.lp_supply = minimum;
            root - minimum
        } else {
            let by_token = mul_div(token_in, self.lp_supply, self.reserve_token)?;
            let by_base = mul_div(base_in, self.lp_supply, self.reserve_base)?;
            by_token.min(by_base)
        };
        if liquidity.is_zero() {
            return Err(LedgerError::router("INSUFFICIENT_LIQUIDITY_MINTED"));
        }
        self.lp_supply += liquidity;
        *self.lp_balances.entry(to).or_default() += liquidity;
        Ok(liquidity)
    }
}

impl Router for ConstantProductRouter {
    fn swap_exact_tokens_for_base(
        &mut self,
        gateway: &mut dyn TokenGateway,
        amount_in: U256,
    ) -> LedgerResult<U256> {
        if amount_in.is_zero() {
            return Err(LedgerError::router("INSUFFICIENT_INPUT_AMOUNT"));
        }
        if self.reserve_token.is_zero() || self.reserve_base.is_zero() {
            return Err(LedgerError::router("INSUFFICIENT_LIQUIDITY"));
        }

        // Fee-on-transfer safe: price what the pair actually received
        let contract = gateway.contract_address();
        gateway.transfer(contract, self.pair, amount_in)?;
        let balance = gateway.balance_of(&self.pair);
        let received = balance.saturating_sub(self.reserve_token);

        let amount_out = get_amount_out(received, self.reserve_token, self.reserve_base)?;
        if amount_out.is_zero() {
            return Err(LedgerError::router("INSUFFICIENT_OUTPUT_AMOUNT"));
        }

        gateway.receive_base(amount_out)?;
        self.reserve_token = balance;
        self.reserve_base -= amount_out;

        debug!(amount_in = %received, amount_out = %amount_out, "Pair swap tokens -> base");
        Ok(amount_out)
    }

    fn add_liquidity(
        &mut self,
        gateway: &mut dyn TokenGateway,
        token_amount: U256,
        base_amount: U256,
        min_token: U256,
        min_base: U256,
        to: Address,
        deadline: u64,
    ) -> LedgerResult<LiquidityReceipt> {
        if gateway.now() > deadline {
            return Err(LedgerError::router("EXPIRED"));
        }

        let (token_used, base_used) = if self.reserve_token.is_zero() && self.reserve_base.is_zero()
        {
            (token_amount, base_amount)
        } else {
            let base_optimal = quote(token_amount, self.reserve_token, self.reserve_base)?;
            if base_optimal <= base_amount {
                if base_optimal < min_base {
                    return Err(LedgerError::router("INSUFFICIENT_B_AMOUNT"));
                }
                (token_amount, base_optimal)
            } else {
                let token_optimal = quote(base_amount, self.reserve_base, self.reserve_token)?;
                if token_optimal < min_token {
                    return Err(LedgerError::router("INSUFFICIENT_A_AMOUNT"));
                }
                (token_optimal, base_amount)
            }
        };

        let contract = gateway.contract_address();
        let before = gateway.balance_of(&self.pair);
        gateway.transfer(contract, self.pair, token_used)?;
        gateway.pay_base(base_used)?;
        let received = gateway.balance_of(&self.pair).saturating_sub(before);

        let liquidity = self.mint(to, received, base_used)?;
        self.reserve_token = gateway.balance_of(&self.pair);
        self.reserve_base += base_used;

        debug!(
            token = %token_used,
            base = %base_used,
            liquidity = %liquidity,
            "Pair liquidity added"
        );
        Ok(LiquidityReceipt {
            used_token: token_used,
            used_base: base_used,
            liquidity,
        })
    }
}

// ============================================
// PAIR MATH
// ============================================

/// `in*997*rOut / (rIn*1000 + in*997)`
pub fn get_amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> LedgerResult<U256> {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(LedgerError::router("INSUFFICIENT_LIQUIDITY"));
    }
    let overflow = || LedgerError::router("amount out overflow");
    let in_with_fee = amount_in
        .checked_mul(U256::from(FEE_NUMERATOR))
        .ok_or_else(overflow)?;
    let numerator = in_with_fee.checked_mul(reserve_out).ok_or_else(overflow)?;
    let denominator = reserve_in
        .checked_mul(U256::from(FEE_DENOMINATOR))
        .and_then(|r| r.checked_add(in_with_fee))
        .ok_or_else(overflow)?;
    Ok(numerator / denominator)
}

/// Equivalent amount at the current price
pub fn quote(amount: U256, reserve_a: U256, reserve_b: U256) -> LedgerResult<U256> {
    if reserve_a.is_zero() || reserve_b.is_zero() {
        return Err(LedgerError::router("INSUFFICIENT_LIQUIDITY"));
    }
    mul_div(amount, reserve_b, reserve_a)
}

fn mul_div(a: U256, b: U256, denominator: U256) -> LedgerResult<U256> {
    if denominator.is_zero() {
        return Err(LedgerError::router("division by zero reserve"));
    }
    a.checked_mul(b)
        .map(|p| p / denominator)
        .ok_or_else(|| LedgerError::router("mul_div overflow"))
}

/// Integer sqrt (Babylonian)
pub fn isqrt(y: U256) -> U256 {
    if y.is_zero() {
        return U256::ZERO;
    }
    let mut z = y;
    let mut x = y / U256::from(2u64) + U256::from(1u64);
    while x < z {
        z = x;
        x = (y / x + x) / U256::from(2u64);
    }
    z
}
