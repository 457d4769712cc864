//! Type definitions for the ABC ledger
//! Events, receipts and identifiers shared by core, api and scenario replay

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::LedgerError;

/// The six stakeholder allocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolId {
    CoreTeam,
    Advisors,
    Reserve,
    Staking,
    Ecosystem,
    PlayToEarn,
}

impl PoolId {
    pub const ALL: [PoolId; 6] = [
        PoolId::CoreTeam,
        PoolId::Advisors,
        PoolId::Reserve,
        PoolId::Staking,
        PoolId::Ecosystem,
        PoolId::PlayToEarn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PoolId::CoreTeam => "core_team",
            PoolId::Advisors => "advisors",
            PoolId::Reserve => "reserve",
            PoolId::Staking => "staking",
            PoolId::Ecosystem => "ecosystem",
            PoolId::PlayToEarn => "play_to_earn",
        }
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoolId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        PoolId::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| LedgerError::unknown_pool(s))
    }
}

/// Allocation pool lifecycle. Only a successful unlock moves it forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    /// No successful unlock yet
    Locked,
    /// Partially released
    Vesting,
    /// released == total. Terminal.
    FullyReleased,
}

/// Who may call `unlock`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockPolicy {
    /// Anyone may trigger a release; tokens always go to the beneficiary
    #[default]
    Permissionless,
    /// Only the pool beneficiary
    BeneficiaryOnly,
}

/// Split of one transfer amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeSplit {
    pub recipient_amount: U256,
    pub dev_token: U256,
    /// Base-currency dev fee accrual; never moved on the token ledger
    pub dev_base: U256,
    pub buy_back: U256,
    pub liquidity: U256,
}

impl FeeSplit {
    /// Full amount to the recipient, no fees
    pub fn exempt(amount: U256) -> Self {
        Self {
            recipient_amount: amount,
            ..Default::default()
        }
    }

    /// Token-denominated fees deducted from the recipient
    pub fn token_fees(&self) -> U256 {
        self.dev_token + self.buy_back + self.liquidity
    }

    pub fn is_exempt(&self) -> bool {
        self.token_fees().is_zero() && self.dev_base.is_zero()
    }
}

/// Amounts reported by a completed swap-and-liquify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapAndLiquify {
    pub tokens_swapped: U256,
    pub base_currency_received: U256,
    pub tokens_into_liquidity: U256,
}

/// What happened to the liquidity trigger during a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SwapOutcome {
    /// Threshold not reached, or the sender is the AMM pair
    NotTriggered,
    /// A swap was already running
    Locked,
    Executed(SwapAndLiquify),
    /// Router error, isolated from the transfer
    Failed { reason: String },
}

/// Result of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub fees: FeeSplit,
    pub swap: SwapOutcome,
}

/// Observable ledger events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    Transfer {
        from: Address,
        to: Address,
        value: U256,
    },
    Approval {
        owner: Address,
        spender: Address,
        value: U256,
    },
    SwapAndLiquify(SwapAndLiquify),
    Unlocked {
        pool: PoolId,
        beneficiary: Address,
        amount: U256,
        released: U256,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Transfer { .. } => "Transfer",
            LedgerEvent::Approval { .. } => "Approval",
            LedgerEvent::SwapAndLiquify(_) => "SwapAndLiquify",
            LedgerEvent::Unlocked { .. } => "Unlocked",
        }
    }
}
