//! Scenario replay
//!
//! A JSON list of ledger calls replayed against an in-memory token with a
//! manual clock. Failing steps are recorded with their error code and the
//! replay carries on, so a scenario can assert on rejections too.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::core::token::Token;
use crate::models::config::DeploymentConfig;
use crate::models::errors::LedgerResult;
use crate::models::types::{LedgerEvent, PoolId, TransferReceipt};
use crate::providers::router::ConstantProductRouter;
use crate::utils::clock::ManualClock;
use crate::utils::telemetry::{LedgerTelemetry, TelemetryStats};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Transfer {
        from: Address,
        to: Address,
        amount: U256,
    },
    TransferFrom {
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    },
    Approve {
        owner: Address,
        spender: Address,
        amount: U256,
    },
    Unlock {
        caller: Address,
        pool: PoolId,
    },
    AdvanceTime {
        secs: u64,
    },
    SeedLiquidity {
        provider: Address,
        tokens: U256,
        base: U256,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Transfer { .. } => "transfer",
            Step::TransferFrom { .. } => "transfer_from",
            Step::Approve { .. } => "approve",
            Step::Unlock { .. } => "unlock",
            Step::AdvanceTime { .. } => "advance_time",
            Step::SeedLiquidity { .. } => "seed_liquidity",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Fixture deployment when absent
    #[serde(default)]
    pub config: Option<DeploymentConfig>,
    /// Unix seconds at deployment
    #[serde(default)]
    pub start_time: u64,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_file(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> LedgerResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<TransferReceipt>,
    /// Pool total after a successful unlock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<U256>,
}

impl StepOutcome {
    fn ok(index: usize, op: &'static str) -> Self {
        Self {
            index,
            op,
            ok: true,
            error_code: None,
            message: None,
            receipt: None,
            released: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub outcomes: Vec<StepOutcome>,
    pub events: Vec<LedgerEvent>,
    pub total_supply: U256,
    pub sum_of_balances: U256,
    pub stats: TelemetryStats,
}

impl ScenarioReport {
    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|o| !o.ok)
    }
}

/// Replay every step. Only deployment errors abort the run.
pub fn run_scenario(scenario: &Scenario) -> LedgerResult<ScenarioReport> {
    let config = scenario.config.clone().unwrap_or_default();
    let clock = ManualClock::new(scenario.start_time);
    let telemetry = Arc::new(LedgerTelemetry::new());
    let mut token: Token<ConstantProductRouter, ManualClock> =
        Token::with_pair_router(&config, clock.clone())?.with_telemetry(telemetry.clone());

    info!(steps = scenario.steps.len(), "▶️ Replaying scenario");

    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let mut outcome = StepOutcome::ok(index, step.name());
        let result = match step {
            Step::Transfer { from, to, amount } => token
                .transfer(*from, *to, *amount)
                .map(|r| outcome.receipt = Some(r)),
            Step::TransferFrom {
                spender,
                from,
                to,
                amount,
            } => token
                .transfer_from(*spender, *from, *to, *amount)
                .map(|r| outcome.receipt = Some(r)),
            Step::Approve {
                owner,
                spender,
                amount,
            } => token.approve(*owner, *spender, *amount),
            Step::Unlock { caller, pool } => token
                .unlock(*caller, *pool)
                .map(|released| outcome.released = Some(released)),
            Step::AdvanceTime { secs } => {
                clock.advance(*secs);
                Ok(())
            }
            Step::SeedLiquidity {
                provider,
                tokens,
                base,
            } => token.seed_liquidity(*provider, *tokens, *base).map(|_| ()),
        };
        if let Err(e) = result {
            outcome.ok = false;
            outcome.error_code = Some(e.code_str());
            outcome.message = Some(e.message);
        }
        outcomes.push(outcome);
    }

    Ok(ScenarioReport {
        outcomes,
        events: token.drain_events(),
        total_supply: token.total_supply(),
        sum_of_balances: token.sum_of_balances(),
        stats: telemetry.get_stats(),
    })
}
