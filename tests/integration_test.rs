//! Integration tests for the ABC ledger

use abc_ledger::core::token::Token;
use abc_ledger::models::config::DeploymentConfig;
use abc_ledger::models::errors::{ErrorCode, LedgerError, LedgerResult};
use abc_ledger::models::types::{LedgerEvent, PoolId, PoolState, SwapOutcome, UnlockPolicy};
use abc_ledger::providers::router::{ConstantProductRouter, LiquidityReceipt, Router, TokenGateway};
use abc_ledger::utils::clock::ManualClock;
use abc_ledger::utils::constants::{
    tokens, CORE_TEAM_BENEFICIARY, DEFAULT_OWNER, DEMO_SEED_BASE_WEI, DEMO_SEED_TOKENS,
    DEV_ADDRESS, MONTH_SECS, PAIR_ADDRESS,
};
use abc_ledger::utils::telemetry::LedgerTelemetry;
use alloy_primitives::{address, Address, U256};
use std::sync::Arc;

const USER1: Address = address!("00000000000000000000000000000000000a11ce");
const USER2: Address = address!("0000000000000000000000000000000000000b0b");
const USER3: Address = address!("00000000000000000000000000000000000ca201");

const GENESIS: u64 = 1_650_000_000;

fn deploy() -> (Token<ConstantProductRouter, ManualClock>, ManualClock) {
    let clock = ManualClock::new(GENESIS);
    let token = Token::with_pair_router(&DeploymentConfig::default(), clock.clone()).unwrap();
    (token, clock)
}

fn deploy_with<R: Router>(router: R) -> (Token<R, ManualClock>, ManualClock) {
    let clock = ManualClock::new(GENESIS);
    let token = Token::deploy(&DeploymentConfig::default(), router, clock.clone()).unwrap();
    (token, clock)
}

fn assert_conserved<R: Router>(token: &Token<R, ManualClock>) {
    assert_eq!(
        token.sum_of_balances(),
        token.total_supply(),
        "sum of balances must equal total supply"
    );
}

fn swap_events<R: Router>(token: &Token<R, ManualClock>) -> usize {
    token
        .events()
        .iter()
        .filter(|e| matches!(e, LedgerEvent::SwapAndLiquify(_)))
        .count()
}

// ============================================
// Ledger & fees
// ============================================

#[test]
fn test_fixture_deployment() {
    let (token, _) = deploy();
    assert_eq!(token.name(), "ABCToken");
    assert_eq!(token.symbol(), "ABC");
    assert_eq!(token.decimals(), 8);
    assert_eq!(token.total_supply(), U256::from(10_000_000_000_000_000u64));
    assert_conserved(&token);
}

#[test]
fn test_end_to_end_fee_fixture() {
    let (mut token, clock) = deploy();
    token.transfer(DEFAULT_OWNER, USER1, U256::from(200_000u64)).unwrap();
    clock.advance(1);

    let contract = token.contract_address();
    let receipt = token.transfer(USER1, USER2, U256::from(100_000u64)).unwrap();

    assert_eq!(token.balance_of(&USER2), U256::from(94_000u64));
    assert_eq!(token.balance_of(&DEV_ADDRESS), U256::from(3_600u64));
    assert_eq!(token.balance_of(&contract), U256::from(2_400u64));
    assert_eq!(token.balance_of(&USER1), U256::from(100_000u64));
    assert_eq!(
        receipt.fees.recipient_amount + receipt.fees.token_fees(),
        U256::from(100_000u64)
    );
    assert_conserved(&token);
}

#[test]
fn test_excluded_owner_pays_no_fee() {
    let (mut token, _) = deploy();
    let receipt = token.transfer(DEFAULT_OWNER, USER1, tokens(1_000)).unwrap();
    assert!(receipt.fees.is_exempt());
    assert_eq!(token.balance_of(&USER1), tokens(1_000));
}

#[test]
fn test_insufficient_balance_is_atomic() {
    let (mut token, _) = deploy();
    token.transfer(DEFAULT_OWNER, USER1, U256::from(1_000u64)).unwrap();
    let before = token.events().len();

    let err = token.transfer(USER1, USER2, U256::from(1_001u64)).unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientBalance);
    assert_eq!(token.balance_of(&USER1), U256::from(1_000u64));
    assert_eq!(token.balance_of(&USER2), U256::ZERO);
    assert_eq!(token.events().len(), before);
    assert_conserved(&token);
}

#[test]
fn test_zero_address_recipient() {
    let (mut token, _) = deploy();
    let err = token
        .transfer(DEFAULT_OWNER, Address::ZERO, U256::from(1u64))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ZeroAddress);
    assert_eq!(err.message, "ERC20: transfer to the zero address");
}

#[test]
fn test_transfer_from_charges_fees() {
    let (mut token, _) = deploy();
    token.transfer(DEFAULT_OWNER, USER1, U256::from(100_000u64)).unwrap();
    token.approve(USER1, USER3, U256::from(100_000u64)).unwrap();

    let receipt = token
        .transfer_from(USER3, USER1, USER2, U256::from(100_000u64))
        .unwrap();
    assert_eq!(receipt.fees.recipient_amount, U256::from(94_000u64));
    assert_eq!(token.allowance(&USER1, &USER3), U256::ZERO);

    // Allowance untouched when the transfer itself is rejected
    token.approve(USER2, USER3, U256::from(50_000u64)).unwrap();
    let err = token
        .transfer_from(USER3, USER2, USER1, U256::from(95_000u64))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientAllowance);
    assert_eq!(token.allowance(&USER2, &USER3), U256::from(50_000u64));

    token
        .transfer_from(USER3, USER2, USER1, U256::from(50_000u64))
        .unwrap();
    assert_eq!(token.allowance(&USER2, &USER3), U256::ZERO);

    // A rejected transfer leaves the allowance in place
    token.approve(USER2, USER3, U256::from(10u64)).unwrap();
    let err = token
        .transfer_from(USER3, USER2, USER1, U256::from(10u64))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CooldownViolation);
    assert_eq!(token.allowance(&USER2, &USER3), U256::from(10u64));
    assert_conserved(&token);
}

// ============================================
// Cooldown
// ============================================

#[test]
fn test_cooldown_interval() {
    let (mut token, clock) = deploy();
    token.transfer(DEFAULT_OWNER, USER1, tokens(100)).unwrap();

    token.transfer(USER1, USER2, tokens(1)).unwrap();
    clock.advance(9);
    let err = token.transfer(USER1, USER2, tokens(1)).unwrap_err();
    assert_eq!(err.code, ErrorCode::CooldownViolation);
    assert_eq!(err.message, "time between transfers should be 10 seconds");

    // The rejected attempt did not reset the window
    clock.advance(2);
    assert!(token.transfer(USER1, USER2, tokens(1)).is_ok());

    // Cooldown is per sender
    assert!(token.transfer(USER2, USER3, tokens(1)).is_ok());
    assert_conserved(&token);
}

// ============================================
// Vesting
// ============================================

#[test]
fn test_core_team_vesting_curve() {
    let (mut token, clock) = deploy();

    clock.advance(13 * MONTH_SECS);
    let err = token.unlock(USER1, PoolId::CoreTeam).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooSoon);
    assert_eq!(token.unlocked(PoolId::CoreTeam).unwrap(), U256::ZERO);

    clock.advance(MONTH_SECS);
    assert_eq!(token.unlock(USER1, PoolId::CoreTeam).unwrap(), tokens(5_000_000));
    assert_eq!(token.balance_of(&CORE_TEAM_BENEFICIARY), tokens(5_000_000));

    // Same step again
    let before = token.balance_of(&CORE_TEAM_BENEFICIARY);
    let err = token.unlock(USER1, PoolId::CoreTeam).unwrap_err();
    assert_eq!(err.code, ErrorCode::NothingToUnlock);
    assert_eq!(err.message, "Now there is no token to unlock");
    assert_eq!(token.balance_of(&CORE_TEAM_BENEFICIARY), before);

    clock.advance(6 * MONTH_SECS);
    assert_eq!(token.unlock(USER1, PoolId::CoreTeam).unwrap(), tokens(10_000_000));

    clock.advance(20 * MONTH_SECS);
    assert_eq!(token.unlock(USER1, PoolId::CoreTeam).unwrap(), tokens(15_000_000));
    assert_eq!(
        token.pool(PoolId::CoreTeam).unwrap().state,
        PoolState::FullyReleased
    );

    clock.advance(120 * MONTH_SECS);
    let err = token.unlock(USER1, PoolId::CoreTeam).unwrap_err();
    assert_eq!(err.code, ErrorCode::NothingToUnlock);
    assert_eq!(token.balance_of(&CORE_TEAM_BENEFICIARY), tokens(15_000_000));
    assert_conserved(&token);
}

#[test]
fn test_all_pools_drain_vault() {
    let (mut token, clock) = deploy();
    clock.advance(48 * MONTH_SECS);

    for pool in PoolId::ALL {
        token.unlock(USER1, pool).unwrap();
        assert_eq!(
            token.pool(pool).unwrap().state,
            PoolState::FullyReleased,
            "{} should be fully released",
            pool
        );
    }
    assert_eq!(token.balance_of(&token.vesting_vault()), U256::ZERO);
    assert_eq!(token.balance_of(&DEFAULT_OWNER), tokens(15_000_000));
    assert_conserved(&token);

    let unlocked = token
        .events()
        .iter()
        .filter(|e| matches!(e, LedgerEvent::Unlocked { .. }))
        .count();
    assert_eq!(unlocked, 6);
}

#[test]
fn test_beneficiary_only_unlock() {
    let config = DeploymentConfig {
        unlock_policy: UnlockPolicy::BeneficiaryOnly,
        ..DeploymentConfig::default()
    };
    let clock = ManualClock::new(GENESIS);
    let mut token = Token::with_pair_router(&config, clock.clone()).unwrap();
    clock.advance(14 * MONTH_SECS);

    let err = token.unlock(USER1, PoolId::CoreTeam).unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthorized);
    assert_eq!(token.unlocked(PoolId::CoreTeam).unwrap(), U256::ZERO);

    assert_eq!(
        token.unlock(CORE_TEAM_BENEFICIARY, PoolId::CoreTeam).unwrap(),
        tokens(5_000_000)
    );
}

#[test]
fn test_unit_mismatch_rejected_at_deploy() {
    let mut config = DeploymentConfig::default();
    config.pools[0].schedule[2].cumulative = U256::from(598_000_000_000_000_000u64);
    let err = Token::with_pair_router(&config, ManualClock::new(0)).err().unwrap();
    assert_eq!(err.code, ErrorCode::ScheduleExceedsSupply);
}

// ============================================
// Swap and liquify
// ============================================

#[test]
fn test_swap_triggers_once_per_crossing() {
    let (mut token, clock) = deploy();
    token
        .seed_liquidity(DEFAULT_OWNER, tokens(DEMO_SEED_TOKENS), U256::from(DEMO_SEED_BASE_WEI))
        .unwrap();
    token.transfer(DEFAULT_OWNER, USER1, tokens(1_000_000)).unwrap();
    clock.advance(1);

    // 2.4% of 500,000 ABC = 12,000 ABC on the contract, threshold is 5,000.
    // The crossing transfer only fills the contract.
    let receipt = token.transfer(USER1, USER2, tokens(500_000)).unwrap();
    assert_eq!(receipt.swap, SwapOutcome::NotTriggered);
    let contract = token.contract_address();
    assert!(token.balance_of(&contract) >= token.swap_threshold());
    assert_eq!(swap_events(&token), 0);

    // Excluded deployer transfer sees the full contract and swaps
    let receipt = token.transfer(DEFAULT_OWNER, USER1, tokens(1)).unwrap();
    let event = match receipt.swap {
        SwapOutcome::Executed(event) => event,
        other => panic!("expected swap, got {:?}", other),
    };
    assert_eq!(event.tokens_swapped, tokens(6_000));
    assert!(event.base_currency_received > U256::ZERO);
    assert_eq!(event.tokens_into_liquidity, tokens(6_000));
    assert!(!token.is_swapping());
    assert!(token.balance_of(&contract) < token.swap_threshold());
    assert!(token.router().lp_balance(&DEFAULT_OWNER) > U256::ZERO);

    // Next qualifying transfer does not fire again
    let receipt = token.transfer(DEFAULT_OWNER, USER1, tokens(1)).unwrap();
    assert_eq!(receipt.swap, SwapOutcome::NotTriggered);
    assert_eq!(swap_events(&token), 1);
    assert_conserved(&token);
}

#[test]
fn test_pair_sender_does_not_trigger() {
    // Unseeded pair: any swap attempt would come back as Failed
    let (mut token, _) = deploy();
    token.transfer(DEFAULT_OWNER, PAIR_ADDRESS, tokens(1_000)).unwrap();
    let contract = token.contract_address();
    let receipt = token.transfer(DEFAULT_OWNER, contract, tokens(6_000)).unwrap();
    assert_eq!(receipt.swap, SwapOutcome::NotTriggered);

    let receipt = token.transfer(PAIR_ADDRESS, USER1, tokens(100)).unwrap();
    assert_eq!(receipt.swap, SwapOutcome::NotTriggered);
    assert_eq!(token.balance_of(&USER1), tokens(94));
    assert!(token.balance_of(&contract) >= token.swap_threshold());
    assert_eq!(swap_events(&token), 0);

    // Any other sender attempts it
    let receipt = token.transfer(DEFAULT_OWNER, USER2, tokens(1)).unwrap();
    assert!(matches!(receipt.swap, SwapOutcome::Failed { .. }));
}

#[test]
fn test_router_failure_keeps_transfer() {
    // Pair never seeded: the router rejects the swap
    let (mut token, clock) = deploy();
    token.transfer(DEFAULT_OWNER, USER1, tokens(1_000_000)).unwrap();
    clock.advance(1);

    let receipt = token.transfer(USER1, USER2, tokens(500_000)).unwrap();
    assert_eq!(receipt.swap, SwapOutcome::NotTriggered);

    let receipt = token.transfer(DEFAULT_OWNER, USER2, tokens(1)).unwrap();
    assert!(matches!(receipt.swap, SwapOutcome::Failed { .. }));
    assert_eq!(token.balance_of(&USER2), tokens(470_001));
    assert_eq!(token.balance_of(&token.contract_address()), tokens(12_000));
    assert!(!token.is_swapping());
    assert_eq!(swap_events(&token), 0);
    assert_conserved(&token);
}

#[test]
fn test_contract_balance_moves_only_through_swap() {
    let (mut token, clock) = deploy();
    token
        .seed_liquidity(DEFAULT_OWNER, tokens(DEMO_SEED_TOKENS), U256::from(DEMO_SEED_BASE_WEI))
        .unwrap();
    token.transfer(DEFAULT_OWNER, USER1, tokens(1_000_000)).unwrap();
    clock.advance(1);
    token.transfer(USER1, USER2, tokens(500_000)).unwrap();
    let contract = token.contract_address();

    let err = token
        .transfer(contract, USER3, tokens(12_000))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProtectedAccount);
    assert_eq!(token.balance_of(&USER3), U256::ZERO);
    assert_eq!(token.balance_of(&contract), tokens(12_000));

    // The router may still pull from the contract while the swap runs
    let receipt = token.transfer(DEFAULT_OWNER, USER3, tokens(1)).unwrap();
    assert!(matches!(receipt.swap, SwapOutcome::Executed(_)));
    assert_eq!(token.balance_of(&contract), U256::ZERO);
    assert_conserved(&token);
}

#[test]
fn test_vault_pays_only_through_unlock() {
    let (mut token, clock) = deploy();
    let vault = token.vesting_vault();
    clock.advance(14 * MONTH_SECS);

    let err = token.transfer(vault, USER1, tokens(85_000_000)).unwrap_err();
    assert_eq!(err.code, ErrorCode::ProtectedAccount);
    assert_eq!(err.code.http_status(), 403);
    assert_eq!(token.balance_of(&vault), tokens(85_000_000));

    token.approve(vault, USER1, tokens(85_000_000)).unwrap();
    let err = token
        .transfer_from(USER1, vault, USER1, tokens(1))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProtectedAccount);
    assert_eq!(token.balance_of(&USER1), U256::ZERO);

    assert_eq!(
        token.unlock(USER1, PoolId::CoreTeam).unwrap(),
        tokens(5_000_000)
    );
    clock.advance(34 * MONTH_SECS);
    for pool in PoolId::ALL {
        token.unlock(USER1, pool).unwrap();
        assert_eq!(token.pool(pool).unwrap().state, PoolState::FullyReleased);
    }
    assert_eq!(token.balance_of(&vault), U256::ZERO);
    assert_conserved(&token);
}

/// Swaps fine, then fails to add liquidity
struct HalfwayRouter {
    pair: Address,
}

impl Router for HalfwayRouter {
    fn swap_exact_tokens_for_base(
        &mut self,
        gateway: &mut dyn TokenGateway,
        amount_in: U256,
    ) -> LedgerResult<U256> {
        let contract = gateway.contract_address();
        gateway.transfer(contract, self.pair, amount_in)?;
        gateway.receive_base(U256::from(777u64))?;
        Ok(U256::from(777u64))
    }

    fn add_liquidity(
        &mut self,
        _gateway: &mut dyn TokenGateway,
        _token_amount: U256,
        _base_amount: U256,
        _min_token: U256,
        _min_base: U256,
        _to: Address,
        _deadline: u64,
    ) -> LedgerResult<LiquidityReceipt> {
        Err(LedgerError::router("pair paused"))
    }
}

#[test]
fn test_partial_swap_movements_stand() {
    let (mut token, clock) = deploy_with(HalfwayRouter { pair: PAIR_ADDRESS });
    token.transfer(DEFAULT_OWNER, USER1, tokens(1_000_000)).unwrap();
    clock.advance(1);
    token.transfer(USER1, USER2, tokens(500_000)).unwrap();

    let receipt = token.transfer(DEFAULT_OWNER, USER3, tokens(1)).unwrap();
    match receipt.swap {
        SwapOutcome::Failed { reason } => assert!(reason.contains("pair paused")),
        other => panic!("expected failure, got {:?}", other),
    }
    // Half of 12,000 ABC already reached the pair and stays there
    assert_eq!(token.balance_of(&PAIR_ADDRESS), tokens(6_000));
    assert_eq!(token.balance_of(&token.contract_address()), tokens(6_000));
    assert_eq!(token.base_currency_balance(), U256::from(777u64));
    assert_eq!(token.balance_of(&USER2), tokens(470_000));
    assert_eq!(token.balance_of(&USER3), tokens(1));
    assert!(!token.is_swapping());
    assert_conserved(&token);
}

/// Moves user funds through the token mid-swap
struct ReentrantRouter {
    swaps: usize,
    from: Address,
    to: Address,
    amount: U256,
}

impl Router for ReentrantRouter {
    fn swap_exact_tokens_for_base(
        &mut self,
        gateway: &mut dyn TokenGateway,
        _amount_in: U256,
    ) -> LedgerResult<U256> {
        self.swaps += 1;
        gateway.transfer(self.from, self.to, self.amount)?;
        gateway.receive_base(U256::from(1u64))?;
        Ok(U256::from(1u64))
    }

    fn add_liquidity(
        &mut self,
        gateway: &mut dyn TokenGateway,
        token_amount: U256,
        base_amount: U256,
        _min_token: U256,
        _min_base: U256,
        _to: Address,
        _deadline: u64,
    ) -> LedgerResult<LiquidityReceipt> {
        gateway.pay_base(base_amount)?;
        Ok(LiquidityReceipt {
            used_token: token_amount,
            used_base: base_amount,
            liquidity: U256::from(1u64),
        })
    }
}

#[test]
fn test_reentrant_transfer_skips_trigger() {
    let router = ReentrantRouter {
        swaps: 0,
        from: USER2,
        to: USER3,
        amount: tokens(400_000),
    };
    let telemetry = Arc::new(LedgerTelemetry::new());
    let (token, clock) = deploy_with(router);
    let mut token = token.with_telemetry(Arc::clone(&telemetry));
    token.transfer(DEFAULT_OWNER, USER1, tokens(1_000_000)).unwrap();
    token.transfer(DEFAULT_OWNER, USER2, tokens(400_000)).unwrap();
    clock.advance(1);

    let receipt = token.transfer(USER1, USER3, tokens(500_000)).unwrap();
    assert_eq!(receipt.swap, SwapOutcome::NotTriggered);
    let receipt = token.transfer(DEFAULT_OWNER, USER1, tokens(1)).unwrap();
    assert!(matches!(receipt.swap, SwapOutcome::Executed(_)));

    // The nested transfer went through with fees but did not swap again
    assert_eq!(token.router().swaps, 1);
    assert_eq!(token.balance_of(&USER2), U256::ZERO);
    assert_eq!(
        token.balance_of(&USER3),
        tokens(470_000) + tokens(376_000)
    );
    assert_eq!(swap_events(&token), 1);
    assert!(!token.is_swapping());
    assert_conserved(&token);

    // Four direct transfers plus the one the router made
    let stats = telemetry.get_stats();
    assert_eq!(stats.transfers, 5);
    assert_eq!(stats.rejected_transfers, 0);
    assert!((stats.liquidity_fees_collected - 21_600.0).abs() < 1e-6);
    assert_eq!(stats.swaps, 1);
}
