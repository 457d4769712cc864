//! Balance and allowance store
//!
//! The only place balances change. Every mutating call validates first and
//! writes second, so a rejected call leaves the store untouched.

use alloy_primitives::{Address, U256};
use std::collections::HashMap;

use crate::models::errors::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    total_supply: U256,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Genesis mint. The only path that grows total supply.
    pub fn mint_genesis(&mut self, to: Address, amount: U256) -> LedgerResult<()> {
        if to == Address::ZERO {
            return Err(LedgerError::zero_recipient());
        }
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow("total supply"))?;
        let balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow("genesis balance"))?;
        self.total_supply = supply;
        self.balances.insert(to, balance);
        Ok(())
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) -> LedgerResult<()> {
        if owner == Address::ZERO || spender == Address::ZERO {
            return Err(LedgerError::zero_approval());
        }
        self.allowances.insert((owner, spender), amount);
        Ok(())
    }

    /// Fails without touching the allowance when it is too small
    pub fn spend_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> LedgerResult<()> {
        let current = self.allowance(&owner, &spender);
        // MAX allowance is treated as infinite, like the ERC20 reference
        if current == U256::MAX {
            return Ok(());
        }
        let remaining = current
            .checked_sub(amount)
            .ok_or_else(LedgerError::insufficient_allowance)?;
        self.allowances.insert((owner, spender), remaining);
        Ok(())
    }

    /// Move `amount` between two accounts
    pub fn move_balance(&mut self, from: Address, to: Address, amount: U256) -> LedgerResult<()> {
        if from == Address::ZERO {
            return Err(LedgerError::zero_sender());
        }
        if to == Address::ZERO {
            return Err(LedgerError::zero_recipient());
        }
        let from_balance = self
            .balance_of(&from)
            .checked_sub(amount)
            .ok_or_else(LedgerError::insufficient_balance)?;
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow("recipient balance"))?;
        self.balances.insert(from, from_balance);
        self.balances.insert(to, to_balance);
        Ok(())
    }

    /// Debit `from` once and credit several accounts, all or nothing
    pub fn distribute(&mut self, from: Address, credits: &[(Address, U256)]) -> LedgerResult<()> {
        if from == Address::ZERO {
            return Err(LedgerError::zero_sender());
        }
        let mut total = U256::ZERO;
        for (to, amount) in credits {
            if *to == Address::ZERO {
                return Err(LedgerError::zero_recipient());
            }
            total = total
                .checked_add(*amount)
                .ok_or_else(|| LedgerError::overflow("distribution total"))?;
        }
        if self.balance_of(&from) < total {
            return Err(LedgerError::insufficient_balance());
        }

        // Total supply bounds every balance, so the credits below cannot overflow
        for (to, amount) in credits {
            self.move_balance(from, *to, *amount)?;
        }
        Ok(())
    }

    /// Σ balances, for conservation checks
    pub fn sum_of_balances(&self) -> U256 {
        self.balances
            .values()
            .fold(U256::ZERO, |acc, b| acc.saturating_add(*b))
    }

    /// Accounts with a non-zero balance
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &U256)> {
        self.balances.iter().filter(|(_, b)| !b.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0000000000000000000000000000000000000b0b");
    const CAROL: Address = address!("00000000000000000000000000000000000ca201");

    fn funded() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.mint_genesis(ALICE, U256::from(1_000u64)).unwrap();
        ledger
    }

    #[test]
    fn test_move_balance() {
        let mut ledger = funded();
        ledger.move_balance(ALICE, BOB, U256::from(400u64)).unwrap();
        assert_eq!(ledger.balance_of(&ALICE), U256::from(600u64));
        assert_eq!(ledger.balance_of(&BOB), U256::from(400u64));
        assert_eq!(ledger.sum_of_balances(), ledger.total_supply());
    }

    #[test]
    fn test_insufficient_balance_leaves_state() {
        let mut ledger = funded();
        let err = ledger
            .move_balance(ALICE, BOB, U256::from(1_001u64))
            .unwrap_err();
        assert_eq!(err.message, "ERC20: transfer amount exceeds balance");
        assert_eq!(ledger.balance_of(&ALICE), U256::from(1_000u64));
        assert_eq!(ledger.balance_of(&BOB), U256::ZERO);
    }

    #[test]
    fn test_zero_recipient() {
        let mut ledger = funded();
        let err = ledger
            .move_balance(ALICE, Address::ZERO, U256::from(1u64))
            .unwrap_err();
        assert_eq!(err.message, "ERC20: transfer to the zero address");
    }

    #[test]
    fn test_distribute_all_or_nothing() {
        let mut ledger = funded();
        let err = ledger
            .distribute(
                ALICE,
                &[(BOB, U256::from(600u64)), (CAROL, U256::from(600u64))],
            )
            .unwrap_err();
        assert_eq!(err.message, "ERC20: transfer amount exceeds balance");
        assert_eq!(ledger.balance_of(&BOB), U256::ZERO);

        ledger
            .distribute(
                ALICE,
                &[(BOB, U256::from(600u64)), (CAROL, U256::from(300u64))],
            )
            .unwrap();
        assert_eq!(ledger.balance_of(&ALICE), U256::from(100u64));
        assert_eq!(ledger.sum_of_balances(), U256::from(1_000u64));
    }

    #[test]
    fn test_allowance_spend() {
        let mut ledger = funded();
        ledger.approve(ALICE, BOB, U256::from(50u64)).unwrap();
        ledger.spend_allowance(ALICE, BOB, U256::from(20u64)).unwrap();
        assert_eq!(ledger.allowance(&ALICE, &BOB), U256::from(30u64));
        let err = ledger
            .spend_allowance(ALICE, BOB, U256::from(31u64))
            .unwrap_err();
        assert_eq!(err.message, "ERC20: insufficient allowance");
        assert_eq!(ledger.allowance(&ALICE, &BOB), U256::from(30u64));

        ledger.approve(ALICE, CAROL, U256::MAX).unwrap();
        ledger.spend_allowance(ALICE, CAROL, U256::from(999u64)).unwrap();
        assert_eq!(ledger.allowance(&ALICE, &CAROL), U256::MAX);
    }
}
