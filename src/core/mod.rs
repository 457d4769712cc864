//! Core Module - Ledger Business Logic
//!
//! Ledger store, fee policy, cooldown guard, liquidity accumulator,
//! vesting registry, and the token that composes them.

pub mod cooldown;
pub mod events;
pub mod fees;
pub mod ledger;
pub mod liquidity;
pub mod scenario;
pub mod token;
pub mod vesting;

pub use cooldown::*;
pub use events::*;
pub use fees::*;
pub use ledger::*;
pub use liquidity::*;
pub use scenario::*;
pub use token::*;
pub use vesting::*;
