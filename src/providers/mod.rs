//! Providers Module - External Collaborators
//!
//! The AMM router the token swaps and adds liquidity through.

pub mod router;

pub use router::*;
