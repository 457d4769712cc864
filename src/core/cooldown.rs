//! Anti-bot cooldown between transfers from the same sender

use alloy_primitives::Address;
use std::collections::HashMap;

use crate::models::errors::{LedgerError, LedgerResult};

#[derive(Debug, Clone)]
pub struct CooldownGuard {
    min_interval: u64,
    /// Deployment-relative second of the last transfer sent
    last_transfer: HashMap<Address, u64>,
}

impl CooldownGuard {
    pub fn new(min_interval: u64) -> Self {
        Self {
            min_interval,
            last_transfer: HashMap::new(),
        }
    }

    pub fn min_interval(&self) -> u64 {
        self.min_interval
    }

    pub fn last_transfer(&self, sender: &Address) -> Option<u64> {
        self.last_transfer.get(sender).copied()
    }

    /// Pure check. A sender that never transferred always passes.
    pub fn check(&self, sender: &Address, now: u64) -> LedgerResult<()> {
        match self.last_transfer(sender) {
            Some(last) if now.saturating_sub(last) < self.min_interval => {
                Err(LedgerError::cooldown(self.min_interval))
            }
            _ => Ok(()),
        }
    }

    /// Called only after the transfer went through
    pub fn record(&mut self, sender: Address, now: u64) {
        self.last_transfer.insert(sender, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;
    use alloy_primitives::address;

    const SENDER: Address = address!("00000000000000000000000000000000000a11ce");

    #[test]
    fn test_first_transfer_passes() {
        let guard = CooldownGuard::new(10);
        assert!(guard.check(&SENDER, 0).is_ok());
    }

    #[test]
    fn test_interval_enforced() {
        let mut guard = CooldownGuard::new(10);
        guard.record(SENDER, 100);

        let err = guard.check(&SENDER, 109).unwrap_err();
        assert_eq!(err.code, ErrorCode::CooldownViolation);
        assert_eq!(err.message, "time between transfers should be 10 seconds");

        assert!(guard.check(&SENDER, 110).is_ok());
        assert!(guard.check(&SENDER, 111).is_ok());
    }

    #[test]
    fn test_check_does_not_record() {
        let guard = CooldownGuard::new(10);
        guard.check(&SENDER, 5).unwrap();
        assert_eq!(guard.last_transfer(&SENDER), None);
    }

    #[test]
    fn test_zero_interval_never_blocks() {
        let mut guard = CooldownGuard::new(0);
        guard.record(SENDER, 7);
        assert!(guard.check(&SENDER, 7).is_ok());
    }
}
