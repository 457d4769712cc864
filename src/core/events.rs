//! Bounded event log
//!
//! Every event gets a sequence number that never repeats. Old entries are
//! dropped in batches once the log holds more than `capacity` events, so
//! readers page with a cursor (`since`) instead of cloning everything.

use serde::Serialize;

use crate::models::types::LedgerEvent;
use crate::utils::constants::EVENT_LOG_CAPACITY;

#[derive(Debug, Clone)]
pub struct EventLog {
    entries: Vec<LedgerEvent>,
    /// Sequence number of `entries[0]`
    first_seq: u64,
    capacity: usize,
}

/// One page of events starting at `from`
#[derive(Debug, Clone, Serialize)]
pub struct EventPage {
    pub from: u64,
    /// Cursor for the next request
    pub next: u64,
    /// Requested cursor fell off the log
    pub truncated: bool,
    pub events: Vec<LedgerEvent>,
}

impl EventLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            first_seq: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, event: LedgerEvent) {
        self.entries.push(event);
        // Trim a quarter at a time so pushes stay amortized O(1)
        let slack = (self.capacity / 4).max(1);
        if self.entries.len() >= self.capacity + slack {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
            self.first_seq += excess as u64;
        }
    }

    pub fn as_slice(&self) -> &[LedgerEvent] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_seq(&self) -> u64 {
        self.first_seq
    }

    /// Sequence number the next event will get
    pub fn next_seq(&self) -> u64 {
        self.first_seq + self.entries.len() as u64
    }

    /// Up to `limit` events with sequence >= `since`
    pub fn page(&self, since: u64, limit: usize) -> EventPage {
        let from = since.max(self.first_seq).min(self.next_seq());
        let start = (from - self.first_seq) as usize;
        let end = start.saturating_add(limit).min(self.entries.len());
        EventPage {
            from,
            next: self.first_seq + end as u64,
            truncated: since < self.first_seq,
            events: self.entries[start..end].to_vec(),
        }
    }

    /// Hand over everything retained; sequence numbers keep counting
    pub fn drain(&mut self) -> Vec<LedgerEvent> {
        self.first_seq = self.next_seq();
        std::mem::take(&mut self.entries)
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(EVENT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    fn transfer(value: u64) -> LedgerEvent {
        LedgerEvent::Transfer {
            from: Address::ZERO,
            to: Address::ZERO,
            value: U256::from(value),
        }
    }

    #[test]
    fn test_capacity_bounds_log() {
        let mut log = EventLog::with_capacity(8);
        for i in 0..100 {
            log.push(transfer(i));
            assert!(log.len() < 8 + 2);
        }
        assert_eq!(log.next_seq(), 100);
        assert_eq!(log.as_slice().last(), Some(&transfer(99)));
        assert_eq!(log.first_seq() + log.len() as u64, 100);
    }

    #[test]
    fn test_page_cursor() {
        let mut log = EventLog::with_capacity(100);
        for i in 0..10 {
            log.push(transfer(i));
        }
        let page = log.page(3, 4);
        assert_eq!(page.from, 3);
        assert_eq!(page.next, 7);
        assert_eq!(page.events, vec![transfer(3), transfer(4), transfer(5), transfer(6)]);
        assert!(!page.truncated);

        let tail = log.page(page.next, 100);
        assert_eq!(tail.events.len(), 3);
        assert_eq!(tail.next, 10);
        assert!(log.page(tail.next, 100).events.is_empty());
    }

    #[test]
    fn test_stale_cursor_is_truncated() {
        let mut log = EventLog::with_capacity(4);
        for i in 0..20 {
            log.push(transfer(i));
        }
        let page = log.page(0, 2);
        assert!(page.truncated);
        assert_eq!(page.from, log.first_seq());
        assert_eq!(page.events[0], transfer(log.first_seq()));
    }

    #[test]
    fn test_drain_keeps_sequence() {
        let mut log = EventLog::with_capacity(16);
        log.push(transfer(1));
        log.push(transfer(2));
        assert_eq!(log.drain().len(), 2);
        assert!(log.is_empty());
        log.push(transfer(3));
        assert_eq!(log.page(2, 10).events, vec![transfer(3)]);
    }
}
