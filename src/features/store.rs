//! Keyed store of per-market histories
//!
//! One component owns every `MarketHistory`, created explicitly on first use
//! (get-or-create, never implicit auto-vivification). Histories live for the
//! process lifetime; `evict` exists for an external retention policy to call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::history::MarketHistory;

/// Owns the `market key -> MarketHistory` mapping.
///
/// Distinct market keys are fully independent: the outer lock is held only
/// long enough to get or create an entry, and each history has its own mutex
/// serializing the read-compute-append sequence for that key. No lock spans
/// more than one market.
#[derive(Debug, Default)]
pub struct HistoryStore {
    markets: Mutex<HashMap<String, Arc<Mutex<MarketHistory>>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the history for `key` as one atomic unit.
    ///
    /// The history is created empty on first use. While `f` runs, no other
    /// operation on the same key can interleave between its reads and its
    /// final append; operations on other keys proceed in parallel.
    pub fn with_market<R>(&self, key: &str, f: impl FnOnce(&mut MarketHistory) -> R) -> R {
        let entry = {
            let mut markets = self.markets.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                markets
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(MarketHistory::new()))),
            )
        };
        let mut history = entry.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut history)
    }

    /// Drop the history for a market key, if present
    pub fn evict(&self, key: &str) -> bool {
        let mut markets = self.markets.lock().unwrap_or_else(PoisonError::into_inner);
        markets.remove(key).is_some()
    }

    /// Number of markets currently tracked
    pub fn market_count(&self) -> usize {
        let markets = self.markets.lock().unwrap_or_else(PoisonError::into_inner);
        markets.len()
    }
}
