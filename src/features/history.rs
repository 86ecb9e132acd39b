//! Bounded rolling window of recent per-market trade attributes

use std::collections::VecDeque;

use crate::common::types::{Outcome, TradeCandidate};

/// Capacity of the price/size/outcome/timestamp windows
pub const WINDOW_CAPACITY: usize = 50;
/// Capacity of the price-change window
pub const PRICE_CHANGE_CAPACITY: usize = 20;

/// Which windowed sequence a query operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowField {
    Price,
    Size,
}

/// Rolling trading history for a single market key.
///
/// The four attribute windows evict FIFO at [`WINDOW_CAPACITY`] and always
/// hold the same number of entries; `price_changes` holds at most
/// [`PRICE_CHANGE_CAPACITY`] first-difference deltas. Mutation happens only
/// through [`MarketHistory::record`]; every query is pure and total over
/// empty or under-sized windows (returning `None`, with the documented
/// fallback applied by the feature extractor).
#[derive(Debug, Clone, Default)]
pub struct MarketHistory {
    prices: VecDeque<f64>,
    sizes: VecDeque<f64>,
    outcomes: VecDeque<Option<Outcome>>,
    timestamps: VecDeque<i64>,
    price_changes: VecDeque<f64>,
    last_price: Option<f64>,
}

impl MarketHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one observed trade to the windows.
    ///
    /// Evicts the oldest entry of each attribute window at capacity, updates
    /// `last_price`, and appends the latest price delta once at least two
    /// prices are present. Infallible: the windows can never end up with
    /// unequal lengths.
    pub fn record(&mut self, trade: &TradeCandidate) {
        push_capped(&mut self.prices, trade.price, WINDOW_CAPACITY);
        push_capped(&mut self.sizes, trade.size, WINDOW_CAPACITY);
        push_capped(&mut self.outcomes, trade.outcome, WINDOW_CAPACITY);
        push_capped(&mut self.timestamps, trade.timestamp, WINDOW_CAPACITY);
        self.last_price = Some(trade.price);

        if self.prices.len() >= 2 {
            let delta = self.prices[self.prices.len() - 1] - self.prices[self.prices.len() - 2];
            push_capped(&mut self.price_changes, delta, PRICE_CHANGE_CAPACITY);
        }
    }

    /// Number of recorded trades currently in the window
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Price of the most recently recorded trade
    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    /// Number of recorded price deltas
    pub fn price_change_count(&self) -> usize {
        self.price_changes.len()
    }

    /// Timestamp of the oldest trade still in the window
    pub fn first_timestamp(&self) -> Option<i64> {
        self.timestamps.front().copied()
    }

    /// Timestamp of the most recent trade
    pub fn last_timestamp(&self) -> Option<i64> {
        self.timestamps.back().copied()
    }

    /// n-th most recent price (1 = last); `None` when fewer than n recorded
    pub fn price_back(&self, n: usize) -> Option<f64> {
        if n == 0 || self.prices.len() < n {
            return None;
        }
        Some(self.prices[self.prices.len() - n])
    }

    /// n-th most recent declared outcome (1 = last)
    pub fn outcome_back(&self, n: usize) -> Option<Option<Outcome>> {
        if n == 0 || self.outcomes.len() < n {
            return None;
        }
        Some(self.outcomes[self.outcomes.len() - n])
    }

    /// Mean of the last `n` entries; `None` when the window holds fewer
    pub fn moving_average(&self, field: WindowField, n: usize) -> Option<f64> {
        let win = self.window(field);
        if n == 0 || win.len() < n {
            return None;
        }
        Some(win.iter().rev().take(n).sum::<f64>() / n as f64)
    }

    /// Population standard deviation of the last `n` entries
    pub fn std_dev(&self, field: WindowField, n: usize) -> Option<f64> {
        let mean = self.moving_average(field, n)?;
        let win = self.window(field);
        let var = win
            .iter()
            .rev()
            .take(n)
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / n as f64;
        Some(var.sqrt())
    }

    /// max - min over the last `n` entries
    pub fn range_of(&self, field: WindowField, n: usize) -> Option<f64> {
        let win = self.window(field);
        if n == 0 || win.len() < n {
            return None;
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in win.iter().rev().take(n) {
            min = min.min(*v);
            max = max.max(*v);
        }
        Some(max - min)
    }

    /// Last price minus the price at position `len - n`; requires >= n samples
    pub fn momentum(&self, n: usize) -> Option<f64> {
        let base = self.price_back(n)?;
        let last = self.price_back(1)?;
        Some(last - base)
    }

    /// p-th percentile (0..=100) over the whole window, with linear
    /// interpolation between closest ranks
    pub fn percentile(&self, field: WindowField, p: f64) -> Option<f64> {
        let win = self.window(field);
        if win.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = win.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        if lo == hi {
            return Some(sorted[lo]);
        }
        let frac = rank - lo as f64;
        Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
    }

    /// Mean of the entries from `len - start_back` (inclusive) to
    /// `len - end_back` (exclusive); `None` when the window is too short
    /// or the bounds are empty
    pub fn mean_range_back(
        &self,
        field: WindowField,
        start_back: usize,
        end_back: usize,
    ) -> Option<f64> {
        let win = self.window(field);
        if start_back <= end_back || win.len() < start_back {
            return None;
        }
        let start = win.len() - start_back;
        let end = win.len() - end_back;
        let count = end - start;
        Some(win.iter().skip(start).take(count).sum::<f64>() / count as f64)
    }

    fn window(&self, field: WindowField) -> &VecDeque<f64> {
        match field {
            WindowField::Price => &self.prices,
            WindowField::Size => &self.sizes,
        }
    }
}

fn push_capped<T>(window: &mut VecDeque<T>, value: T, cap: usize) {
    if window.len() == cap {
        window.pop_front();
    }
    window.push_back(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::Side;

    fn trade(price: f64, size: f64, ts: i64) -> TradeCandidate {
        TradeCandidate::new(price, size, price * size, ts, Some(Outcome::Up), Side::Buy, "m")
    }

    fn filled(n: usize) -> MarketHistory {
        let mut h = MarketHistory::new();
        for i in 0..n {
            h.record(&trade(0.3 + 0.01 * i as f64, 10.0 + i as f64, 1_000 + i as i64));
        }
        h
    }

    #[test]
    fn test_windows_stay_equal_length_and_capped() {
        let h = filled(120);
        assert_eq!(h.len(), WINDOW_CAPACITY);
        assert_eq!(h.sizes.len(), WINDOW_CAPACITY);
        assert_eq!(h.outcomes.len(), WINDOW_CAPACITY);
        assert_eq!(h.timestamps.len(), WINDOW_CAPACITY);
        assert_eq!(h.price_change_count(), PRICE_CHANGE_CAPACITY);
    }

    #[test]
    fn test_price_changes_bounded_by_prices_minus_one() {
        for n in 0..30 {
            let h = filled(n);
            let expected = n.saturating_sub(1).min(PRICE_CHANGE_CAPACITY);
            assert_eq!(h.price_change_count(), expected, "n = {n}");
        }
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let h = filled(60);
        // First surviving trade is the 11th recorded one
        assert_eq!(h.first_timestamp(), Some(1_010));
        assert_eq!(h.last_timestamp(), Some(1_059));
    }

    #[test]
    fn test_queries_return_none_on_short_windows() {
        let h = filled(3);
        assert!(h.moving_average(WindowField::Price, 5).is_none());
        assert!(h.std_dev(WindowField::Price, 5).is_none());
        assert!(h.range_of(WindowField::Price, 5).is_none());
        assert!(h.momentum(5).is_none());
        assert!(h.mean_range_back(WindowField::Size, 6, 3).is_none());

        let empty = MarketHistory::new();
        assert!(empty.percentile(WindowField::Size, 75.0).is_none());
        assert!(empty.last_price().is_none());
        assert!(empty.momentum(1).is_none());
    }

    #[test]
    fn test_moving_average_uses_most_recent_entries() {
        let mut h = MarketHistory::new();
        for p in [0.10, 0.20, 0.30, 0.40, 0.50, 0.60] {
            h.record(&trade(p, 1.0, 0));
        }
        // Last 5 prices: 0.20..=0.60
        let ma = h.moving_average(WindowField::Price, 5).unwrap();
        assert!((ma - 0.40).abs() < 1e-12);
    }

    #[test]
    fn test_std_dev_is_population() {
        let mut h = MarketHistory::new();
        for p in [0.2, 0.4, 0.2, 0.4, 0.2] {
            h.record(&trade(p, 1.0, 0));
        }
        // mean 0.28, variance = (3*0.0064 + 2*0.0144)/5 = 0.0096
        let sd = h.std_dev(WindowField::Price, 5).unwrap();
        assert!((sd - 0.0096_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_momentum_is_last_minus_third_from_last() {
        let mut h = MarketHistory::new();
        for p in [0.10, 0.25, 0.40, 0.35] {
            h.record(&trade(p, 1.0, 0));
        }
        let m = h.momentum(3).unwrap();
        assert!((m - (0.35 - 0.40)).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_linear_interpolation() {
        let mut h = MarketHistory::new();
        for s in [10.0, 20.0, 30.0, 40.0] {
            h.record(&trade(0.5, s, 0));
        }
        // rank = 0.75 * 3 = 2.25 -> 30 + 0.25 * 10 = 32.5
        let p75 = h.percentile(WindowField::Size, 75.0).unwrap();
        assert!((p75 - 32.5).abs() < 1e-12);

        let mut single = MarketHistory::new();
        single.record(&trade(0.5, 7.0, 0));
        assert_eq!(single.percentile(WindowField::Size, 75.0), Some(7.0));
    }

    #[test]
    fn test_mean_range_back_matches_slice_semantics() {
        let mut h = MarketHistory::new();
        for s in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0] {
            h.record(&trade(0.5, s, 0));
        }
        // sizes[-6:-3] == [2, 3, 4]
        let m = h.mean_range_back(WindowField::Size, 6, 3).unwrap();
        assert!((m - 3.0).abs() < 1e-12);
        // last 3 == [5, 6, 7]
        let last3 = h.moving_average(WindowField::Size, 3).unwrap();
        assert!((last3 - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_price_change_tracks_consecutive_deltas() {
        let mut h = MarketHistory::new();
        h.record(&trade(0.40, 1.0, 0));
        assert_eq!(h.price_change_count(), 0);
        h.record(&trade(0.45, 1.0, 0));
        assert_eq!(h.price_change_count(), 1);
        assert!((h.price_changes[0] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_outcome_back() {
        let mut h = MarketHistory::new();
        h.record(&TradeCandidate::new(0.5, 1.0, 0.5, 0, None, Side::Buy, "m"));
        h.record(&trade(0.5, 1.0, 1));
        assert_eq!(h.outcome_back(1), Some(Some(Outcome::Up)));
        assert_eq!(h.outcome_back(2), Some(None));
        assert_eq!(h.outcome_back(3), None);
    }
}
