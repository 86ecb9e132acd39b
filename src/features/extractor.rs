//! Feature extraction for trade candidates
//!
//! Turns a candidate plus its market's *prior* history into a flat
//! [`FeatureRecord`]. The read-then-write ordering is the core correctness
//! invariant here: features are always computed from history state before the
//! candidate is appended, so a trade never sees itself in its own moving
//! average. [`FeatureExtractor::extract_and_record`] performs both halves as
//! one unit and is what the gateway routes through the per-key store lock.

use chrono::{DateTime, Datelike, Timelike};
use serde::Serialize;

use super::history::{MarketHistory, WindowField};
use crate::common::types::{Outcome, Side, TradeCandidate};

/// Market hour assumed when the market key carries no parseable hour token
pub const DEFAULT_MARKET_HOUR: u32 = 12;

/// Coarse bucket for the candidate price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceCategory {
    /// price < 0.4
    Low,
    Mid,
    /// price > 0.6
    High,
}

impl PriceCategory {
    fn of(price: f64) -> Self {
        if price < 0.4 {
            PriceCategory::Low
        } else if price > 0.6 {
            PriceCategory::High
        } else {
            PriceCategory::Mid
        }
    }
}

/// Flat, read-only feature snapshot for one trade candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    // Raw attributes copied from the candidate
    pub price: f64,
    pub size: f64,
    pub usdc_size: f64,
    pub timestamp: i64,
    pub outcome: Option<Outcome>,
    pub side: Side,
    pub outcome_index: i32,
    pub market_key: String,

    // Temporal (UTC)
    pub hour: u32,
    /// Monday = 0 .. Sunday = 6
    pub day_of_week: u32,
    pub is_weekend: bool,
    pub is_business_hours: bool,

    // Price
    pub price_distance_from_50: f64,
    pub price_category: PriceCategory,
    /// Whether the *declared* outcome is the cheaper side
    pub is_cheaper_outcome: bool,

    // Windowed (neutral fallbacks when history is shorter than the window)
    pub price_ma5: f64,
    pub price_ma10: f64,
    pub size_ma5: f64,
    pub price_volatility: f64,
    pub price_range: f64,
    pub price_momentum: f64,
    pub price_change_pct: f64,
    pub price_diff_from_last: f64,
    /// -1, 0 or 1 relative to the last recorded price
    pub price_change_direction: i8,
    pub volume_trend: f64,
    pub is_high_volume: bool,

    // Sequence
    pub last_outcome: Option<Outcome>,
    pub outcome_switched: bool,
    /// Number of trades recorded before this one
    pub trade_sequence_num: usize,
    pub time_since_first_trade: i64,
    pub time_since_last_trade: i64,

    // Market timing
    pub market_hour: u32,
    pub hours_until_market: u32,
}

impl FeatureRecord {
    /// Numeric encoding of a feature by its stable name.
    ///
    /// This is the bridge a frozen predictor artifact uses to assemble its
    /// input vector from its stored feature-name list. Booleans encode as
    /// 0/1; unknown names return `None`.
    pub fn value(&self, name: &str) -> Option<f64> {
        let v = match name {
            "price" => self.price,
            "size" => self.size,
            "usdc_size" => self.usdc_size,
            "outcome_index" => f64::from(self.outcome_index),
            "hour" => f64::from(self.hour),
            "day_of_week" => f64::from(self.day_of_week),
            "is_weekend" => f64::from(self.is_weekend as u8),
            "is_business_hours" => f64::from(self.is_business_hours as u8),
            "price_distance_from_50" => self.price_distance_from_50,
            "is_cheaper_outcome" => f64::from(self.is_cheaper_outcome as u8),
            "price_ma5" => self.price_ma5,
            "price_ma10" => self.price_ma10,
            "size_ma5" => self.size_ma5,
            "price_volatility" => self.price_volatility,
            "price_range" => self.price_range,
            "price_momentum" => self.price_momentum,
            "price_change_pct" => self.price_change_pct,
            "price_diff_from_last" => self.price_diff_from_last,
            "price_change_direction" => f64::from(self.price_change_direction),
            "volume_trend" => self.volume_trend,
            "is_high_volume" => f64::from(self.is_high_volume as u8),
            "outcome_switched" => f64::from(self.outcome_switched as u8),
            "trade_sequence_num" => self.trade_sequence_num as f64,
            "time_since_first_trade" => self.time_since_first_trade as f64,
            "time_since_last_trade" => self.time_since_last_trade as f64,
            "market_hour" => f64::from(self.market_hour),
            "hours_until_market" => f64::from(self.hours_until_market),
            _ => return None,
        };
        Some(v)
    }
}

/// Pure feature computation over a market's prior history
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Compute the feature record for `trade` from history state prior to it.
    ///
    /// Pure: the history is not mutated. Callers that want the trade
    /// reflected in subsequent extractions must follow up with
    /// `history.record(trade)`, or use [`Self::extract_and_record`].
    /// Never fails; every numeric edge case resolves to its documented
    /// fallback.
    pub fn extract(trade: &TradeCandidate, history: &MarketHistory) -> FeatureRecord {
        let dt = DateTime::from_timestamp(trade.timestamp, 0).unwrap_or(DateTime::UNIX_EPOCH);
        let hour = dt.hour();
        let day_of_week = dt.weekday().num_days_from_monday();

        let price = trade.price;
        let is_cheaper_outcome = match trade.outcome {
            Some(Outcome::Up) => price < 0.5,
            Some(Outcome::Down) => price > 0.5,
            None => false,
        };

        let price_momentum = history.momentum(3).unwrap_or(0.0);
        let price_change_pct = match (history.momentum(3), history.price_back(3)) {
            (Some(m), Some(base)) if base > 0.0 => m / base,
            _ => 0.0,
        };

        let (price_diff_from_last, price_change_direction) = match history.last_price() {
            Some(last) => {
                let direction = if price > last {
                    1
                } else if price < last {
                    -1
                } else {
                    0
                };
                (price - last, direction)
            }
            None => (0.0, 0),
        };

        let volume_trend = match (
            history.moving_average(WindowField::Size, 3),
            history.mean_range_back(WindowField::Size, 6, 3),
        ) {
            (Some(recent), Some(prior)) => recent - prior,
            _ => 0.0,
        };

        let is_high_volume = history
            .percentile(WindowField::Size, 75.0)
            .map(|p75| trade.size > p75)
            .unwrap_or(false);

        // last_outcome is only populated once two outcomes are on record;
        // a single recorded trade leaves it unset (source behavior).
        let (last_outcome, outcome_switched) = if history.len() >= 2 {
            let last = history.outcome_back(1).flatten();
            let prev = history.outcome_back(2).flatten();
            (last, last != prev)
        } else {
            (None, false)
        };

        let market_hour = parse_market_hour(&trade.market_key).unwrap_or(DEFAULT_MARKET_HOUR);
        let hours_until_market = hour.abs_diff(market_hour);

        FeatureRecord {
            price,
            size: trade.size,
            usdc_size: trade.usdc_size,
            timestamp: trade.timestamp,
            outcome: trade.outcome,
            side: trade.side,
            outcome_index: trade.outcome_index,
            market_key: trade.market_key.clone(),

            hour,
            day_of_week,
            is_weekend: day_of_week >= 5,
            is_business_hours: (9..=17).contains(&hour),

            price_distance_from_50: (price - 0.5).abs(),
            price_category: PriceCategory::of(price),
            is_cheaper_outcome,

            price_ma5: history
                .moving_average(WindowField::Price, 5)
                .unwrap_or(price),
            price_ma10: history
                .moving_average(WindowField::Price, 10)
                .unwrap_or(price),
            size_ma5: history
                .moving_average(WindowField::Size, 5)
                .unwrap_or(trade.size),
            price_volatility: history.std_dev(WindowField::Price, 5).unwrap_or(0.0),
            price_range: history.range_of(WindowField::Price, 5).unwrap_or(0.0),
            price_momentum,
            price_change_pct,
            price_diff_from_last,
            price_change_direction,
            volume_trend,
            is_high_volume,

            last_outcome,
            outcome_switched,
            trade_sequence_num: history.len(),
            time_since_first_trade: history
                .first_timestamp()
                .map(|t| trade.timestamp - t)
                .unwrap_or(0),
            time_since_last_trade: history
                .last_timestamp()
                .map(|t| trade.timestamp - t)
                .unwrap_or(0),

            market_hour,
            hours_until_market,
        }
    }

    /// Extract features, then append the candidate to the history.
    ///
    /// The next extraction for the same market sees this trade reflected.
    /// Run under the per-key store lock so no other operation on the same
    /// key interleaves between the read and the append.
    pub fn extract_and_record(
        trade: &TradeCandidate,
        history: &mut MarketHistory,
    ) -> FeatureRecord {
        let record = Self::extract(trade, history);
        history.record(trade);
        record
    }
}

/// Best-effort market hour from a market key like `january-21-2am-et`.
///
/// Total: returns `None` on any non-match or parse failure, with the
/// [`DEFAULT_MARKET_HOUR`] applied by the caller. Tokens are split on `-`;
/// the first token containing `am`/`pm` whose digits parse wins, with 12
/// added to `pm` hours below 12.
pub fn parse_market_hour(market_key: &str) -> Option<u32> {
    let lower = market_key.to_lowercase();
    for token in lower.split('-') {
        let is_pm = token.contains("pm");
        if !is_pm && !token.contains("am") {
            continue;
        }
        let digits = token.replace("am", "").replace("pm", "").replace("et", "");
        let Ok(hour) = digits.parse::<u32>() else {
            continue;
        };
        return Some(if is_pm && hour < 12 { hour + 12 } else { hour });
    }
    None
}
