//! Unified types used across the decision path

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Binary outcome a trade is buying exposure to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Up,
    Down,
}

impl Outcome {
    /// Index used by the size model (0 for Up, 1 for Down)
    pub fn index(&self) -> i32 {
        match self {
            Outcome::Up => 0,
            Outcome::Down => 1,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Up => write!(f, "Up"),
            Outcome::Down => write!(f, "Down"),
        }
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Up" => Ok(Outcome::Up),
            "Down" => Ok(Outcome::Down),
            other => Err(format!("unknown outcome: {other}")),
        }
    }
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
    Merge,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
            Side::Merge => write!(f, "MERGE"),
        }
    }
}

/// A proposed or observed trade, immutable once constructed
#[derive(Debug, Clone, PartialEq)]
pub struct TradeCandidate {
    /// Execution price, expected in (0, 1) exclusive
    pub price: f64,
    /// Trade size in outcome tokens
    pub size: f64,
    /// Trade size in quote currency (USDC)
    pub usdc_size: f64,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// Declared outcome, if any
    pub outcome: Option<Outcome>,
    pub side: Side,
    /// 0 for Up, 1 for Down, -1 when unset
    pub outcome_index: i32,
    /// Identifies the market this trade belongs to; non-empty
    pub market_key: String,
}

impl TradeCandidate {
    pub fn new(
        price: f64,
        size: f64,
        usdc_size: f64,
        timestamp: i64,
        outcome: Option<Outcome>,
        side: Side,
        market_key: impl Into<String>,
    ) -> Self {
        Self {
            price,
            size,
            usdc_size,
            timestamp,
            outcome,
            side,
            outcome_index: outcome.map(|o| o.index()).unwrap_or(-1),
            market_key: market_key.into(),
        }
    }
}

/// Output of the outcome predictor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted label (Up or Down)
    pub label: Outcome,
    /// Probability per label; sums to 1 within floating tolerance
    pub probabilities: HashMap<Outcome, f64>,
    /// Maximum class probability
    pub confidence: f64,
}

impl Prediction {
    /// Build a prediction from the Up probability of a binary model
    pub fn from_up_probability(p_up: f64) -> Self {
        let p_up = p_up.clamp(0.0, 1.0);
        let p_down = 1.0 - p_up;
        let label = if p_up >= p_down {
            Outcome::Up
        } else {
            Outcome::Down
        };
        let mut probabilities = HashMap::new();
        probabilities.insert(Outcome::Up, p_up);
        probabilities.insert(Outcome::Down, p_down);
        Self {
            label,
            probabilities,
            confidence: p_up.max(p_down),
        }
    }
}

/// Output of the size predictor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizePrediction {
    /// Recommended trade size in quote currency, >= 0
    pub recommended_usdc_size: f64,
}

/// Final decision with its audit trail
#[derive(Debug, Clone)]
pub struct Decision {
    /// Whether to execute the trade
    pub execute: bool,
    /// Ordered audit trail; never empty
    pub reasons: Vec<String>,
    pub predicted_outcome: Option<Outcome>,
    pub confidence: f64,
    pub recommended_size_usd: f64,
    pub ml_confidence: f64,
    pub is_cheaper_outcome: bool,
    pub is_active_hour: bool,
    pub outcome_match: bool,
}

impl Decision {
    /// Reject decision carrying a single reason and zeroed analytics
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            execute: false,
            reasons: vec![reason.into()],
            predicted_outcome: None,
            confidence: 0.0,
            recommended_size_usd: 0.0,
            ml_confidence: 0.0,
            is_cheaper_outcome: false,
            is_active_hour: false,
            outcome_match: false,
        }
    }

    /// Pass-through decision for non-BUY orders
    pub fn pass_through(reason: impl Into<String>, size_usd: f64) -> Self {
        Self {
            execute: true,
            reasons: vec![reason.into()],
            predicted_outcome: None,
            confidence: 1.0,
            recommended_size_usd: size_usd,
            ml_confidence: 1.0,
            is_cheaper_outcome: false,
            is_active_hour: false,
            outcome_match: false,
        }
    }

    /// Audit trail joined into a single pipe-separated string
    pub fn reason(&self) -> String {
        self.reasons.join(" | ")
    }
}
