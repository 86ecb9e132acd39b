//! Common test utilities and fixtures

#![allow(dead_code)]

use serde_json::json;

use trade_gate::common::errors::{EngineError, Result};
use trade_gate::common::types::{Prediction, SizePrediction};
use trade_gate::features::FeatureRecord;
use trade_gate::gateway::DecisionRequest;
use trade_gate::predictor::Predictor;

// 2021-01-21T10:00:00Z; hour 10 is in the default active set
pub const ACTIVE_HOUR_TS: i64 = 1_611_223_200;
// Two hours later: hour 12, inactive
pub const INACTIVE_HOUR_TS: i64 = ACTIVE_HOUR_TS + 2 * 3_600;

/// Deterministic predictor stub for exercising the full decision path
pub struct StubPredictor {
    p_up: f64,
    size: f64,
    available: bool,
}

impl StubPredictor {
    /// Predicts Up with the given confidence
    pub fn up(confidence: f64, size: f64) -> Self {
        Self {
            p_up: confidence,
            size,
            available: true,
        }
    }

    /// Predicts Down with the given confidence
    pub fn down(confidence: f64, size: f64) -> Self {
        Self {
            p_up: 1.0 - confidence,
            size,
            available: true,
        }
    }

    /// Fails every call with ModelUnavailable
    pub fn unavailable() -> Self {
        Self {
            p_up: 0.0,
            size: 0.0,
            available: false,
        }
    }
}

impl Predictor for StubPredictor {
    fn predict_outcome(&self, _features: &FeatureRecord) -> Result<Prediction> {
        if !self.available {
            return Err(EngineError::ModelUnavailable("stub offline".into()));
        }
        Ok(Prediction::from_up_probability(self.p_up))
    }

    fn predict_size(&self, _features: &FeatureRecord) -> Result<SizePrediction> {
        if !self.available {
            return Err(EngineError::ModelUnavailable("stub offline".into()));
        }
        Ok(SizePrediction {
            recommended_usdc_size: self.size,
        })
    }
}

/// Build a wire-shaped decision request
pub fn request(
    price: f64,
    side: &str,
    outcome: &str,
    usdc_size: f64,
    timestamp: i64,
    market_slug: &str,
    available_balance: f64,
) -> DecisionRequest {
    serde_json::from_value(json!({
        "price": price,
        "trader_side": side,
        "trader_outcome": outcome,
        "trader_size": if price > 0.0 { usdc_size / price } else { 0.0 },
        "trader_usdc_size": usdc_size,
        "timestamp": timestamp,
        "market_slug": market_slug,
        "available_balance": available_balance,
    }))
    .expect("fixture request must deserialize")
}

/// A BUY request with sensible defaults for the fields under test
pub fn buy_request(price: f64, outcome: &str, timestamp: i64) -> DecisionRequest {
    request(price, "BUY", outcome, 20.0, timestamp, "january-21-2am-et", 1_000.0)
}
