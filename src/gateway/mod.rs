//! Request/response boundary
//!
//! Reads one decision request, runs it through history -> features ->
//! predictor -> engine, and emits one decision response. This is the only
//! component that touches wall-clock time (`timestamp: 0` means "now") and
//! the only one that mutates market history, always through the store's
//! per-key atomic unit.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::common::errors::{EngineError, Result};
use crate::common::types::{Decision, Outcome, Side, TradeCandidate};
use crate::config::EngineConfig;
use crate::engine::DecisionEngine;
use crate::features::{FeatureExtractor, FeatureRecord, HistoryStore};
use crate::predictor::BoxedPredictor;

/// One decision request, as received on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionRequest {
    /// Market price, expected in (0, 1)
    pub price: f64,
    pub trader_side: Side,
    /// Declared outcome; empty string or absent means unset
    #[serde(default, deserialize_with = "empty_outcome_as_none")]
    pub trader_outcome: Option<Outcome>,
    /// Trade size in outcome tokens
    #[serde(default)]
    pub trader_size: f64,
    /// Trade size in quote currency
    #[serde(default)]
    pub trader_usdc_size: f64,
    /// Unix seconds; 0 means "use current time"
    #[serde(default)]
    pub timestamp: i64,
    /// Market key, also parsed for an hour hint
    pub market_slug: String,
    #[serde(default)]
    pub available_balance: f64,
    /// Informational only in this core
    #[serde(default)]
    pub current_position_size: Option<f64>,
}

impl DecisionRequest {
    fn validate(&self) -> Result<()> {
        if self.market_slug.trim().is_empty() {
            return Err(EngineError::InvalidInput("market_slug is empty".into()));
        }
        for (name, value) in [
            ("price", self.price),
            ("trader_size", self.trader_size),
            ("trader_usdc_size", self.trader_usdc_size),
            ("available_balance", self.available_balance),
        ] {
            if !value.is_finite() {
                return Err(EngineError::InvalidInput(format!("{name} is not finite")));
            }
        }
        for (name, value) in [
            ("trader_size", self.trader_size),
            ("trader_usdc_size", self.trader_usdc_size),
            ("available_balance", self.available_balance),
        ] {
            if value < 0.0 {
                return Err(EngineError::InvalidInput(format!(
                    "{name} must be >= 0, got {value}"
                )));
            }
        }
        if self.timestamp < 0 {
            return Err(EngineError::InvalidInput(format!(
                "timestamp must be >= 0, got {}",
                self.timestamp
            )));
        }
        Ok(())
    }

    fn into_candidate(self) -> TradeCandidate {
        let timestamp = if self.timestamp == 0 {
            Utc::now().timestamp()
        } else {
            self.timestamp
        };
        TradeCandidate::new(
            self.price,
            self.trader_size,
            self.trader_usdc_size,
            timestamp,
            self.trader_outcome,
            self.trader_side,
            self.market_slug,
        )
    }
}

fn empty_outcome_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<Outcome>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<Outcome>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// One decision response, as emitted on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub execute: bool,
    /// Pipe-separated audit trail
    pub reason: String,
    pub predicted_outcome: Option<String>,
    pub confidence: f64,
    pub recommended_size_usd: f64,
    pub ml_confidence: f64,
    pub is_cheaper_outcome: bool,
    pub is_active_hour: bool,
    pub outcome_match: bool,
}

impl From<Decision> for DecisionResponse {
    fn from(d: Decision) -> Self {
        Self {
            execute: d.execute,
            reason: d.reason(),
            predicted_outcome: d.predicted_outcome.map(|o| o.to_string()),
            confidence: d.confidence,
            recommended_size_usd: d.recommended_size_usd,
            ml_confidence: d.ml_confidence,
            is_cheaper_outcome: d.is_cheaper_outcome,
            is_active_hour: d.is_active_hour,
            outcome_match: d.outcome_match,
        }
    }
}

impl DecisionResponse {
    /// Error-shaped response for the CLI's stderr channel
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            execute: false,
            reason: reason.into(),
            predicted_outcome: None,
            confidence: 0.0,
            recommended_size_usd: 0.0,
            ml_confidence: 0.0,
            is_cheaper_outcome: false,
            is_active_hour: false,
            outcome_match: false,
        }
    }
}

/// Detailed recommendation: the decision plus a feature snapshot
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub decision: DecisionResponse,
    pub analysis: Analysis,
}

/// Operator-facing analysis block accompanying a recommendation
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub price: f64,
    pub price_distance_from_50: f64,
    pub hour: u32,
    pub market_hour: u32,
    pub is_cheaper_outcome: bool,
    pub is_active_hour: bool,
    pub trade_sequence_num: usize,
}

/// Boundary adapter wiring history, features, predictor and engine together
pub struct RequestGateway {
    store: HistoryStore,
    engine: DecisionEngine,
    predictor: BoxedPredictor,
}

impl RequestGateway {
    pub fn new(engine_config: EngineConfig, predictor: BoxedPredictor) -> Self {
        Self {
            store: HistoryStore::new(),
            engine: DecisionEngine::new(engine_config),
            predictor,
        }
    }

    /// Evaluate one decision request.
    ///
    /// Fails only on malformed input; every predictor or rule outcome is a
    /// valid response. The candidate is recorded into its market's history
    /// whether or not the trade ends up executable; each one is a real
    /// market observation.
    pub fn decide(&self, request: DecisionRequest) -> Result<DecisionResponse> {
        let (decision, _) = self.evaluate(request)?;
        Ok(decision.into())
    }

    /// Evaluate one request and return the decision plus its analysis block
    pub fn recommend(&self, request: DecisionRequest) -> Result<Recommendation> {
        let (decision, features) = self.evaluate(request)?;
        let analysis = Analysis {
            price: features.price,
            price_distance_from_50: features.price_distance_from_50,
            hour: features.hour,
            market_hour: features.market_hour,
            is_cheaper_outcome: decision.is_cheaper_outcome,
            is_active_hour: decision.is_active_hour,
            trade_sequence_num: features.trade_sequence_num,
        };
        Ok(Recommendation {
            decision: decision.into(),
            analysis,
        })
    }

    fn evaluate(&self, request: DecisionRequest) -> Result<(Decision, FeatureRecord)> {
        request.validate()?;
        let available_balance = request.available_balance;
        let candidate = request.into_candidate();

        let features = self
            .store
            .with_market(&candidate.market_key, |history| {
                FeatureExtractor::extract_and_record(&candidate, history)
            });

        let decision =
            self.engine
                .evaluate(&candidate, &features, available_balance, self.predictor.as_ref());

        info!(
            market = %candidate.market_key,
            side = %candidate.side,
            execute = decision.execute,
            size = decision.recommended_size_usd,
            "decision"
        );
        Ok((decision, features))
    }

    /// Number of markets with recorded history
    pub fn tracked_markets(&self) -> usize {
        self.store.market_count()
    }
}
