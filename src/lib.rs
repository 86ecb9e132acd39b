//! trade_gate Library
//!
//! Gates automated trade execution on binary-outcome prediction markets:
//! derives rolling time-series features from a market's recent trading
//! history, consults an externally trained outcome/size predictor, and
//! applies an ordered set of heuristic rules to decide whether to execute
//! a candidate trade and at what size.

pub mod common;
pub mod config;
pub mod engine;
pub mod features;
pub mod gateway;
pub mod predictor;

// Re-export commonly used types
pub use common::errors::{EngineError, Result};
pub use common::types::{Decision, Outcome, Prediction, Side, SizePrediction, TradeCandidate};
pub use config::{load_config, load_from_env, AppConfig, EngineConfig};
pub use engine::DecisionEngine;
pub use features::{FeatureExtractor, FeatureRecord, HistoryStore, MarketHistory};
pub use gateway::{DecisionRequest, DecisionResponse, Recommendation, RequestGateway};
pub use predictor::{ArtifactPredictor, BoxedPredictor, Predictor};
