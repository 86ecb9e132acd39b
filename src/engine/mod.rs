//! Trade execution decision engine
//!
//! Stateless across calls: a pure function of the candidate, its feature
//! record, the caller's constraints and the predictor output. Non-BUY
//! orders, out-of-range prices and predictor failures short-circuit; BUY
//! orders run through sizing and the ordered rule fold in [`rules`].

mod rules;

pub use rules::{evaluate_rules, RuleContext, RuleOutcome};

use tracing::{debug, warn};

use crate::common::types::{Decision, Outcome, Side, TradeCandidate};
use crate::config::EngineConfig;
use crate::features::FeatureRecord;
use crate::predictor::Predictor;

/// Applies the decision rules to one trade candidate
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: EngineConfig,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decide whether to execute `trade` and at what size.
    ///
    /// `features` must have been extracted for this exact candidate. A
    /// failed decision is a valid, final answer (`execute = false` with a
    /// reason); this method never fails and never mutates history.
    pub fn evaluate(
        &self,
        trade: &TradeCandidate,
        features: &FeatureRecord,
        available_balance: f64,
        predictor: &dyn Predictor,
    ) -> Decision {
        // Non-BUY orders execute as requested; only entries are gated
        if trade.side != Side::Buy {
            debug!(side = %trade.side, market = %trade.market_key, "bypassing non-BUY order");
            return Decision::pass_through("non-BUY order executes as-is", trade.usdc_size);
        }

        if trade.price <= 0.0 || trade.price >= 1.0 {
            return Decision::reject(format!("Invalid price: {}", trade.price));
        }

        let prediction = match predictor.predict_outcome(features) {
            Ok(p) => p,
            Err(e) => {
                warn!(market = %trade.market_key, error = %e, "outcome prediction failed");
                return Decision::reject("prediction unavailable");
            }
        };

        let outcome_match = trade
            .outcome
            .map(|declared| declared == prediction.label)
            .unwrap_or(true);

        let is_cheaper_outcome = match prediction.label {
            Outcome::Up => trade.price < 0.5,
            Outcome::Down => trade.price > 0.5,
        };

        let is_active_hour = self.config.active_hours.contains(&features.hour);

        let mut recommended_size_usd = match predictor.predict_size(features) {
            Ok(s) => (trade.usdc_size + s.recommended_usdc_size) / 2.0,
            Err(e) => {
                warn!(market = %trade.market_key, error = %e, "size prediction failed, using requested size");
                trade.usdc_size
            }
        };

        let size_cap = self.config.balance_fraction * available_balance;
        let size_was_capped = recommended_size_usd > size_cap;
        if size_was_capped {
            recommended_size_usd = size_cap;
        }
        if recommended_size_usd < self.config.min_order_usd {
            recommended_size_usd = 0.0;
        }

        let (execute, reasons) = evaluate_rules(&RuleContext {
            ml_confidence: prediction.confidence,
            outcome_match,
            declared_outcome: trade.outcome,
            predicted_outcome: prediction.label,
            is_cheaper_outcome,
            is_active_hour,
            hour: features.hour,
            recommended_size_usd,
            size_was_capped,
            config: &self.config,
        });

        debug!(
            market = %trade.market_key,
            execute,
            predicted = %prediction.label,
            confidence = prediction.confidence,
            size = recommended_size_usd,
            "decision evaluated"
        );

        Decision {
            execute,
            reasons,
            predicted_outcome: Some(prediction.label),
            confidence: prediction.confidence,
            recommended_size_usd: recommended_size_usd.max(0.0),
            ml_confidence: prediction.confidence,
            is_cheaper_outcome,
            is_active_hour,
            outcome_match,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::EngineError;
    use crate::common::types::{Prediction, SizePrediction};
    use crate::features::{FeatureExtractor, MarketHistory};
    use crate::predictor::MockPredictor;

    // 2021-01-21T10:00:00Z; hour 10 is in the default active set
    const ACTIVE_HOUR_TS: i64 = 1_611_223_200;
    // Two hours later: hour 12, inactive
    const INACTIVE_HOUR_TS: i64 = ACTIVE_HOUR_TS + 2 * 3_600;

    fn candidate(
        price: f64,
        usdc: f64,
        outcome: Option<Outcome>,
        side: Side,
        ts: i64,
    ) -> TradeCandidate {
        TradeCandidate::new(price, usdc / price.max(1e-9), usdc, ts, outcome, side, "test-market")
    }

    fn features_for(trade: &TradeCandidate) -> FeatureRecord {
        FeatureExtractor::extract(trade, &MarketHistory::new())
    }

    fn predicting(label: Outcome, confidence: f64, size: f64) -> MockPredictor {
        let mut predictor = MockPredictor::new();
        let p_up = match label {
            Outcome::Up => confidence,
            Outcome::Down => 1.0 - confidence,
        };
        predictor
            .expect_predict_outcome()
            .returning(move |_| Ok(Prediction::from_up_probability(p_up)));
        predictor.expect_predict_size().returning(move |_| {
            Ok(SizePrediction {
                recommended_usdc_size: size,
            })
        });
        predictor
    }

    #[test]
    fn test_non_buy_bypasses_without_predictor() {
        // No expectations set: any predictor call would panic the test
        let predictor = MockPredictor::new();
        let engine = DecisionEngine::default();
        for side in [Side::Sell, Side::Merge] {
            let trade = candidate(1.7, 25.0, None, side, ACTIVE_HOUR_TS);
            let d = engine.evaluate(&trade, &features_for(&trade), 0.0, &predictor);
            assert!(d.execute);
            assert_eq!(d.recommended_size_usd, 25.0);
            assert_eq!(d.confidence, 1.0);
            assert_eq!(d.reasons, vec!["non-BUY order executes as-is"]);
        }
    }

    #[test]
    fn test_price_gate_rejects_out_of_range() {
        let predictor = MockPredictor::new();
        let engine = DecisionEngine::default();
        for price in [0.0, -0.2, 1.0, 1.5] {
            let trade = candidate(price, 25.0, None, Side::Buy, ACTIVE_HOUR_TS);
            let d = engine.evaluate(&trade, &features_for(&trade), 1_000.0, &predictor);
            assert!(!d.execute, "price {price} should be rejected");
            assert!(d.reasons[0].contains(&format!("Invalid price: {price}")));
            assert_eq!(d.recommended_size_usd, 0.0);
        }
    }

    #[test]
    fn test_boundary_price_half_is_valid() {
        let engine = DecisionEngine::default();
        let predictor = predicting(Outcome::Up, 0.99, 10.0);
        let trade = candidate(0.5, 10.0, None, Side::Buy, ACTIVE_HOUR_TS);
        let d = engine.evaluate(&trade, &features_for(&trade), 1_000.0, &predictor);
        // 0.5 exactly is in range; Up at 0.5 is not the cheaper side
        assert!(!d.is_cheaper_outcome);
        assert!(d.execute);
    }

    #[test]
    fn test_prediction_failure_rejects() {
        let mut predictor = MockPredictor::new();
        predictor
            .expect_predict_outcome()
            .returning(|_| Err(EngineError::ModelUnavailable("no model loaded".into())));
        let engine = DecisionEngine::default();
        let trade = candidate(0.4, 25.0, None, Side::Buy, ACTIVE_HOUR_TS);
        let d = engine.evaluate(&trade, &features_for(&trade), 1_000.0, &predictor);
        assert!(!d.execute);
        assert_eq!(d.reasons, vec!["prediction unavailable"]);
        assert_eq!(d.predicted_outcome, None);
    }

    #[test]
    fn test_scenario_cheap_active_matching_executes() {
        // price 0.35, hour 10, predicted Up at 0.90, declared Up
        let engine = DecisionEngine::default();
        let predictor = predicting(Outcome::Up, 0.90, 20.0);
        let trade = candidate(0.35, 20.0, Some(Outcome::Up), Side::Buy, ACTIVE_HOUR_TS);
        let d = engine.evaluate(&trade, &features_for(&trade), 1_000.0, &predictor);

        assert!(d.execute);
        assert!(d.outcome_match);
        assert!(d.is_cheaper_outcome);
        assert!(d.is_active_hour);
        assert_eq!(d.predicted_outcome, Some(Outcome::Up));
        assert!((d.ml_confidence - 0.90).abs() < 1e-9);
        assert_eq!(d.recommended_size_usd, 20.0);
        assert_eq!(
            d.reasons,
            vec![
                "High ML confidence (90.0%)",
                "Trader outcome matches ML prediction",
                "Buying cheaper outcome (pattern match)",
                "Active trading hour (10:00)",
            ]
        );
    }

    #[test]
    fn test_scenario_low_confidence_inactive_hour_skips() {
        // price 0.48, hour 12, predicted Down at 0.80: neither cheap nor active
        let engine = DecisionEngine::default();
        let predictor = predicting(Outcome::Down, 0.80, 20.0);
        let trade = candidate(0.48, 20.0, None, Side::Buy, INACTIVE_HOUR_TS);
        let d = engine.evaluate(&trade, &features_for(&trade), 1_000.0, &predictor);

        assert!(!d.execute);
        assert!(!d.is_cheaper_outcome);
        assert!(!d.is_active_hour);
        assert!(d.outcome_match); // nothing declared
        assert!(d
            .reasons
            .contains(&"Low confidence + not cheaper = skip".to_string()));
        assert!(d
            .reasons
            .contains(&"Low confidence + inactive hour = skip".to_string()));
    }

    #[test]
    fn test_mismatch_survives_at_moderate_confidence() {
        // Declared Down, predicted Up at 0.88: match rule does not force,
        // but the 0.85 threshold already set execute and no veto applies
        let engine = DecisionEngine::default();
        let predictor = predicting(Outcome::Up, 0.88, 20.0);
        let trade = candidate(0.35, 20.0, Some(Outcome::Down), Side::Buy, ACTIVE_HOUR_TS);
        let d = engine.evaluate(&trade, &features_for(&trade), 1_000.0, &predictor);
        assert!(d.execute);
        assert!(!d.outcome_match);
        assert!(d
            .reasons
            .contains(&"Trader outcome (Down) differs from ML (Up)".to_string()));
    }

    #[test]
    fn test_mismatch_override_at_very_high_confidence() {
        let engine = DecisionEngine::default();
        let predictor = predicting(Outcome::Up, 0.96, 20.0);
        let trade = candidate(0.35, 20.0, Some(Outcome::Down), Side::Buy, ACTIVE_HOUR_TS);
        let d = engine.evaluate(&trade, &features_for(&trade), 1_000.0, &predictor);
        assert!(d.execute);
        assert!(d
            .reasons
            .contains(&"Executing despite mismatch due to very high confidence".to_string()));
    }

    #[test]
    fn test_recommended_size_is_mean_of_requested_and_predicted() {
        let engine = DecisionEngine::default();
        let predictor = predicting(Outcome::Up, 0.92, 30.0);
        let trade = candidate(0.35, 10.0, Some(Outcome::Up), Side::Buy, ACTIVE_HOUR_TS);
        let d = engine.evaluate(&trade, &features_for(&trade), 1_000.0, &predictor);
        assert_eq!(d.recommended_size_usd, 20.0);
    }

    #[test]
    fn test_size_prediction_failure_falls_back_to_requested() {
        let mut predictor = MockPredictor::new();
        predictor
            .expect_predict_outcome()
            .returning(|_| Ok(Prediction::from_up_probability(0.92)));
        predictor
            .expect_predict_size()
            .returning(|_| Err(EngineError::ModelUnavailable("size model".into())));
        let engine = DecisionEngine::default();
        let trade = candidate(0.35, 12.0, Some(Outcome::Up), Side::Buy, ACTIVE_HOUR_TS);
        let d = engine.evaluate(&trade, &features_for(&trade), 1_000.0, &predictor);
        assert!(d.execute);
        assert_eq!(d.recommended_size_usd, 12.0);
    }

    #[test]
    fn test_size_capped_to_balance_fraction() {
        let engine = DecisionEngine::default();
        let predictor = predicting(Outcome::Up, 0.92, 200.0);
        let trade = candidate(0.35, 200.0, Some(Outcome::Up), Side::Buy, ACTIVE_HOUR_TS);
        let d = engine.evaluate(&trade, &features_for(&trade), 100.0, &predictor);
        assert!(d.execute);
        assert_eq!(d.recommended_size_usd, 95.0);
        assert!(d
            .reasons
            .contains(&"Capped size to available balance".to_string()));
    }

    #[test]
    fn test_tiny_balance_caps_below_minimum_and_vetoes() {
        // Cap lands under $1: size is forced to 0 and the trade is vetoed
        // even at maximum confidence
        let engine = DecisionEngine::default();
        let predictor = predicting(Outcome::Up, 0.99, 50.0);
        let trade = candidate(0.35, 50.0, Some(Outcome::Up), Side::Buy, ACTIVE_HOUR_TS);
        let d = engine.evaluate(&trade, &features_for(&trade), 0.5, &predictor);
        assert!(!d.execute);
        assert_eq!(d.recommended_size_usd, 0.0);
        assert!(d
            .reasons
            .contains(&"Capped size to available balance".to_string()));
        assert!(d
            .reasons
            .contains(&"Recommended size ($0.00) below minimum ($1.00)".to_string()));
    }

    #[test]
    fn test_sub_minimum_request_forces_zero() {
        let engine = DecisionEngine::default();
        let predictor = predicting(Outcome::Up, 0.99, 0.4);
        let trade = candidate(0.35, 0.2, Some(Outcome::Up), Side::Buy, ACTIVE_HOUR_TS);
        let d = engine.evaluate(&trade, &features_for(&trade), 1_000.0, &predictor);
        assert!(!d.execute);
        assert_eq!(d.recommended_size_usd, 0.0);
    }
}
