use crate::common::errors::Result;
use crate::common::types::{Prediction, SizePrediction};
use crate::features::FeatureRecord;

/// Boundary to the externally trained outcome/size predictor.
///
/// Both operations are synchronous and side-effect-free from the caller's
/// perspective, and must be deterministic for identical loaded model state
/// and identical feature input; the decision engine is tested against a
/// deterministic stub of this trait. Training, tuning and artifact
/// persistence all live outside this crate; only the interface shape is
/// consumed here.
///
/// Failure mode for both operations is
/// [`EngineError::ModelUnavailable`](crate::common::errors::EngineError::ModelUnavailable).
#[cfg_attr(test, mockall::automock)]
pub trait Predictor: Send + Sync {
    /// Predict which outcome the market will resolve to
    fn predict_outcome(&self, features: &FeatureRecord) -> Result<Prediction>;

    /// Predict a trade size in quote currency
    fn predict_size(&self, features: &FeatureRecord) -> Result<SizePrediction>;
}

/// Boxed predictor for dynamic dispatch
pub type BoxedPredictor = Box<dyn Predictor>;
