//! Configuration types

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Decision engine thresholds
    #[serde(default)]
    pub engine: EngineConfig,
    /// Model artifact locations
    #[serde(default)]
    pub model: ModelConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Decision engine tuning.
///
/// Defaults reproduce the thresholds the frozen models were evaluated
/// against; override them only together with a retrained artifact set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hours of day (UTC) with historically elevated trading activity
    #[serde(default = "default_active_hours")]
    pub active_hours: Vec<u32>,
    /// Confidence at which a prediction alone clears the gate
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Confidence that overrides a declared-outcome mismatch
    #[serde(default = "default_override_confidence")]
    pub override_confidence: f64,
    /// Below this confidence, non-cheap or off-hour trades are vetoed
    #[serde(default = "default_veto_confidence")]
    pub veto_confidence: f64,
    /// Fraction of the available balance a single trade may consume
    #[serde(default = "default_balance_fraction")]
    pub balance_fraction: f64,
    /// Minimum order size in quote currency
    #[serde(default = "default_min_order_usd")]
    pub min_order_usd: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            active_hours: default_active_hours(),
            min_confidence: default_min_confidence(),
            override_confidence: default_override_confidence(),
            veto_confidence: default_veto_confidence(),
            balance_fraction: default_balance_fraction(),
            min_order_usd: default_min_order_usd(),
        }
    }
}

fn default_active_hours() -> Vec<u32> {
    vec![3, 5, 8, 10, 23]
}

fn default_min_confidence() -> f64 {
    0.85
}

fn default_override_confidence() -> f64 {
    0.95
}

fn default_veto_confidence() -> f64 {
    0.90
}

fn default_balance_fraction() -> f64 {
    0.95
}

fn default_min_order_usd() -> f64 {
    1.0
}

/// Where the frozen model artifacts live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Directory containing `outcome_model.json` and `size_model.json`
    #[serde(default = "default_models_dir")]
    pub models_dir: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
        }
    }
}

fn default_models_dir() -> String {
    "models".to_string()
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
