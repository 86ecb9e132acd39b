//! Rolling market history and feature extraction
//!
//! One [`MarketHistory`] per market key, owned by the [`HistoryStore`];
//! [`FeatureExtractor`] reads a key's prior history, computes a flat
//! [`FeatureRecord`], and appends the candidate afterwards.

mod extractor;
mod history;
mod store;

pub use extractor::{
    parse_market_hour, FeatureExtractor, FeatureRecord, PriceCategory, DEFAULT_MARKET_HOUR,
};
pub use history::{MarketHistory, WindowField, PRICE_CHANGE_CAPACITY, WINDOW_CAPACITY};
pub use store::HistoryStore;
