//! Heart disease risk classifier: offline training job and form-based predictor
//! sharing one categorical encoding and one persisted scaler/classifier pair.

pub mod artifacts;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod forest;
pub mod metrics;
pub mod predictor;
pub mod records;
pub mod scaler;
pub mod server;
pub mod train;

#[cfg(test)]
mod fixtures;

pub use error::{HeartRiskError, Result};
pub use predictor::{Prediction, PredictionContext, RiskLabel};
pub use records::{EncodedRecord, RawFeatureRecord};
