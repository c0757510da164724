//! Inference pipeline: encode, reorder, standardize, classify.

use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifacts;
use crate::encoder;
use crate::error::{HeartRiskError, Result};
use crate::forest::{to_matrix, ForestClassifier};
use crate::records::RawFeatureRecord;
use crate::scaler::StandardScaler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    Low,
    High,
}

impl RiskLabel {
    pub fn from_class(class: i32) -> Self {
        if class >= 1 {
            RiskLabel::High
        } else {
            RiskLabel::Low
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLabel::Low => write!(f, "low"),
            RiskLabel::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub risk: RiskLabel,
    pub class: i32,
    pub probability: f64,
}

/// The fitted classifier and scaler, loaded once and never mutated.
#[derive(Debug)]
pub struct PredictionContext {
    classifier: ForestClassifier,
    scaler: StandardScaler,
}

impl PredictionContext {
    pub fn new(classifier: ForestClassifier, scaler: StandardScaler) -> Self {
        PredictionContext { classifier, scaler }
    }

    pub async fn load(model_dir: &Path) -> Result<Self> {
        let (classifier, scaler) = artifacts::load(model_dir).await?;
        Ok(PredictionContext::new(classifier, scaler))
    }

    pub fn classifier(&self) -> &ForestClassifier {
        &self.classifier
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn predict(&self, record: &RawFeatureRecord) -> Result<Prediction> {
        record.validate()?;
        let encoded = encoder::encode(record)?;
        let scaled = self.scaler.transform_named(&encoded.named_values())?;
        let x = to_matrix(&[scaled])?;

        let (class, probability) = self
            .classifier
            .predict_with_proba(&x)?
            .into_iter()
            .next()
            .ok_or_else(|| HeartRiskError::Model("classifier returned no prediction".to_string()))?;

        Ok(Prediction {
            risk: RiskLabel::from_class(class),
            class,
            probability,
        })
    }

    /// Scores every record of a CSV stream; the first bad row aborts.
    pub fn predict_csv<R: Read>(&self, reader: R) -> Result<Vec<Prediction>> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut predictions = Vec::new();
        for result in rdr.deserialize() {
            let record: RawFeatureRecord = result?;
            predictions.push(self.predict(&record)?);
        }
        Ok(predictions)
    }
}
