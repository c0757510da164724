use polars::prelude::PolarsError;
use smartcore::error::Failed;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HeartRiskError>;

#[derive(Error, Debug)]
pub enum HeartRiskError {
    #[error("unknown category {value:?} for field `{field}`")]
    UnknownCategory { field: &'static str, value: String },
    #[error("schema mismatch: scaler expects {expected:?}, got {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("value {value} for field `{field}` is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("missing value in column `{column}`")]
    MissingValue { column: String },
    #[error("encoding table of the persisted scaler differs from the current encoder")]
    EncodingMismatch,
    #[error("dataset has no usable rows: {reason}")]
    EmptyDataset { reason: String },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("model error: {0}")]
    Model(String),
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl From<Failed> for HeartRiskError {
    fn from(e: Failed) -> Self {
        HeartRiskError::Model(e.to_string())
    }
}
