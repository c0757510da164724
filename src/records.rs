use lazy_static::lazy_static;
use polars::prelude::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};

use crate::error::{HeartRiskError, Result};

pub const ID_COLUMN: &str = "id";
pub const SOURCE_COLUMN: &str = "dataset";
pub const TARGET_COLUMN: &str = "num";

/// Feature columns in the order of the dataset file once `id` and `dataset`
/// are dropped. The scaler records this order at fit time.
pub const FEATURE_COLUMNS: [&str; 13] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalch", "exang", "oldpeak",
    "slope", "ca", "thal",
];

pub const CATEGORICAL_COLUMNS: [&str; 7] = ["sex", "cp", "fbs", "restecg", "exang", "slope", "thal"];

pub struct HeartRecord {}

impl HeartRecord {
    pub fn raw_schema() -> Schema {
        Schema::from_iter(vec![
            Field::new(ID_COLUMN, DataType::Int64),
            Field::new("age", DataType::Float64),
            Field::new("sex", DataType::Utf8),
            Field::new(SOURCE_COLUMN, DataType::Utf8),
            Field::new("cp", DataType::Utf8),
            Field::new("trestbps", DataType::Float64),
            Field::new("chol", DataType::Float64),
            Field::new("fbs", DataType::Utf8),
            Field::new("restecg", DataType::Utf8),
            Field::new("thalch", DataType::Float64),
            Field::new("exang", DataType::Utf8),
            Field::new("oldpeak", DataType::Float64),
            Field::new("slope", DataType::Utf8),
            Field::new("ca", DataType::Float64),
            Field::new("thal", DataType::Utf8),
            Field::new(TARGET_COLUMN, DataType::Int64),
        ])
    }
}

lazy_static! {
    pub static ref RAW_SCHEMA: Schema = HeartRecord::raw_schema();
}

/// A numeric form input with its accepted range.
#[derive(Debug, Clone, Copy)]
pub struct NumericInput {
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

pub const NUMERIC_INPUTS: [NumericInput; 6] = [
    NumericInput { name: "age", label: "Age", min: 20.0, max: 100.0, step: 1.0 },
    NumericInput {
        name: "trestbps",
        label: "Resting Blood Pressure (mm Hg)",
        min: 90.0,
        max: 200.0,
        step: 1.0,
    },
    NumericInput { name: "chol", label: "Cholesterol (mg/dl)", min: 100.0, max: 400.0, step: 1.0 },
    NumericInput {
        name: "thalch",
        label: "Max Heart Rate Achieved",
        min: 70.0,
        max: 210.0,
        step: 1.0,
    },
    NumericInput {
        name: "oldpeak",
        label: "Oldpeak (ST Depression)",
        min: 0.0,
        max: 6.5,
        step: 0.1,
    },
    NumericInput { name: "ca", label: "Major Vessels (0-3)", min: 0.0, max: 3.0, step: 1.0 },
];

/// One patient's values as a user enters them, before encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeatureRecord {
    pub age: i32,
    pub sex: String,
    pub cp: String,
    pub trestbps: i32,
    pub chol: i32,
    pub fbs: bool,
    pub restecg: String,
    pub thalch: i32,
    pub exang: bool,
    pub oldpeak: f64,
    pub slope: String,
    pub ca: i32,
    pub thal: String,
}

impl Default for RawFeatureRecord {
    fn default() -> Self {
        RawFeatureRecord {
            age: 50,
            sex: "Male".to_string(),
            cp: "typical angina".to_string(),
            trestbps: 120,
            chol: 240,
            fbs: true,
            restecg: "normal".to_string(),
            thalch: 150,
            exang: true,
            oldpeak: 1.0,
            slope: "upsloping".to_string(),
            ca: 0,
            thal: "normal".to_string(),
        }
    }
}

impl RawFeatureRecord {
    fn numeric_value(&self, name: &str) -> Option<f64> {
        match name {
            "age" => Some(self.age as f64),
            "trestbps" => Some(self.trestbps as f64),
            "chol" => Some(self.chol as f64),
            "thalch" => Some(self.thalch as f64),
            "oldpeak" => Some(self.oldpeak),
            "ca" => Some(self.ca as f64),
            _ => None,
        }
    }

    /// Checks every numeric field against the bounds the form accepts.
    pub fn validate(&self) -> Result<()> {
        for input in NUMERIC_INPUTS.iter() {
            let value = self.numeric_value(input.name).unwrap_or(f64::NAN);
            if !(input.min..=input.max).contains(&value) {
                return Err(HeartRiskError::OutOfRange {
                    field: input.name,
                    value,
                    min: input.min,
                    max: input.max,
                });
            }
        }
        Ok(())
    }
}

/// A feature record with every categorical field replaced by its code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncodedRecord {
    pub age: i32,
    pub sex: i32,
    pub cp: i32,
    pub trestbps: i32,
    pub chol: i32,
    pub fbs: i32,
    pub restecg: i32,
    pub thalch: i32,
    pub exang: i32,
    pub oldpeak: f64,
    pub slope: i32,
    pub ca: i32,
    pub thal: i32,
}

impl EncodedRecord {
    /// Values paired with their column names, in `FEATURE_COLUMNS` order.
    pub fn named_values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("age", self.age as f64),
            ("sex", self.sex as f64),
            ("cp", self.cp as f64),
            ("trestbps", self.trestbps as f64),
            ("chol", self.chol as f64),
            ("fbs", self.fbs as f64),
            ("restecg", self.restecg as f64),
            ("thalch", self.thalch as f64),
            ("exang", self.exang as f64),
            ("oldpeak", self.oldpeak),
            ("slope", self.slope as f64),
            ("ca", self.ca as f64),
            ("thal", self.thal as f64),
        ]
    }
}
