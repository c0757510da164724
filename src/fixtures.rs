//! Small synthetic heart-disease datasets for tests.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::encoder;
use crate::forest::{ForestClassifier, ForestParameters};
use crate::predictor::PredictionContext;
use crate::records::{RawFeatureRecord, FEATURE_COLUMNS};
use crate::scaler::StandardScaler;

const HEADER: &str = "id,age,sex,dataset,cp,trestbps,chol,fbs,restecg,thalch,exang,oldpeak,slope,ca,thal,num";

/// Deterministic dataset where disease follows chest pain, angina and ST
/// depression. Every seventh row leaves `chol`, `slope` and `thal` empty.
pub fn dataset_csv(rows: usize) -> String {
    let cps = ["typical angina", "atypical angina", "non-anginal", "asymptomatic"];
    let ecgs = ["normal", "lv hypertrophy", "ST-T abnormality"];
    let slopes = ["upsloping", "flat", "downsloping"];
    let thals = ["normal", "fixed defect", "reversable defect"];
    let mut out = String::from(HEADER);
    out.push('\n');
    for i in 0..rows {
        let sick = i % 2 == 0;
        let cp = if sick { cps[3] } else { cps[i % 3] };
        let exang = if sick { "TRUE" } else { "FALSE" };
        let oldpeak = if sick { 2.0 + (i % 5) as f64 * 0.3 } else { (i % 4) as f64 * 0.2 };
        let num = if sick { 1 + (i % 4) } else { 0 };
        let sparse = i % 7 == 3;
        let chol = if sparse { String::new() } else { (180 + (i * 7) % 150).to_string() };
        let slope = if sparse { "" } else { slopes[i % 3] };
        let thal = if sparse { "" } else { thals[(i + usize::from(sick)) % 3] };
        let _ = writeln!(
            out,
            "{},{},{},Cleveland,{},{},{},{},{},{},{},{:.1},{},{},{},{}",
            i + 1,
            35 + (i * 3) % 40,
            if i % 3 == 0 { "Female" } else { "Male" },
            cp,
            110 + (i * 5) % 60,
            chol,
            if i % 5 == 0 { "TRUE" } else { "FALSE" },
            ecgs[i % 3],
            if sick { 120 + i % 30 } else { 150 + i % 40 },
            exang,
            oldpeak,
            slope,
            i % 4,
            thal,
            num
        );
    }
    out
}

pub fn write_dataset(dir: &Path, rows: usize) -> PathBuf {
    let path = dir.join("heart_disease_uci.csv");
    std::fs::write(&path, dataset_csv(rows)).expect("write fixture");
    path
}

pub fn sick_patient() -> RawFeatureRecord {
    RawFeatureRecord {
        age: 60,
        sex: "Male".to_string(),
        cp: "asymptomatic".to_string(),
        trestbps: 150,
        chol: 280,
        fbs: false,
        restecg: "normal".to_string(),
        thalch: 125,
        exang: true,
        oldpeak: 2.6,
        slope: "flat".to_string(),
        ca: 2,
        thal: "reversable defect".to_string(),
    }
}

pub fn healthy_patient() -> RawFeatureRecord {
    RawFeatureRecord {
        age: 45,
        sex: "Female".to_string(),
        cp: "atypical angina".to_string(),
        trestbps: 120,
        chol: 210,
        fbs: false,
        restecg: "normal".to_string(),
        thalch: 175,
        exang: false,
        oldpeak: 0.2,
        slope: "upsloping".to_string(),
        ca: 0,
        thal: "normal".to_string(),
    }
}

/// Context trained in memory on variations of the two reference patients.
pub fn trained_context() -> PredictionContext {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..30 {
        let mut record = if i % 2 == 0 { sick_patient() } else { healthy_patient() };
        record.age += i % 9;
        record.chol += 3 * i;
        let named = encoder::encode(&record).expect("encode fixture").named_values();
        rows.push(named.iter().map(|(_, v)| *v).collect::<Vec<f64>>());
        labels.push(i32::from(i % 2 == 0));
    }
    let scaler = StandardScaler::fit(&FEATURE_COLUMNS, &rows, encoder::fingerprint()).expect("fit scaler");
    let scaled = scaler.transform(&rows).expect("scale fixture");
    let params = ForestParameters { n_trees: 11, ..ForestParameters::default() };
    let classifier = ForestClassifier::fit(&scaled, &labels, params).expect("fit forest");
    PredictionContext::new(classifier, scaler)
}
