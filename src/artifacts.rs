//! Persisted classifier and scaler.

use std::path::{Path, PathBuf};

use crate::encoder;
use crate::error::{HeartRiskError, Result};
use crate::forest::ForestClassifier;
use crate::scaler::StandardScaler;

pub const MODEL_FILE_NAME: &str = "heart_model.json";
pub const SCALER_FILE_NAME: &str = "scaler.json";

pub fn model_path(model_dir: &Path) -> PathBuf {
    model_dir.join(MODEL_FILE_NAME)
}

pub fn scaler_path(model_dir: &Path) -> PathBuf {
    model_dir.join(SCALER_FILE_NAME)
}

pub async fn save(model_dir: &Path, classifier: &ForestClassifier, scaler: &StandardScaler) -> Result<()> {
    tokio::fs::create_dir_all(model_dir).await?;
    tokio::fs::write(model_path(model_dir), serde_json::to_vec(classifier)?).await?;
    tokio::fs::write(scaler_path(model_dir), serde_json::to_vec_pretty(scaler)?).await?;
    log::info!("saved classifier and scaler under {}", model_dir.display());
    Ok(())
}

/// Loads both artifacts and checks they still fit the current encoder and
/// each other.
pub async fn load(model_dir: &Path) -> Result<(ForestClassifier, StandardScaler)> {
    let classifier: ForestClassifier =
        serde_json::from_slice(&tokio::fs::read(model_path(model_dir)).await?)?;
    let scaler: StandardScaler =
        serde_json::from_slice(&tokio::fs::read(scaler_path(model_dir)).await?)?;

    if scaler.encoding != encoder::fingerprint() {
        return Err(HeartRiskError::EncodingMismatch);
    }
    if classifier.n_features() != scaler.feature_names.len() {
        return Err(HeartRiskError::SchemaMismatch {
            expected: scaler.feature_names.clone(),
            found: vec![format!("classifier fitted on {} features", classifier.n_features())],
        });
    }
    log::info!(
        "loaded {} trees over {} features from {}",
        classifier.n_trees(),
        scaler.feature_names.len(),
        model_dir.display()
    );
    Ok((classifier, scaler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::{to_matrix, ForestParameters};

    fn tiny() -> (ForestClassifier, StandardScaler) {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let labels: Vec<i32> = (0..20).map(|i| i32::from(i >= 10)).collect();
        let scaler = StandardScaler::fit(&["a", "b"], &rows, encoder::fingerprint()).unwrap();
        let scaled = scaler.transform(&rows).unwrap();
        let params = ForestParameters { n_trees: 5, ..ForestParameters::default() };
        let classifier = ForestClassifier::fit(&scaled, &labels, params).unwrap();
        (classifier, scaler)
    }

    #[tokio::test]
    async fn saved_artifacts_predict_the_same() {
        let dir = tempfile::tempdir().unwrap();
        let (classifier, scaler) = tiny();
        save(dir.path(), &classifier, &scaler).await.unwrap();
        let (loaded_classifier, loaded_scaler) = load(dir.path()).await.unwrap();

        assert_eq!(loaded_scaler, scaler);
        let x = to_matrix(&scaler.transform(&[vec![3.0, 1.0], vec![15.0, 2.0]]).unwrap()).unwrap();
        assert_eq!(
            loaded_classifier.predict_proba(&x).unwrap(),
            classifier.predict_proba(&x).unwrap()
        );
        assert_eq!(loaded_classifier.parameters(), classifier.parameters());
    }

    #[tokio::test]
    async fn changed_encoding_table_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (classifier, mut scaler) = tiny();
        scaler.encoding = scaler.encoding.replace("Male=1", "Male=2");
        save(dir.path(), &classifier, &scaler).await.unwrap();
        assert!(matches!(load(dir.path()).await, Err(HeartRiskError::EncodingMismatch)));
    }

    #[tokio::test]
    async fn scaler_of_other_width_is_a_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let (classifier, _) = tiny();
        let rows: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64, 1.0, (i * i) as f64]).collect();
        let scaler = StandardScaler::fit(&["a", "b", "c"], &rows, encoder::fingerprint()).unwrap();
        save(dir.path(), &classifier, &scaler).await.unwrap();
        match load(dir.path()).await {
            Err(HeartRiskError::SchemaMismatch { expected, .. }) => assert_eq!(expected, ["a", "b", "c"]),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_artifacts_are_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load(dir.path()).await, Err(HeartRiskError::Io(_))));
    }
}
