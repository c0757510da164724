use std::path::PathBuf;

use log::info;

use crate::artifacts;
use crate::dataset::{self, ExportFormat};
use crate::encoder;
use crate::error::Result;
use crate::forest::{to_matrix, ForestClassifier, ForestParameters};
use crate::metrics::ClassificationReport;
use crate::records::FEATURE_COLUMNS;
use crate::scaler::StandardScaler;

pub static DATASET_PATH: &str = "dataset/heart_disease_uci.csv";
pub static MODEL_DIR: &str = "model";

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub dataset: PathBuf,
    pub model_dir: PathBuf,
    pub test_size: f64,
    pub seed: u64,
    pub n_trees: usize,
    pub export: Option<(PathBuf, ExportFormat)>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            dataset: PathBuf::from(DATASET_PATH),
            model_dir: PathBuf::from(MODEL_DIR),
            test_size: 0.2,
            seed: 42,
            n_trees: 150,
            export: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub report: ClassificationReport,
}

impl TrainingSummary {
    pub fn accuracy(&self) -> f64 {
        self.report.accuracy
    }
}

/// Runs the whole offline job and writes both artifacts to `model_dir`.
pub async fn train(config: &TrainConfig) -> Result<TrainingSummary> {
    let raw = dataset::read_csv(&config.dataset).await?;
    info!("read {} rows from {}", raw.height(), config.dataset.display());

    let mut prepared = dataset::prepare(&raw)?;
    if let Some((path, format)) = &config.export {
        dataset::export(path, &mut prepared, *format).await?;
        info!("exported prepared table to {} as {:?}", path.display(), format);
    }

    let (features, target) = dataset::feature_and_target(&prepared)?;
    let rows = dataset::features_to_rows(&features)?;
    let labels = dataset::target_to_labels(&target)?;

    let split = dataset::train_test_split(&rows, &labels, config.test_size, config.seed)?;
    info!("split into {} train / {} test rows", split.x_train.len(), split.x_test.len());

    let scaler = StandardScaler::fit(&FEATURE_COLUMNS, &split.x_train, encoder::fingerprint())?;
    let x_train = scaler.transform(&split.x_train)?;
    let x_test = scaler.transform(&split.x_test)?;

    let parameters = ForestParameters {
        n_trees: config.n_trees,
        seed: config.seed,
        max_depth: None,
    };
    let classifier = ForestClassifier::fit(&x_train, &split.y_train, parameters)?;
    info!("fitted {} trees", classifier.n_trees());

    let y_pred = classifier.predict(&to_matrix(&x_test)?)?;
    let report = ClassificationReport::new(&split.y_test, &y_pred);

    artifacts::save(&config.model_dir, &classifier, &scaler).await?;

    Ok(TrainingSummary {
        train_rows: split.x_train.len(),
        test_rows: split.x_test.len(),
        report,
    })
}
