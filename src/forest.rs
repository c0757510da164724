//! Bagged ensemble of smartcore decision trees.
//!
//! Each tree is grown on a bootstrap sample of the rows and every split
//! considers all features. There is no per-split feature subsampling, so
//! this is bagging rather than a random forest proper.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters,
};

use crate::error::{HeartRiskError, Result};

type Tree = DecisionTreeClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParameters {
    pub n_trees: usize,
    pub seed: u64,
    pub max_depth: Option<u16>,
}

impl Default for ForestParameters {
    fn default() -> Self {
        ForestParameters {
            n_trees: 150,
            seed: 42,
            max_depth: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ForestClassifier {
    parameters: ForestParameters,
    n_features: usize,
    trees: Vec<Tree>,
}

/// Row-major dense matrix for smartcore.
pub fn to_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    let nrows = rows.len();
    let ncols = rows.first().map(Vec::len).unwrap_or(0);
    if nrows == 0 || ncols == 0 {
        return Err(HeartRiskError::EmptyDataset {
            reason: "matrix needs at least one row and one column".to_string(),
        });
    }
    let mut values = Vec::with_capacity(nrows * ncols);
    for row in rows {
        if row.len() != ncols {
            return Err(HeartRiskError::Model(format!(
                "ragged row of {} values, expected {}",
                row.len(),
                ncols
            )));
        }
        values.extend_from_slice(row);
    }
    Ok(DenseMatrix::new(nrows, ncols, values, false))
}

fn has_two_classes(labels: &[i32]) -> bool {
    labels.first().map_or(false, |first| labels.iter().any(|l| l != first))
}

const MAX_BOOTSTRAP_DRAWS: usize = 64;

/// Draws rows with replacement until the sample holds more than one class.
fn bootstrap(
    rng: &mut StdRng,
    rows: &[Vec<f64>],
    labels: &[i32],
) -> Result<(Vec<Vec<f64>>, Vec<i32>)> {
    let n = rows.len();
    for _ in 0..MAX_BOOTSTRAP_DRAWS {
        let mut sample_rows = Vec::with_capacity(n);
        let mut sample_labels = Vec::with_capacity(n);
        for _ in 0..n {
            let idx = rng.gen_range(0..n);
            sample_rows.push(rows[idx].clone());
            sample_labels.push(labels[idx]);
        }
        if has_two_classes(&sample_labels) {
            return Ok((sample_rows, sample_labels));
        }
    }
    Err(HeartRiskError::Model(format!(
        "no bootstrap sample with two classes after {MAX_BOOTSTRAP_DRAWS} draws"
    )))
}

impl ForestClassifier {
    pub fn fit(rows: &[Vec<f64>], labels: &[i32], parameters: ForestParameters) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(HeartRiskError::Model(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if parameters.n_trees == 0 {
            return Err(HeartRiskError::Model("forest needs at least one tree".to_string()));
        }
        if !has_two_classes(labels) {
            return Err(HeartRiskError::Model(
                "training labels must contain at least two classes".to_string(),
            ));
        }
        let n_features = rows.first().map(Vec::len).unwrap_or(0);
        let n = rows.len();
        let mut rng = StdRng::seed_from_u64(parameters.seed);
        let mut trees = Vec::with_capacity(parameters.n_trees);

        let mut tree_parameters = DecisionTreeClassifierParameters::default();
        if let Some(depth) = parameters.max_depth {
            tree_parameters = tree_parameters.with_max_depth(depth);
        }

        for i in 0..parameters.n_trees {
            let (sample_rows, sample_labels) = bootstrap(&mut rng, rows, labels)?;
            let x = to_matrix(&sample_rows)?;
            trees.push(Tree::fit(&x, &sample_labels, tree_parameters.clone())?);
            log::trace!("fitted tree {}/{}", i + 1, parameters.n_trees);
        }

        log::debug!("fitted {} trees on {} rows", trees.len(), n);
        Ok(ForestClassifier {
            parameters,
            n_features,
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn parameters(&self) -> ForestParameters {
        self.parameters
    }

    fn positive_votes(&self, x: &DenseMatrix<f64>) -> Result<Vec<usize>> {
        let (nrows, ncols) = x.shape();
        if ncols != self.n_features {
            return Err(HeartRiskError::Model(format!(
                "classifier was fitted on {} features, got {}",
                self.n_features, ncols
            )));
        }
        let mut votes = vec![0usize; nrows];
        for tree in self.trees.iter() {
            let predicted = tree.predict(x)?;
            for (slot, class) in votes.iter_mut().zip(predicted.iter()) {
                if *class >= 1 {
                    *slot += 1;
                }
            }
        }
        Ok(votes)
    }

    /// Share of trees voting for the positive class, per row.
    pub fn predict_proba(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>> {
        let total = self.trees.len() as f64;
        Ok(self
            .positive_votes(x)?
            .into_iter()
            .map(|v| v as f64 / total)
            .collect())
    }

    /// Majority vote; a tie goes to the negative class.
    pub fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<i32>> {
        let total = self.trees.len();
        Ok(self
            .positive_votes(x)?
            .into_iter()
            .map(|v| i32::from(2 * v > total))
            .collect())
    }

    /// Class and positive probability per row from a single pass over the trees.
    pub fn predict_with_proba(&self, x: &DenseMatrix<f64>) -> Result<Vec<(i32, f64)>> {
        let total = self.trees.len();
        Ok(self
            .positive_votes(x)?
            .into_iter()
            .map(|v| (i32::from(2 * v > total), v as f64 / total as f64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<i32>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let v = i as f64;
            rows.push(vec![v, (i % 7) as f64]);
            labels.push(i32::from(i >= 20));
        }
        (rows, labels)
    }

    #[test]
    fn predicts_training_labels_on_separable_data() {
        let (rows, labels) = separable();
        let params = ForestParameters { n_trees: 25, ..ForestParameters::default() };
        let forest = ForestClassifier::fit(&rows, &labels, params).unwrap();
        let x = to_matrix(&[vec![2.0, 2.0], vec![37.0, 2.0]]).unwrap();
        assert_eq!(forest.predict(&x).unwrap(), vec![0, 1]);
        assert_eq!(forest.n_trees(), 25);
    }

    #[test]
    fn probabilities_lie_in_unit_interval_and_agree_with_labels() {
        let (rows, labels) = separable();
        let params = ForestParameters { n_trees: 15, ..ForestParameters::default() };
        let forest = ForestClassifier::fit(&rows, &labels, params).unwrap();
        let x = to_matrix(&rows).unwrap();
        let proba = forest.predict_proba(&x).unwrap();
        let predicted = forest.predict(&x).unwrap();
        for (p, class) in proba.iter().zip(predicted.iter()) {
            assert!((0.0..=1.0).contains(p));
            assert_eq!(*class >= 1, *p > 0.5);
        }
    }

    #[test]
    fn single_pass_matches_predict_and_predict_proba() {
        let (rows, labels) = separable();
        let params = ForestParameters { n_trees: 9, ..ForestParameters::default() };
        let forest = ForestClassifier::fit(&rows, &labels, params).unwrap();
        let x = to_matrix(&rows).unwrap();
        let (classes, proba): (Vec<i32>, Vec<f64>) =
            forest.predict_with_proba(&x).unwrap().into_iter().unzip();
        assert_eq!(classes, forest.predict(&x).unwrap());
        assert_eq!(proba, forest.predict_proba(&x).unwrap());
    }

    #[test]
    fn same_seed_gives_same_forest() {
        let (rows, labels) = separable();
        let params = ForestParameters { n_trees: 10, seed: 7, max_depth: Some(3) };
        let a = ForestClassifier::fit(&rows, &labels, params).unwrap();
        let b = ForestClassifier::fit(&rows, &labels, params).unwrap();
        let x = to_matrix(&rows).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn feature_count_is_checked() {
        let (rows, labels) = separable();
        let params = ForestParameters { n_trees: 3, ..ForestParameters::default() };
        let forest = ForestClassifier::fit(&rows, &labels, params).unwrap();
        let x = to_matrix(&[vec![1.0, 2.0, 3.0]]).unwrap();
        assert!(forest.predict(&x).is_err());
    }

    #[test]
    fn mismatched_labels_are_rejected() {
        let (rows, _) = separable();
        assert!(ForestClassifier::fit(&rows, &[0, 1], ForestParameters::default()).is_err());
    }

    #[test]
    fn single_class_is_rejected() {
        let (rows, _) = separable();
        let labels = vec![1; rows.len()];
        assert!(ForestClassifier::fit(&rows, &labels, ForestParameters::default()).is_err());
    }
}
