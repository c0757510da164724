use num::Float;
use serde::{Deserialize, Serialize};

use crate::error::{HeartRiskError, Result};

/// Per-feature standardization `(x - mean) / scale` with the column order
/// captured at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    /// Encoding table the training data went through.
    pub encoding: String,
}

/// Population mean and standard deviation of a column.
fn mean_std<T: Float>(values: &[T]) -> (T, T) {
    if values.is_empty() {
        return (T::zero(), T::zero());
    }
    let n = T::from(values.len()).unwrap_or_else(T::one);
    let mean = values.iter().fold(T::zero(), |acc, &v| acc + v) / n;
    let var = values
        .iter()
        .fold(T::zero(), |acc, &v| acc + (v - mean) * (v - mean))
        / n;
    (mean, var.sqrt())
}

impl StandardScaler {
    pub fn fit(feature_names: &[&str], rows: &[Vec<f64>], encoding: String) -> Result<Self> {
        if rows.is_empty() {
            return Err(HeartRiskError::EmptyDataset {
                reason: "cannot fit a scaler on zero rows".to_string(),
            });
        }
        let ncols = feature_names.len();
        let mut mean = Vec::with_capacity(ncols);
        let mut scale = Vec::with_capacity(ncols);
        for col in 0..ncols {
            let column: Vec<f64> = rows
                .iter()
                .map(|row| {
                    row.get(col).copied().ok_or_else(|| HeartRiskError::SchemaMismatch {
                        expected: feature_names.iter().map(|n| n.to_string()).collect(),
                        found: vec![format!("row of {} values", row.len())],
                    })
                })
                .collect::<Result<_>>()?;
            let (m, s) = mean_std(&column);
            mean.push(m);
            // constant columns pass through centered
            scale.push(if s == 0.0 { 1.0 } else { s });
        }
        log::debug!("fitted scaler over {} rows x {} features", rows.len(), ncols);
        Ok(StandardScaler {
            feature_names: feature_names.iter().map(|n| n.to_string()).collect(),
            mean,
            scale,
            encoding,
        })
    }

    /// Transforms rows already laid out in the fitted column order.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.feature_names.len() {
            return Err(HeartRiskError::SchemaMismatch {
                expected: self.feature_names.clone(),
                found: vec![format!("row of {} values", row.len())],
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    /// Lays named values out in the fitted column order. Any missing, extra
    /// or duplicated name is a `SchemaMismatch`.
    pub fn reorder(&self, named: &[(&str, f64)]) -> Result<Vec<f64>> {
        let mismatch = || HeartRiskError::SchemaMismatch {
            expected: self.feature_names.clone(),
            found: named.iter().map(|(n, _)| n.to_string()).collect(),
        };
        if named.len() != self.feature_names.len() {
            return Err(mismatch());
        }
        self.feature_names
            .iter()
            .map(|name| {
                let mut hits = named.iter().filter(|(n, _)| n == name);
                match (hits.next(), hits.next()) {
                    (Some((_, v)), None) => Ok(*v),
                    _ => Err(mismatch()),
                }
            })
            .collect()
    }

    /// Reorders then standardizes one named row.
    pub fn transform_named(&self, named: &[(&str, f64)]) -> Result<Vec<f64>> {
        let ordered = self.reorder(named)?;
        self.transform_row(&ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> StandardScaler {
        let rows = vec![vec![1.0, 10.0, 5.0], vec![3.0, 20.0, 5.0], vec![5.0, 30.0, 5.0]];
        StandardScaler::fit(&["a", "b", "c"], &rows, "enc".to_string()).unwrap()
    }

    #[test]
    fn fit_captures_population_statistics() {
        let scaler = fitted();
        assert_eq!(scaler.mean, vec![3.0, 20.0, 5.0]);
        assert!((scaler.scale[0] - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((scaler.scale[1] - (200.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(scaler.scale[2], 1.0);
        assert_eq!(scaler.feature_names, vec!["a", "b", "c"]);
    }

    #[test]
    fn transformed_training_columns_are_standard() {
        let rows = vec![vec![1.0, 10.0, 5.0], vec![3.0, 20.0, 5.0], vec![5.0, 30.0, 5.0]];
        let scaler = fitted();
        let out = scaler.transform(&rows).unwrap();
        for col in 0..2 {
            let column: Vec<f64> = out.iter().map(|r| r[col]).collect();
            let (m, s) = mean_std(&column);
            assert!(m.abs() < 1e-12);
            assert!((s - 1.0).abs() < 1e-12);
        }
        assert!(out.iter().all(|r| r[2] == 0.0));
    }

    #[test]
    fn reorder_is_independent_of_input_permutation() {
        let scaler = fitted();
        let permutations: [[(&str, f64); 3]; 3] = [
            [("a", 1.0), ("b", 2.0), ("c", 3.0)],
            [("c", 3.0), ("a", 1.0), ("b", 2.0)],
            [("b", 2.0), ("c", 3.0), ("a", 1.0)],
        ];
        for named in permutations.iter() {
            assert_eq!(scaler.reorder(named).unwrap(), vec![1.0, 2.0, 3.0]);
        }
    }

    #[test]
    fn missing_extra_or_duplicate_columns_are_rejected() {
        let scaler = fitted();
        let missing = [("a", 1.0), ("b", 2.0)];
        let extra = [("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)];
        let duplicate = [("a", 1.0), ("a", 2.0), ("c", 3.0)];
        let renamed = [("a", 1.0), ("b", 2.0), ("z", 3.0)];
        for named in [&missing[..], &extra[..], &duplicate[..], &renamed[..]] {
            assert!(matches!(
                scaler.transform_named(named),
                Err(HeartRiskError::SchemaMismatch { .. })
            ));
        }
        assert!(scaler.transform_row(&[1.0]).is_err());
    }

    #[test]
    fn empty_fit_is_an_error() {
        assert!(StandardScaler::fit(&["a"], &[], String::new()).is_err());
    }
}
