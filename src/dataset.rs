use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use polars::prelude::*;
use polars_io::parquet::ParquetWriter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::encoder::encode_cell;
use crate::error::{HeartRiskError, Result};
use crate::records::{CATEGORICAL_COLUMNS, FEATURE_COLUMNS, RAW_SCHEMA, TARGET_COLUMN};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Parquet,
}

pub async fn read_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let file = File::open(path)?;

    let df = CsvReader::new(file)
        .has_header(true)
        .with_dtypes(Some(Arc::new(RAW_SCHEMA.clone())))
        .finish()?;
    Ok(df)
}

pub async fn write_csv<P: AsRef<Path>>(path: P, df: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)?;

    CsvWriter::new(&mut file).finish(df)?;

    Ok(())
}

pub async fn write_parquet<P: AsRef<Path>>(path: P, df: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)?;

    ParquetWriter::new(&mut file).finish(df)?;

    Ok(())
}

pub async fn export<P: AsRef<Path>>(path: P, df: &mut DataFrame, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(path, df).await,
        ExportFormat::Parquet => write_parquet(path, df).await,
    }
}

fn encode_column(column: &Series) -> Result<Series> {
    let name = column.name();
    let values = column.utf8()?;
    let mut encoded: Vec<Option<f64>> = Vec::with_capacity(values.len());
    for value in values {
        encoded.push(encode_cell(name, value)?.map(f64::from));
    }
    Ok(Series::new(name, encoded))
}

/// Collapses `num` into 0 (no disease) / 1 (disease present).
fn binarize_target(column: &Series) -> Result<Series> {
    let values = column.cast(&DataType::Int64)?;
    let mut labels: Vec<i32> = Vec::with_capacity(values.len());
    for value in values.i64()? {
        match value {
            Some(v) => labels.push(i32::from(v >= 1)),
            None => {
                return Err(HeartRiskError::MissingValue {
                    column: TARGET_COLUMN.to_string(),
                })
            }
        }
    }
    Ok(Series::new(TARGET_COLUMN, labels))
}

/// Turns the raw dataset into the training table: features in
/// `FEATURE_COLUMNS` order as Float64 with nulls replaced by the column mean,
/// followed by the binary target.
pub fn prepare(df: &DataFrame) -> Result<DataFrame> {
    if df.height() == 0 {
        return Err(HeartRiskError::EmptyDataset {
            reason: "dataset file has no rows".to_string(),
        });
    }

    let numeric: Vec<Expr> = FEATURE_COLUMNS
        .iter()
        .filter(|name| !CATEGORICAL_COLUMNS.contains(*name))
        .map(|name| col(name).cast(DataType::Float64))
        .collect();
    let numeric = df.clone().lazy().select(numeric).collect()?;

    let mut columns = Vec::with_capacity(FEATURE_COLUMNS.len() + 1);
    for name in FEATURE_COLUMNS {
        let series = if CATEGORICAL_COLUMNS.contains(&name) {
            encode_column(df.column(name)?)?
        } else {
            numeric.column(name)?.clone()
        };
        if series.null_count() == series.len() {
            return Err(HeartRiskError::MissingValue {
                column: name.to_string(),
            });
        }
        log::debug!("column `{}`: {} missing values", name, series.null_count());
        columns.push(series);
    }

    let mut prepared = DataFrame::new(columns)?.fill_null(FillNullStrategy::Mean)?;
    prepared.with_column(binarize_target(df.column(TARGET_COLUMN)?)?)?;
    Ok(prepared)
}

pub fn feature_and_target(in_df: &DataFrame) -> Result<(DataFrame, DataFrame)> {
    let features = in_df.select(FEATURE_COLUMNS)?;
    let target = in_df.select([TARGET_COLUMN])?;

    Ok((features, target))
}

/// Row-major copy of a Float64 feature frame.
pub fn features_to_rows(features: &DataFrame) -> Result<Vec<Vec<f64>>> {
    let mut rows: Vec<Vec<f64>> = vec![Vec::with_capacity(features.width()); features.height()];
    for series in features.get_columns() {
        let values = series.f64()?;
        for (row, value) in rows.iter_mut().zip(values) {
            let value = value.ok_or_else(|| HeartRiskError::MissingValue {
                column: series.name().to_string(),
            })?;
            row.push(value);
        }
    }
    Ok(rows)
}

pub fn target_to_labels(target: &DataFrame) -> Result<Vec<i32>> {
    let labels = target.column(TARGET_COLUMN)?.i32()?.into_no_null_iter().collect();
    Ok(labels)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub x_train: Vec<Vec<f64>>,
    pub x_test: Vec<Vec<f64>>,
    pub y_train: Vec<i32>,
    pub y_test: Vec<i32>,
}

/// Seeded split stratified on the label: each class contributes
/// `round(n_class * test_size)` rows to the test partition.
pub fn train_test_split(
    rows: &[Vec<f64>],
    labels: &[i32],
    test_size: f64,
    seed: u64,
) -> Result<Split> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(HeartRiskError::InvalidParameter(format!(
            "test size must lie in (0, 1), got {test_size}"
        )));
    }
    if rows.len() != labels.len() {
        return Err(HeartRiskError::InvalidParameter(format!(
            "{} rows but {} labels",
            rows.len(),
            labels.len()
        )));
    }

    let mut by_class: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (idx, label) in labels.iter().enumerate() {
        by_class.entry(*label).or_default().push(idx);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_idx = Vec::new();
    let mut test_idx = Vec::new();
    for (class, mut members) in by_class {
        if members.len() < 2 {
            return Err(HeartRiskError::EmptyDataset {
                reason: format!("class {class} has fewer than two rows to stratify"),
            });
        }
        members.shuffle(&mut rng);
        let n_test = ((members.len() as f64 * test_size).round() as usize).clamp(1, members.len() - 1);
        test_idx.extend_from_slice(&members[..n_test]);
        train_idx.extend_from_slice(&members[n_test..]);
    }
    train_idx.sort_unstable();
    test_idx.sort_unstable();

    Ok(Split {
        x_train: train_idx.iter().map(|&i| rows[i].clone()).collect(),
        x_test: test_idx.iter().map(|&i| rows[i].clone()).collect(),
        y_train: train_idx.iter().map(|&i| labels[i]).collect(),
        y_test: test_idx.iter().map(|&i| labels[i]).collect(),
    })
}
