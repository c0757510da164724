use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::dataset::ExportFormat;
use crate::train::{TrainConfig, DATASET_PATH, MODEL_DIR};

#[derive(Parser, Debug)]
#[command(author, version, about = "Heart disease risk: train the classifier or serve the prediction form")]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(short, long, global = true, action = ArgAction::Count, help = "Verbose level")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fit scaler and classifier on the dataset and save both artifacts
    Train(TrainArgs),
    /// Serve the interactive prediction form
    Serve(ServeArgs),
    /// Score a CSV of raw feature records
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[arg(short, long, default_value = DATASET_PATH, help = "Input dataset (CSV)")]
    pub dataset: PathBuf,
    #[arg(short, long, default_value = MODEL_DIR, help = "Output directory for the artifacts")]
    pub model_dir: PathBuf,
    #[arg(long, default_value_t = 0.2, help = "Fraction of rows held out for evaluation")]
    pub test_size: f64,
    #[arg(long, default_value_t = 42, help = "Seed of the split and the forest")]
    pub seed: u64,
    #[arg(long, default_value_t = 150, help = "Number of trees")]
    pub trees: usize,
    #[arg(long, help = "Also write the prepared (encoded, imputed) table here")]
    pub export: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv, help = "Format of --export")]
    pub export_format: ExportFormat,
}

impl From<TrainArgs> for TrainConfig {
    fn from(args: TrainArgs) -> Self {
        TrainConfig {
            dataset: args.dataset,
            model_dir: args.model_dir,
            test_size: args.test_size,
            seed: args.seed,
            n_trees: args.trees,
            export: args.export.map(|path| (path, args.export_format)),
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(short, long, default_value = MODEL_DIR, help = "Directory holding the artifacts")]
    pub model_dir: PathBuf,
    #[arg(short, long, default_value = "127.0.0.1:8501", help = "Listen address")]
    pub listen: String,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(short, long, default_value = MODEL_DIR, help = "Directory holding the artifacts")]
    pub model_dir: PathBuf,
    #[arg(short, long, help = "CSV of raw feature records")]
    pub input: PathBuf,
}
