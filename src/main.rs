use std::fs::File;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use env_logger::{Builder, Env};
use log::{debug, info, LevelFilter};
use sysinfo::{get_current_pid, ProcessExt, System, SystemExt};

use heart_risk::config::{Cli, Command, PredictArgs, ServeArgs, TrainArgs};
use heart_risk::predictor::PredictionContext;
use heart_risk::server;
use heart_risk::train::{self, TrainConfig};

/// Resident memory of this process in bytes, 0 when unavailable.
fn monitor_memory() -> u64 {
    let mut sys = System::new();
    match get_current_pid() {
        Ok(pid) => {
            sys.refresh_process(pid);
            sys.process(pid).map(|p| p.memory()).unwrap_or(0)
        }
        Err(_) => 0,
    }
}

async fn run_train(args: TrainArgs) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let start_memory = monitor_memory();

    let config = TrainConfig::from(args);
    let summary = train::train(&config)
        .await
        .with_context(|| format!("training on {}", config.dataset.display()))?;

    println!("Model trained successfully!");
    println!("Accuracy: {:.2}%", summary.accuracy() * 100.0);
    println!("\nClassification Report:\n{}", summary.report);
    println!(
        "Model and scaler saved inside {}",
        config.model_dir.display()
    );

    let end_memory = monitor_memory();
    info!("training took {:?}", start_time.elapsed());
    info!("memory used: {} bytes", end_memory.saturating_sub(start_memory));
    Ok(())
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let context = PredictionContext::load(&args.model_dir)
        .await
        .with_context(|| format!("loading artifacts from {}", args.model_dir.display()))?;
    server::serve(Arc::new(context), &args.listen).await?;
    Ok(())
}

async fn run_predict(args: PredictArgs) -> anyhow::Result<()> {
    let context = PredictionContext::load(&args.model_dir)
        .await
        .with_context(|| format!("loading artifacts from {}", args.model_dir.display()))?;
    let file = File::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    println!("risk,probability");
    for prediction in context.predict_csv(file)? {
        println!("{},{:.2}", prediction.risk, prediction.probability);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let env = Env::new().filter("HEART_RISK_LOG");
    Builder::new()
        .filter(Some("heart_risk"), log_level)
        .parse_env(env)
        .init();

    debug!("Arguments {:#?}", cli);

    match cli.command {
        Command::Train(args) => run_train(args).await,
        Command::Serve(args) => run_serve(args).await,
        Command::Predict(args) => run_predict(args).await,
    }
}
