//! Command-line interface
//!
//! Four subcommands mirror the pipeline stages: preprocess, train, predict,
//! serve.

use clap::{Parser, Subcommand};
use colored::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use crate::artifacts::{ArtifactStore, ModelLoader};
use crate::data;
use crate::error::Result;
use crate::server::{run_server, ServerConfig, DEFAULT_MODEL_KIND};
use crate::training::run_training;

fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

#[derive(Parser)]
#[command(name = "cardioml", about = "Heart disease prediction pipeline", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clean the raw dataset and write the processed table
    Preprocess {
        /// Raw CSV input
        #[arg(short, long, default_value = "data/raw/heart_disease.csv")]
        input: PathBuf,
        /// Processed CSV output
        #[arg(short, long, default_value = "data/processed/heart_disease_clean.csv")]
        output: PathBuf,
    },
    /// Train both classifiers and persist artifacts
    Train {
        /// Processed CSV input
        #[arg(short, long, default_value = "data/processed/heart_disease_clean.csv")]
        data: PathBuf,
        /// Artifact output directory
        #[arg(short, long, default_value = "models")]
        models_dir: PathBuf,
    },
    /// Predict one record from a JSON object of feature values
    Predict {
        /// Model kind to load
        #[arg(short, long, default_value = DEFAULT_MODEL_KIND)]
        kind: String,
        /// Artifact directory
        #[arg(short, long, default_value = "models")]
        models_dir: PathBuf,
        /// JSON object or path to a JSON file, e.g. '{"age": 63, "sex": 1, ...}'
        input: String,
    },
    /// Serve predictions over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
        #[arg(short, long, default_value = "models")]
        models_dir: PathBuf,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Preprocess { input, output } => preprocess(&input, &output)?,
        Command::Train { data, models_dir } => train(&data, &models_dir)?,
        Command::Predict {
            kind,
            models_dir,
            input,
        } => predict(&kind, &models_dir, &input)?,
        Command::Serve {
            host,
            port,
            models_dir,
        } => {
            let config = ServerConfig {
                host,
                port,
                models_dir: models_dir.display().to_string(),
                ..ServerConfig::default()
            };
            run_server(config).await?;
        }
    }
    Ok(())
}

fn preprocess(input: &PathBuf, output: &PathBuf) -> Result<()> {
    let started = Instant::now();
    let raw = data::load_csv(input)?;
    step_ok(&format!(
        "loaded {} rows from {}",
        raw.height(),
        input.display()
    ));

    let mut cleaned = data::clean_data(&raw)?;
    let nulls: usize = cleaned.get_columns().iter().map(|c| c.null_count()).sum();
    step_ok(&format!(
        "cleaned: {} rows, {} columns, {} missing values",
        cleaned.height(),
        cleaned.width(),
        nulls
    ));

    data::write_csv(&mut cleaned, output)?;
    step_ok(&format!(
        "wrote {} {}",
        output.display(),
        muted(&format!("({:.2?})", started.elapsed()))
    ));
    Ok(())
}

fn train(data_path: &PathBuf, models_dir: &PathBuf) -> Result<()> {
    let started = Instant::now();
    let report = run_training(data_path, models_dir)?;

    println!();
    for (name, metrics) in &report.summary.models {
        println!("  {}", name.white().bold());
        println!(
            "    accuracy {:.3}  precision {:.3}  recall {:.3}  roc_auc {:.3}",
            metrics.accuracy, metrics.precision, metrics.recall, metrics.roc_auc
        );
        println!(
            "    cv roc_auc {:.3} ± {:.3}",
            metrics.cv_mean, metrics.cv_std
        );
    }
    println!();
    step_ok(&format!(
        "best by test ROC-AUC: {}",
        report.best_model.display_name().bold()
    ));
    step_ok(&format!(
        "{} artifacts written to {} {}",
        report.artifact_paths.len(),
        models_dir.display(),
        muted(&format!("({:.2?})", started.elapsed()))
    ));
    Ok(())
}

fn predict(kind: &str, models_dir: &PathBuf, input: &str) -> Result<()> {
    let json = if std::path::Path::new(input).exists() {
        std::fs::read_to_string(input)?
    } else {
        input.to_string()
    };
    let fields: HashMap<String, f64> = serde_json::from_str(&json)?;

    let store = ArtifactStore::new(models_dir);
    let mut loader = ModelLoader::new(store, kind);
    loader.resolve()?;

    let result = loader.predict_single(&fields)?;
    println!(
        "  {}  {}",
        result.prediction_label.white().bold(),
        muted(&format!(
            "probability {:.3}, confidence {:.3}",
            result.probability, result.confidence
        ))
    );
    Ok(())
}
