//! Train a price model from a CSV extract and publish the artifact.
//!
//! Flags override the `ML_*` / `ARTIFACT_PATH` / `TRAINING_DATA_PATH`
//! environment variables, which override the built-in defaults.

use anyhow::{Context, Result};
use clap::Parser;
use rentcast::application::ml::{Trainer, TrainerConfig};
use rentcast::config::ModelEnvConfig;
use rentcast::domain::ml::estimator::ModelKind;
use rentcast::domain::ml::feature_registry::FeatureSchema;
use rentcast::domain::pricing::record::TargetKind;
use rentcast::infrastructure::{CsvDatasetSource, FsArtifactStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to training data CSV
    #[arg(long)]
    input: Option<PathBuf>,

    /// Path to output artifact file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Label column to learn: monthly-rent or resale-price
    #[arg(long)]
    target: Option<TargetKind>,

    /// Numeric features: "rental", "extended", or a comma list (e.g. year,month,floor_area_sqm)
    #[arg(long)]
    features: Option<FeatureSchema>,

    /// Estimator: random-forest or linear
    #[arg(long)]
    model: Option<ModelKind>,

    /// Number of trees in the random forest
    #[arg(long)]
    n_trees: Option<usize>,

    /// Maximum depth of trees
    #[arg(long)]
    max_depth: Option<u16>,

    /// Minimum samples required to split an internal node
    #[arg(long)]
    min_split: Option<usize>,

    /// Share of rows held out for evaluation (0 trains on everything)
    #[arg(long)]
    test_fraction: Option<f64>,

    /// Seed for the split and the forest
    #[arg(long)]
    seed: Option<u64>,

    /// Drop the first category of each one-hot block (recommended for linear)
    #[arg(long)]
    drop_first: bool,

    /// Reference year for lease age (default: current year)
    #[arg(long)]
    reference_year: Option<i32>,
}

impl Args {
    fn apply(self, mut env: ModelEnvConfig) -> (ModelEnvConfig, Option<i32>) {
        if let Some(input) = self.input {
            env.training_data_path = input;
        }
        if let Some(output) = self.output {
            env.artifact_path = output;
        }
        if let Some(target) = self.target {
            env.target = target;
        }
        if let Some(features) = self.features {
            env.feature_schema = features;
        }
        if let Some(model) = self.model {
            env.model_kind = model;
        }
        if let Some(n_trees) = self.n_trees {
            env.n_trees = n_trees;
        }
        if let Some(max_depth) = self.max_depth {
            env.max_depth = max_depth;
        }
        if let Some(min_split) = self.min_split {
            env.min_samples_split = min_split;
        }
        if let Some(test_fraction) = self.test_fraction {
            env.test_fraction = test_fraction;
        }
        if let Some(seed) = self.seed {
            env.seed = seed;
        }
        env.drop_first |= self.drop_first;
        (env, self.reference_year)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let args = Args::parse();
    let env = ModelEnvConfig::from_env().context("Failed to load model config")?;
    let (env, reference_year) = args.apply(env);
    if !(0.0..1.0).contains(&env.test_fraction) {
        anyhow::bail!("--test-fraction must be in [0, 1), got {}", env.test_fraction);
    }

    let trainer_config = TrainerConfig {
        reference_year,
        ..env.to_trainer_config()
    };

    info!("Loading training data from {:?}", env.training_data_path);
    let source = CsvDatasetSource::new(&env.training_data_path);
    let store = Arc::new(FsArtifactStore::new(&env.artifact_path));
    let trainer = Trainer::new(trainer_config, store);

    let artifact = trainer
        .train_from(&source)
        .with_context(|| format!("Training from {:?} failed", env.training_data_path))?;

    let summary = &artifact.summary;
    println!("\n══════════════════════════════════════════════════════");
    println!("  TRAINING SUMMARY ({})", artifact.target);
    println!("══════════════════════════════════════════════════════");
    println!("  Model:      {}", artifact.model.kind());
    println!("  Features:   {} ({} columns)", artifact.feature_schema, artifact.encoder.width());
    println!("  Towns:      {}", artifact.encoder.towns().len());
    println!("  Flat types: {}", artifact.encoder.flat_types().len());
    println!(
        "  Rows:       {} read, {} skipped, {} train, {} eval",
        summary.rows_read, summary.rows_skipped, summary.train_rows, summary.eval_rows
    );
    match &summary.metrics {
        Some(m) => {
            println!("  RMSE:       {:.2}", m.rmse);
            println!("  MAE:        {:.2}", m.mae);
            println!("  R²:         {:.4}", m.r2);
        }
        None => println!("  Evaluation: skipped (no held-out rows)"),
    }
    println!("  Artifact:   {:?}", env.artifact_path);
    println!("══════════════════════════════════════════════════════\n");

    Ok(())
}
