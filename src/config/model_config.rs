//! Model and training configuration parsing from environment variables.

use crate::application::ml::trainer::TrainerConfig;
use crate::domain::ml::estimator::{ModelKind, ModelParams};
use crate::domain::ml::feature_registry::FeatureSchema;
use crate::domain::ml::feature_transform::EncoderOptions;
use crate::domain::pricing::record::TargetKind;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Model environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEnvConfig {
    pub artifact_path: PathBuf,
    pub training_data_path: PathBuf,
    pub target: TargetKind,
    pub feature_schema: FeatureSchema,
    pub model_kind: ModelKind,
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub drop_first: bool,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        let params = ModelParams::default();
        Self {
            artifact_path: PathBuf::from("data/ml/rent_model.json"),
            training_data_path: PathBuf::from("data/ml/rentals.csv"),
            target: TargetKind::MonthlyRent,
            feature_schema: FeatureSchema::rental(),
            model_kind: params.kind,
            n_trees: params.n_trees,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            drop_first: false,
            test_fraction: 0.2,
            seed: params.seed,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to parse {}={}", key, raw)),
        _ => Ok(default),
    }
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ModelEnvConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let test_fraction: f64 = parse_or(&lookup, "ML_TEST_FRACTION", defaults.test_fraction)?;
        if !(0.0..1.0).contains(&test_fraction) {
            anyhow::bail!("ML_TEST_FRACTION must be in [0, 1), got {}", test_fraction);
        }

        Ok(Self {
            artifact_path: parse_or(&lookup, "ARTIFACT_PATH", defaults.artifact_path)?,
            training_data_path: parse_or(&lookup, "TRAINING_DATA_PATH", defaults.training_data_path)?,
            target: parse_or(&lookup, "ML_TARGET", defaults.target)?,
            feature_schema: parse_or(&lookup, "ML_FEATURES", defaults.feature_schema)?,
            model_kind: parse_or(&lookup, "ML_MODEL", defaults.model_kind)?,
            n_trees: parse_or(&lookup, "ML_N_TREES", defaults.n_trees)?,
            max_depth: parse_or(&lookup, "ML_MAX_DEPTH", defaults.max_depth)?,
            min_samples_split: parse_or(&lookup, "ML_MIN_SAMPLES_SPLIT", defaults.min_samples_split)?,
            drop_first: parse_or(&lookup, "ML_DROP_FIRST", defaults.drop_first)?,
            test_fraction,
            seed: parse_or(&lookup, "ML_SEED", defaults.seed)?,
        })
    }

    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            kind: self.model_kind,
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            seed: self.seed,
        }
    }

    pub fn to_trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            target: self.target,
            schema: self.feature_schema.clone(),
            encoder: EncoderOptions {
                drop_first: self.drop_first,
            },
            model: self.model_params(),
            test_fraction: self.test_fraction,
            split_seed: self.seed,
            reference_year: None,
        }
    }
}
