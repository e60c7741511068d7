use crate::domain::errors::TrainingError;
use crate::domain::ml::estimator::{ModelParams, PricingModel};
use crate::domain::ml::evaluation::EvaluationMetrics;
use crate::domain::ml::feature_registry::{FeatureSchema, NumericFeature};
use crate::domain::ml::feature_transform::{EncoderOptions, FeatureVector, FittedTransform};
use crate::domain::pricing::artifact::{ARTIFACT_FORMAT_VERSION, TrainedArtifact, TrainingSummary};
use crate::domain::pricing::record::{Dataset, LabeledRecord, RawRecord, TargetKind};
use crate::domain::repositories::{ArtifactStore, DatasetSource};
use chrono::{Datelike, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a training run needs besides the data.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    pub target: TargetKind,
    pub schema: FeatureSchema,
    pub encoder: EncoderOptions,
    pub model: ModelParams,
    /// Share of rows held out for evaluation. `0.0` trains on everything.
    pub test_fraction: f64,
    pub split_seed: u64,
    /// Year `lease_age` is measured against. Defaults to the current year.
    pub reference_year: Option<i32>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            target: TargetKind::MonthlyRent,
            schema: FeatureSchema::rental(),
            encoder: EncoderOptions::default(),
            model: ModelParams::default(),
            test_fraction: 0.2,
            split_seed: 42,
            reference_year: None,
        }
    }
}

/// Deterministic shuffled split into `(train, eval)` row indices.
///
/// The evaluation side holds `ceil(n * fraction)` rows but never takes the last
/// training row.
pub fn split_indices(n: usize, fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    // Tolerance keeps products like 300 * 0.2 from rounding up past the exact count.
    let eval_len = ((n as f64 * fraction - 1e-9).ceil().max(0.0) as usize).min(n.saturating_sub(1));
    let eval = indices.split_off(n - eval_len);
    (indices, eval)
}

/// First schema field the record cannot supply, if any.
fn missing_field(schema: &FeatureSchema, record: &RawRecord) -> Option<&'static str> {
    if record.town.trim().is_empty() {
        return Some("town");
    }
    if record.flat_type.trim().is_empty() {
        return Some("flat_type");
    }
    schema
        .numeric()
        .iter()
        .find(|&&feature| match feature {
            NumericFeature::Year | NumericFeature::Month => false,
            NumericFeature::LeaseAge => record.lease_commence_date.is_none(),
            NumericFeature::RemainingLeaseYears => record.remaining_lease.is_none(),
            NumericFeature::FloorAreaSqm => record.floor_area_sqm.is_none(),
        })
        .map(|feature| feature.source_field())
}

/// Fits the feature transform and model, then publishes the artifact.
pub struct Trainer {
    config: TrainerConfig,
    store: Arc<dyn ArtifactStore>,
}

impl Trainer {
    pub fn new(config: TrainerConfig, store: Arc<dyn ArtifactStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fit an artifact in memory without publishing it.
    pub fn fit(&self, dataset: &Dataset) -> Result<TrainedArtifact, TrainingError> {
        let config = &self.config;

        let (usable, incomplete): (Vec<&LabeledRecord>, Vec<&LabeledRecord>) = dataset
            .records
            .iter()
            .partition(|row| missing_field(&config.schema, &row.record).is_none());
        if let Some(first) = incomplete.first() {
            warn!(
                "Dropping {} rows lacking features for schema [{}] (first missing: {})",
                incomplete.len(),
                config.schema,
                missing_field(&config.schema, &first.record).unwrap_or("unknown")
            );
        }
        let skipped = dataset.skipped + incomplete.len();

        if usable.is_empty() {
            return Err(TrainingError::EmptyDataset { skipped });
        }

        let reference_year = config.reference_year.unwrap_or_else(|| Utc::now().year());
        let (train_idx, eval_idx) = split_indices(usable.len(), config.test_fraction, config.split_seed);
        let train: Vec<&LabeledRecord> = train_idx.iter().map(|&i| usable[i]).collect();
        let eval: Vec<&LabeledRecord> = eval_idx.iter().map(|&i| usable[i]).collect();

        info!(
            "Training {} model on {} rows ({} held out, schema [{}], reference year {})",
            config.model.kind,
            train.len(),
            eval.len(),
            config.schema,
            reference_year
        );

        let encoder = FittedTransform::fit(
            train.iter().map(|row| &row.record),
            &config.schema,
            config.encoder,
            reference_year,
        )?;

        let features = encode_all(&encoder, &train)?;
        let labels: Vec<f64> = train.iter().map(|row| row.label).collect();
        let model = PricingModel::fit(&features, &labels, &config.model)?;

        let metrics = if eval.is_empty() {
            None
        } else {
            let eval_features = encode_all(&encoder, &eval)?;
            let predictions = model.predict_batch(&eval_features)?;
            let actuals: Vec<f64> = eval.iter().map(|row| row.label).collect();
            EvaluationMetrics::compute(&predictions, &actuals)
        };

        match &metrics {
            Some(m) => info!(
                "Evaluation on {} rows: RMSE={:.2} MAE={:.2} R2={:.4}",
                eval.len(),
                m.rmse,
                m.mae,
                m.r2
            ),
            None => info!("No rows held out; skipping evaluation"),
        }

        Ok(TrainedArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            trained_at: Utc::now(),
            target: config.target,
            feature_schema: config.schema.clone(),
            encoder,
            model,
            summary: TrainingSummary {
                rows_read: dataset.len() + dataset.skipped,
                rows_skipped: skipped,
                train_rows: train.len(),
                eval_rows: eval.len(),
                metrics,
            },
        })
    }

    /// Fit and publish through the artifact store.
    pub fn train(&self, dataset: &Dataset) -> Result<TrainedArtifact, TrainingError> {
        let artifact = self.fit(dataset)?;
        self.store.save(&artifact)?;
        info!("Published artifact to {}", self.store.location());
        Ok(artifact)
    }

    pub fn train_from(&self, source: &dyn DatasetSource) -> Result<TrainedArtifact, TrainingError> {
        let dataset = source.load(self.config.target)?;
        self.train(&dataset)
    }
}

fn encode_all(encoder: &FittedTransform, rows: &[&LabeledRecord]) -> Result<Vec<FeatureVector>, TrainingError> {
    rows.iter()
        .map(|row| encoder.transform(&row.record).map_err(TrainingError::from))
        .collect()
}
