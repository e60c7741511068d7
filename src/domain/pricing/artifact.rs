use super::record::{RawRecord, TargetKind};
use crate::domain::errors::PredictionError;
use crate::domain::ml::estimator::PricingModel;
use crate::domain::ml::evaluation::EvaluationMetrics;
use crate::domain::ml::feature_registry::FeatureSchema;
use crate::domain::ml::feature_transform::FittedTransform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bumped whenever the persisted layout changes incompatibly.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// What happened during the training run that produced an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub train_rows: usize,
    pub eval_rows: usize,
    pub metrics: Option<EvaluationMetrics>,
}

/// Fitted encoder and model, persisted and loaded as one unit.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedArtifact {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub target: TargetKind,
    pub feature_schema: FeatureSchema,
    pub encoder: FittedTransform,
    pub model: PricingModel,
    pub summary: TrainingSummary,
}

impl TrainedArtifact {
    pub fn predict(&self, record: &RawRecord) -> Result<f64, PredictionError> {
        let features = self.encoder.transform(record)?;
        Ok(self.model.predict_one(&features)?)
    }
}
