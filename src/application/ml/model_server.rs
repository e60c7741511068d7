use super::predictor::PricePredictor;
use crate::domain::errors::{ArtifactError, PredictionError};
use crate::domain::pricing::artifact::TrainedArtifact;
use crate::domain::pricing::record::RawRecord;
use crate::domain::repositories::ArtifactStore;
use crate::infrastructure::observability::Metrics;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serves predictions from a lazily loaded, shared artifact.
///
/// The first caller loads the artifact from the store; concurrent first callers
/// wait on that single load. A failed load leaves the server empty so the next
/// call retries.
pub struct ModelServer {
    store: Arc<dyn ArtifactStore>,
    artifact: OnceCell<Arc<TrainedArtifact>>,
    metrics: Option<Metrics>,
}

impl ModelServer {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            artifact: OnceCell::new(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Load the artifact now instead of on the first prediction.
    pub fn preload(&self) -> Result<Arc<TrainedArtifact>, ArtifactError> {
        self.artifact()
    }

    pub fn artifact(&self) -> Result<Arc<TrainedArtifact>, ArtifactError> {
        self.artifact
            .get_or_try_init(|| {
                if let Some(metrics) = &self.metrics {
                    metrics.inc_artifact_loads();
                }
                match self.store.load() {
                    Ok(artifact) => {
                        info!(
                            "Model ready: {} {} ({} features, trained {})",
                            artifact.model.kind(),
                            artifact.target,
                            artifact.encoder.width(),
                            artifact.trained_at
                        );
                        Ok(Arc::new(artifact))
                    }
                    Err(e) => {
                        warn!("Artifact load from {} failed: {}", self.store.location(), e);
                        Err(e)
                    }
                }
            })
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.artifact.get().is_some()
    }
}

impl PricePredictor for ModelServer {
    fn predict(&self, record: &RawRecord) -> Result<f64, PredictionError> {
        let artifact = self.artifact()?;
        let predicted = artifact.predict(record)?;
        debug!(
            "Predicted {:.2} for {} {} {}-{:02}",
            predicted, record.town, record.flat_type, record.year, record.month
        );
        Ok(predicted)
    }

    fn name(&self) -> &str {
        "model-server"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::trainer::{Trainer, TrainerConfig};
    use crate::domain::errors::FeatureError;
    use crate::domain::ml::estimator::ModelParams;
    use crate::domain::pricing::record::{Dataset, LabeledRecord};
    use crate::infrastructure::repositories::InMemoryArtifactStore;

    fn trained_store() -> Arc<InMemoryArtifactStore> {
        let store = Arc::new(InMemoryArtifactStore::new());
        let config = TrainerConfig {
            model: ModelParams {
                n_trees: 5,
                ..ModelParams::default()
            },
            test_fraction: 0.0,
            ..TrainerConfig::default()
        };
        let records = (1..=12)
            .map(|month| LabeledRecord {
                record: RawRecord::new("BEDOK", "4-ROOM", 2023, month),
                label: 2500.0,
            })
            .collect();
        Trainer::new(config, store.clone())
            .train(&Dataset { records, skipped: 0 })
            .unwrap();
        store
    }

    #[test]
    fn test_missing_artifact_is_retried() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let server = ModelServer::new(store.clone());
        let record = RawRecord::new("BEDOK", "4-ROOM", 2023, 6);

        assert!(matches!(
            server.predict(&record),
            Err(PredictionError::Artifact(ArtifactError::NotFound { .. }))
        ));
        assert!(!server.is_loaded());
        assert!(server.predict(&record).is_err());
        assert_eq!(store.load_count(), 2);
    }

    #[test]
    fn test_loads_once_then_serves() {
        let store = trained_store();
        let metrics = Metrics::new().unwrap();
        let server = ModelServer::new(store.clone()).with_metrics(metrics.clone());

        let record = RawRecord::new("BEDOK", "4-ROOM", 2023, 6);
        for _ in 0..3 {
            let predicted = server.predict(&record).unwrap();
            assert!((predicted - 2500.0).abs() < 1e-6);
        }
        assert!(server.is_loaded());
        assert_eq!(store.load_count(), 1);
        assert_eq!(metrics.artifact_loads_total.get(), 1);
    }

    #[test]
    fn test_extreme_years_do_not_panic() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let config = TrainerConfig {
            schema: "year,month,lease_age".parse().unwrap(),
            model: ModelParams {
                n_trees: 5,
                ..ModelParams::default()
            },
            test_fraction: 0.0,
            reference_year: Some(2025),
            ..TrainerConfig::default()
        };
        let records = (1..=12)
            .map(|month| LabeledRecord {
                record: RawRecord::new("BEDOK", "3-ROOM", 2023, month).with_lease(1970 + month, "70"),
                label: 2000.0 + f64::from(month),
            })
            .collect();
        Trainer::new(config, store.clone())
            .train(&Dataset { records, skipped: 0 })
            .unwrap();
        let server = ModelServer::new(store);

        let ancient = RawRecord::new("BEDOK", "3-ROOM", 2023, 6).with_lease(i32::MIN, "70");
        assert!(server.predict(&ancient).unwrap().is_finite());

        let last_year = RawRecord::new("BEDOK", "3-ROOM", i32::MAX, 12).with_lease(1990, "70");
        let err = server.predict_series(&last_year, 12).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::Schema(FeatureError::OutOfRange { field: "year" })
        ));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_blank_town_is_client_error() {
        let server = ModelServer::new(trained_store());
        let err = server
            .predict(&RawRecord::new("  ", "4-ROOM", 2023, 6))
            .unwrap_err();
        assert!(matches!(
            err,
            PredictionError::Schema(FeatureError::MissingField { field: "town" })
        ));
        assert!(err.is_client_error());
    }
}
