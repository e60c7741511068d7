use crate::application::ml::PricePredictor;
use crate::infrastructure::observability::Metrics;
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<dyn PricePredictor>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(predictor: Arc<dyn PricePredictor>, metrics: Metrics) -> Self {
        Self { predictor, metrics }
    }
}
