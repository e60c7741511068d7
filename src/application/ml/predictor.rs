use crate::domain::errors::{FeatureError, PredictionError};
use crate::domain::pricing::calendar::{ForecastPoint, YearMonth};
use crate::domain::pricing::record::RawRecord;

/// Interface for price predictors
pub trait PricePredictor: Send + Sync {
    /// Predict the price of a single record
    fn predict(&self, record: &RawRecord) -> Result<f64, PredictionError>;

    /// Roll the record forward one month at a time and predict each step.
    /// The starting month itself is never predicted.
    fn forecast(&self, record: &RawRecord, steps: usize) -> Result<Vec<ForecastPoint>, PredictionError> {
        let periods: Vec<YearMonth> = record.period().following(steps).collect();
        if periods.len() < steps {
            return Err(FeatureError::OutOfRange { field: "year" }.into());
        }
        periods
            .into_iter()
            .map(|period| {
                let predicted = self.predict(&record.at(period))?;
                Ok(ForecastPoint {
                    year: period.year,
                    month: period.month,
                    predicted,
                })
            })
            .collect()
    }

    /// Predicted values of [`PricePredictor::forecast`], without calendar positions
    fn predict_series(&self, record: &RawRecord, steps: usize) -> Result<Vec<f64>, PredictionError> {
        Ok(self
            .forecast(record, steps)?
            .into_iter()
            .map(|point| point.predicted)
            .collect())
    }

    /// Get predictor name/type
    fn name(&self) -> &str;
}
