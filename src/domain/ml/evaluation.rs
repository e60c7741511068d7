use serde::{Deserialize, Serialize};

/// Hold-out error metrics reported by a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl EvaluationMetrics {
    /// `None` when there is nothing to score.
    pub fn compute(predictions: &[f64], actuals: &[f64]) -> Option<Self> {
        let n = predictions.len().min(actuals.len());
        if n == 0 {
            return None;
        }
        let predictions = &predictions[..n];
        let actuals = &actuals[..n];

        let sq_err: f64 = predictions
            .iter()
            .zip(actuals)
            .map(|(p, t)| (p - t).powi(2))
            .sum();
        let mae = predictions
            .iter()
            .zip(actuals)
            .map(|(p, t)| (p - t).abs())
            .sum::<f64>()
            / n as f64;
        let mse = sq_err / n as f64;

        let mean_y = actuals.iter().sum::<f64>() / n as f64;
        let var_y = actuals.iter().map(|t| (t - mean_y).powi(2)).sum::<f64>() / n as f64;
        let r2 = if var_y > 0.0 { 1.0 - mse / var_y } else { 0.0 };

        Some(Self {
            mae,
            rmse: mse.sqrt(),
            r2,
        })
    }
}
