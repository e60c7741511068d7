use super::feature_transform::FeatureVector;
use crate::domain::errors::ModelError;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};
use statrs::statistics::{Data, Median};
use std::fmt;
use std::str::FromStr;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;
type Linear = LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Regression algorithm used by a training run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    RandomForest,
    Linear,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::RandomForest => f.write_str("random-forest"),
            ModelKind::Linear => f.write_str("linear"),
        }
    }
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "random-forest" | "rf" | "forest" => Ok(ModelKind::RandomForest),
            "linear" | "linear-regression" => Ok(ModelKind::Linear),
            _ => anyhow::bail!(
                "Invalid MODEL_KIND: {}. Must be 'random-forest' or 'linear'",
                s
            ),
        }
    }
}

/// Hyper-parameters for [`PricingModel::fit`]. Tree settings are ignored by the linear model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub kind: ModelKind,
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            kind: ModelKind::RandomForest,
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            seed: 42,
        }
    }
}

/// Replaces `NaN` cells with the per-column median of the training matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    fill: Vec<f64>,
}

impl MedianImputer {
    pub fn fit(rows: &[Vec<f64>], width: usize) -> Self {
        let fill = (0..width)
            .map(|col| {
                let present: Vec<f64> = rows
                    .iter()
                    .filter_map(|row| row.get(col).copied())
                    .filter(|v| !v.is_nan())
                    .collect();
                if present.is_empty() {
                    return 0.0;
                }
                let median = Data::new(present).median();
                if median.is_finite() { median } else { 0.0 }
            })
            .collect();
        Self { fill }
    }

    pub fn fill_values(&self) -> &[f64] {
        &self.fill
    }

    pub fn apply(&self, row: &mut [f64]) {
        for (value, fill) in row.iter_mut().zip(&self.fill) {
            if value.is_nan() {
                *value = *fill;
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Estimator {
    RandomForest(Forest),
    Linear(Linear),
}

impl Estimator {
    fn predict(&self, matrix: &DenseMatrix<f64>) -> Result<Vec<f64>, ModelError> {
        let predictions = match self {
            Estimator::RandomForest(model) => model.predict(matrix),
            Estimator::Linear(model) => model.predict(matrix),
        };
        predictions.map_err(|e| ModelError::new("Prediction", e.to_string()))
    }
}

/// Fitted regression model: imputer followed by the smartcore estimator.
#[derive(Serialize, Deserialize)]
pub struct PricingModel {
    kind: ModelKind,
    width: usize,
    imputer: MedianImputer,
    estimator: Estimator,
}

impl PricingModel {
    pub fn fit(features: &[FeatureVector], targets: &[f64], params: &ModelParams) -> Result<Self, ModelError> {
        if features.is_empty() {
            return Err(ModelError::new("Training", "no training rows"));
        }
        if features.len() != targets.len() {
            return Err(ModelError::new(
                "Training",
                format!("{} feature rows but {} targets", features.len(), targets.len()),
            ));
        }

        let width = features[0].len();
        if let Some(bad) = features.iter().find(|f| f.len() != width) {
            return Err(ModelError::new(
                "Training",
                format!("ragged feature rows ({} vs {})", bad.len(), width),
            ));
        }

        let mut rows: Vec<Vec<f64>> = features.iter().map(|f| f.as_slice().to_vec()).collect();
        let imputer = MedianImputer::fit(&rows, width);
        for row in rows.iter_mut() {
            imputer.apply(row);
        }

        let matrix = DenseMatrix::from_2d_vec(&rows)
            .map_err(|e| ModelError::new("Matrix creation", e.to_string()))?;
        let y = targets.to_vec();

        let estimator = match params.kind {
            ModelKind::RandomForest => {
                let forest_params = RandomForestRegressorParameters::default()
                    .with_n_trees(params.n_trees)
                    .with_max_depth(params.max_depth)
                    .with_min_samples_split(params.min_samples_split)
                    .with_seed(params.seed);
                let model = RandomForestRegressor::fit(&matrix, &y, forest_params)
                    .map_err(|e| ModelError::new("Training", e.to_string()))?;
                Estimator::RandomForest(model)
            }
            ModelKind::Linear => {
                let model = LinearRegression::fit(&matrix, &y, LinearRegressionParameters::default())
                    .map_err(|e| ModelError::new("Training", e.to_string()))?;
                Estimator::Linear(model)
            }
        };

        Ok(Self {
            kind: params.kind,
            width,
            imputer,
            estimator,
        })
    }

    pub fn predict_one(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        self.predict_batch(std::slice::from_ref(features))?
            .first()
            .copied()
            .ok_or_else(|| ModelError::new("Prediction", "no prediction returned"))
    }

    pub fn predict_batch(&self, features: &[FeatureVector]) -> Result<Vec<f64>, ModelError> {
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let mut rows = Vec::with_capacity(features.len());
        for vector in features {
            if vector.len() != self.width {
                return Err(ModelError::new(
                    "Prediction",
                    format!("expected {} features, got {}", self.width, vector.len()),
                ));
            }
            let mut row = vector.as_slice().to_vec();
            self.imputer.apply(&mut row);
            rows.push(row);
        }

        let matrix = DenseMatrix::from_2d_vec(&rows)
            .map_err(|e| ModelError::new("Matrix creation", e.to_string()))?;
        self.estimator.predict(&matrix)
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn imputer(&self) -> &MedianImputer {
        &self.imputer
    }
}

impl fmt::Debug for PricingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PricingModel")
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("imputer", &self.imputer)
            .finish_non_exhaustive()
    }
}
