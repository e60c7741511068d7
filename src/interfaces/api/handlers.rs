//! Request handlers
//!
//! Inference and the first artifact load are synchronous, so predictions run on
//! tokio's blocking pool.

use super::error::ApiError;
use super::state::AppState;
use crate::domain::errors::PredictionError;
use crate::domain::pricing::record::RawRecord;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

/// Months predicted by `/predict-rent-12-months/`
pub const FORECAST_MONTHS: usize = 12;

/// Prediction request body. Every field is optional at the JSON level so a
/// missing one is reported as a 400 naming the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictRequest {
    pub town: Option<String>,
    pub flat_type: Option<String>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub lease_commence_date: Option<i32>,
    pub remaining_lease: Option<String>,
    pub floor_area_sqm: Option<f64>,
}

impl PredictRequest {
    pub fn into_record(self) -> Result<RawRecord, ApiError> {
        fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
            value.ok_or_else(|| ApiError::bad_request(format!("Missing required field: {}", field)))
        }

        let town = required(self.town.filter(|t| !t.trim().is_empty()), "town")?;
        let flat_type = required(self.flat_type.filter(|t| !t.trim().is_empty()), "flat_type")?;
        let year = required(self.year, "year")?;
        let month = required(self.month, "month")?;

        Ok(RawRecord {
            town,
            flat_type,
            year,
            month,
            lease_commence_date: self.lease_commence_date,
            remaining_lease: self.remaining_lease,
            floor_area_sqm: self.floor_area_sqm,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictedRent<T> {
    pub predicted_rent: T,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

fn error_kind(err: &PredictionError) -> &'static str {
    match err {
        PredictionError::Schema(_) => "schema",
        PredictionError::Artifact(_) => "artifact",
        PredictionError::Model(_) => "model",
    }
}

/// Run `predict` on the blocking pool and record metrics under `endpoint`.
async fn run_prediction<T, F>(state: &AppState, endpoint: &'static str, predict: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, PredictionError> + Send + 'static,
{
    let start = Instant::now();
    let task_state = state.clone();
    let outcome = tokio::task::spawn_blocking(move || predict(&task_state))
        .await
        .map_err(|e| {
            state.metrics.inc_error("model");
            ApiError::internal(format!("Prediction task failed: {}", e))
        })?;
    state
        .metrics
        .observe_latency(endpoint, start.elapsed().as_secs_f64());

    match outcome {
        Ok(value) => {
            state.metrics.inc_prediction(endpoint);
            Ok(value)
        }
        Err(err) => {
            state.metrics.inc_error(error_kind(&err));
            if !err.is_client_error() {
                warn!("{} failed: {}", endpoint, err);
            }
            Err(err.into())
        }
    }
}

fn parse_body(payload: Result<Json<PredictRequest>, JsonRejection>) -> Result<RawRecord, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    request.into_record()
}

pub async fn predict_rent(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictedRent<f64>>, ApiError> {
    let record = parse_body(payload)?;
    let predicted = run_prediction(&state, "predict_rent", move |state| {
        state.predictor.predict(&record)
    })
    .await?;
    Ok(Json(PredictedRent {
        predicted_rent: predicted,
    }))
}

pub async fn predict_rent_12_months(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictedRent<Vec<f64>>>, ApiError> {
    let record = parse_body(payload)?;
    let series = run_prediction(&state, "predict_rent_12_months", move |state| {
        state.predictor.predict_series(&record, FORECAST_MONTHS)
    })
    .await?;
    Ok(Json(PredictedRent {
        predicted_rent: series,
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_requires_core_fields() {
        let request = PredictRequest {
            town: Some("BEDOK".to_string()),
            flat_type: Some("4-ROOM".to_string()),
            year: Some(2024),
            month: None,
            ..PredictRequest::default()
        };
        let err = request.into_record().unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Missing required field: month");
    }

    #[test]
    fn test_blank_town_is_missing() {
        let request = PredictRequest {
            town: Some("   ".to_string()),
            flat_type: Some("4-ROOM".to_string()),
            year: Some(2024),
            month: Some(6),
            ..PredictRequest::default()
        };
        assert_eq!(request.into_record().unwrap_err().message, "Missing required field: town");
    }

    #[test]
    fn test_optional_fields_carried_through() {
        let request: PredictRequest = serde_json::from_str(
            r#"{"town":"BEDOK","flat_type":"4-ROOM","year":2024,"month":6,
                "lease_commence_date":1990,"remaining_lease":"65 years","floor_area_sqm":92.5}"#,
        )
        .unwrap();
        let record = request.into_record().unwrap();
        assert_eq!(record.lease_commence_date, Some(1990));
        assert_eq!(record.remaining_lease.as_deref(), Some("65 years"));
        assert_eq!(record.floor_area_sqm, Some(92.5));
    }
}
