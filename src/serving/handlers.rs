//! Prediction API request handlers.

use super::ServiceContext;
use crate::compute::FittedArtifacts;
use crate::error::{HousingError, Result};
use crate::features::{align_value, CanonicalVector};
use crate::health::{HealthResponse, RootMessage};
use crate::observability;
use crate::prediction_log::PredictionLogEntry;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{error, info, warn};

/// Successful predict response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<f64>,
}

/// Error body returned for any failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

fn error_response(err: &HousingError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorDetail {
            detail: err.to_string(),
        }),
    )
        .into_response()
}

pub async fn root() -> Json<RootMessage> {
    Json(RootMessage::default())
}

pub async fn health(State(ctx): State<ServiceContext>) -> Json<HealthResponse> {
    let artifacts = ctx.artifacts();
    Json(HealthResponse::new(
        artifacts.model().kind(),
        artifacts.scaler().n_features(),
        ctx.started_at(),
    ))
}

pub async fn metrics(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

pub async fn predict(State(ctx): State<ServiceContext>, body: Body) -> Response {
    let started = Instant::now();

    let (request_data, outcome) = match read_body(body, ctx.max_body_bytes()).await {
        Ok(bytes) => {
            info!(bytes = bytes.len(), "Received prediction request");
            (
                String::from_utf8_lossy(&bytes).into_owned(),
                run_pipeline(ctx.artifacts(), &bytes),
            )
        }
        // Bodies that could not be read are not kept
        Err(e) => (String::new(), Err(e)),
    };
    let elapsed = started.elapsed();

    match outcome {
        Ok(predictions) => {
            ctx.log()
                .record_async(PredictionLogEntry::success(request_data, predictions.clone(), elapsed))
                .await;
            observability::record_prediction(true, predictions.len());
            info!(
                rows = predictions.len(),
                process_time_ms = elapsed.as_secs_f64() * 1000.0,
                "Prediction made"
            );
            Json(PredictResponse { predictions }).into_response()
        }
        Err(e) => {
            if e.is_client_error() {
                warn!(error = %e, "Prediction request rejected");
            } else {
                error!(error = %e, "Prediction failed");
            }
            ctx.log()
                .record_async(PredictionLogEntry::failure(request_data, e.status_code(), elapsed))
                .await;
            observability::record_prediction(false, 0);
            error_response(&e)
        }
    }
}

/// Read the whole request body, refusing anything over `limit` bytes.
async fn read_body(body: Body, limit: usize) -> Result<Bytes> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(HousingError::PayloadTooLarge { limit })
        }
        Err(e) => Err(HousingError::MalformedRequest(format!(
            "failed to read request body: {}",
            e
        ))),
    }
}

/// Align, scale and predict every record in a request body.
///
/// The body is either one record object or a non-empty array of them.
/// Validation runs over the whole batch before anything is scaled.
pub fn run_pipeline(artifacts: &FittedArtifacts, body: &[u8]) -> Result<Vec<f64>> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| HousingError::MalformedRequest(format!("body is not valid JSON: {}", e)))?;

    let rows = align_body(&value)?;
    artifacts.predict(&rows)
}

fn align_body(value: &Value) -> Result<Vec<CanonicalVector>> {
    match value {
        Value::Object(_) => Ok(vec![align_value(value)?]),
        Value::Array(records) if records.is_empty() => Err(HousingError::MalformedRequest(
            "batch must contain at least one record".to_string(),
        )),
        Value::Array(records) => records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                align_value(record).map_err(|e| HousingError::Validation(format!("record {}: {}", i, e)))
            })
            .collect(),
        _ => Err(HousingError::MalformedRequest(
            "body must be a record object or an array of records".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{Regressor, StandardScaler};
    use crate::features::{FEATURE_COLUMNS, FEATURE_COUNT};
    use serde_json::json;

    fn artifacts() -> FittedArtifacts {
        let scaler = StandardScaler::new(vec![0.0; FEATURE_COUNT], vec![1.0; FEATURE_COUNT])
            .unwrap()
            .with_feature_names(&FEATURE_COLUMNS);
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[7] = 1.0;
        FittedArtifacts::new(scaler, Regressor::linear(coefficients, 0.0)).unwrap()
    }

    fn record(income: f64, proximity: &str) -> Value {
        json!({
            "longitude": -122.2, "latitude": 37.8, "housing_median_age": 30,
            "total_rooms": 2000, "total_bedrooms": 400, "population": 900,
            "households": 350, "median_income": income, "ocean_proximity": proximity
        })
    }

    #[test]
    fn test_single_record() {
        let body = record(4.0, "NEAR BAY").to_string();
        assert_eq!(run_pipeline(&artifacts(), body.as_bytes()).unwrap(), vec![4.0]);
    }

    #[test]
    fn test_batch_keeps_order() {
        let body = json!([record(1.0, "INLAND"), record(3.0, "ISLAND"), record(2.0, "<1H OCEAN")]);
        let out = run_pipeline(&artifacts(), body.to_string().as_bytes()).unwrap();
        assert_eq!(out, vec![1.0, 3.0, 2.0]);
    }

    #[test]
    fn test_batch_error_names_record() {
        let body = json!([record(1.0, "INLAND"), record(3.0, "UNKNOWN")]);
        let err = run_pipeline(&artifacts(), body.to_string().as_bytes()).unwrap_err();
        assert_eq!(err.status_code(), 422);
        assert!(err.to_string().starts_with("record 1: ocean_proximity"));
    }

    #[test]
    fn test_malformed_bodies() {
        for body in ["{not json", "[]", "42", "\"INLAND\""] {
            let err = run_pipeline(&artifacts(), body.as_bytes()).unwrap_err();
            assert_eq!(err.status_code(), 400, "{}", body);
        }
    }
}
