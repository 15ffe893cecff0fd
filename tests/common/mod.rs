//! Common test utilities for integration tests.

pub mod fixtures;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use housing_serve::compute::{FittedArtifacts, Regressor};
use housing_serve::config::ServiceConfig;
use housing_serve::prediction_log::PredictionLog;
use housing_serve::serving::ServiceContext;
use http_body_util::BodyExt;
use serde_json::Value;
use std::net::TcpListener;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

pub use fixtures::*;

/// Find an available port for testing.
pub fn find_available_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to port");
    listener.local_addr().unwrap().port()
}

/// Test environment with artifacts and a prediction log in a temporary directory.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config: ServiceConfig,
}

impl TestEnv {
    /// Environment serving the linear fixture model.
    pub fn new() -> Self {
        Self::with_model(linear_model())
    }

    pub fn with_model(model: Regressor) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let models_dir = temp_dir.path().join("models");
        std::fs::create_dir_all(&models_dir).expect("Failed to create models dir");

        let mut config = ServiceConfig::development();
        config.server.bind_addr = format!("127.0.0.1:{}", find_available_port())
            .parse()
            .unwrap();
        config.artifacts.model_path = models_dir.join("best_model.json");
        config.artifacts.scaler_path = models_dir.join("scaler.json");
        config.prediction_log.db_path = temp_dir.path().join("prediction_logs.db");

        write_json(&config.artifacts.model_path, &model);
        write_json(&config.artifacts.scaler_path, &housing_scaler());

        Self { temp_dir, config }
    }

    pub fn db_path(&self) -> PathBuf {
        self.config.prediction_log.db_path.clone()
    }

    pub fn context(&self) -> ServiceContext {
        ServiceContext::from_config(&self.config).expect("Failed to build service context")
    }

    pub fn artifacts(&self) -> FittedArtifacts {
        FittedArtifacts::load(&self.config.artifacts).expect("Failed to load artifacts")
    }

    pub fn log_rows(&self) -> usize {
        PredictionLog::open(&self.config.prediction_log)
            .and_then(|log| log.count())
            .expect("Failed to count log rows")
    }
}

fn write_json<T: serde::Serialize>(path: &std::path::Path, value: &T) {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).expect("Failed to write artifact");
}

/// Send one request through the router and decode the JSON response body.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(app, method, uri, body, &[]).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

/// Send one request with extra headers, returning status, headers and raw body.
pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<String>,
    headers: &[(&str, &str)],
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, bytes)
}
