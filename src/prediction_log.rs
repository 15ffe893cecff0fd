//! Append-only prediction log.
//!
//! Every predict call, successful or not, leaves exactly one row in the
//! `prediction_logs` table. Each write is its own short transaction on a fresh
//! connection; SQLite's busy timeout serializes concurrent writers. Writes never
//! fail the request they describe: errors are reported through `tracing` and
//! swallowed.

use crate::config::PredictionLogConfig;
use crate::error::{HousingError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS prediction_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT,
        request_data TEXT,
        prediction TEXT,
        status_code INTEGER,
        process_time REAL
    );
";

/// One request/response pair, as written to the log.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionLogEntry {
    pub timestamp: DateTime<Utc>,
    /// Request body as received (JSON text, or the raw body if it was not JSON).
    pub request_data: String,
    /// Predictions as a JSON array; empty on failure.
    pub prediction: Vec<f64>,
    pub status_code: u16,
    /// Wall time spent handling the request, in milliseconds.
    pub process_time_ms: f64,
}

impl PredictionLogEntry {
    pub fn success(request_data: String, prediction: Vec<f64>, elapsed: Duration) -> Self {
        Self {
            timestamp: Utc::now(),
            request_data,
            prediction,
            status_code: 200,
            process_time_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }

    pub fn failure(request_data: String, status_code: u16, elapsed: Duration) -> Self {
        Self {
            timestamp: Utc::now(),
            request_data,
            prediction: Vec::new(),
            status_code,
            process_time_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }
}

/// Handle to the prediction log database.
#[derive(Debug, Clone)]
pub struct PredictionLog {
    path: PathBuf,
    busy_timeout: Duration,
}

impl PredictionLog {
    /// Ensure the database and table exist. Failure here is fatal to startup.
    pub fn open(config: &PredictionLogConfig) -> Result<Self> {
        let path = config.db_path.clone();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let log = Self {
            path,
            busy_timeout: config.busy_timeout(),
        };

        let conn = log.connect()?;
        conn.execute_batch(SCHEMA)?;
        info!(path = %log.path.display(), "SQLite table 'prediction_logs' is ready");

        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    /// Append one entry. Never fails; errors are logged.
    pub fn record(&self, entry: &PredictionLogEntry) {
        match self.try_record(entry) {
            Ok(id) => debug!(id, status = entry.status_code, "Prediction logged"),
            Err(e) => error!(
                error = %e,
                path = %self.path.display(),
                status = entry.status_code,
                "Failed to insert prediction log"
            ),
        }
    }

    /// Append one entry, returning the new row id.
    pub fn try_record(&self, entry: &PredictionLogEntry) -> Result<i64> {
        let prediction = serde_json::to_string(&entry.prediction)
            .map_err(|e| HousingError::Logging(e.to_string()))?;

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO prediction_logs (timestamp, request_data, prediction, status_code, process_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.timestamp.to_rfc3339(),
                entry.request_data,
                prediction,
                entry.status_code,
                entry.process_time_ms
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Append one entry from async code without stalling the runtime.
    pub async fn record_async(&self, entry: PredictionLogEntry) {
        let log = self.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || log.record(&entry)).await {
            error!(error = %e, "Prediction log task failed");
        }
    }

    /// Number of rows in the log.
    pub fn count(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM prediction_logs", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

/// A logged row decoded for offline reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedPrediction {
    pub id: i64,
    pub timestamp: Option<String>,
    pub request_data: Option<Value>,
    pub prediction: Option<Value>,
    pub status_code: Option<i64>,
    pub process_time_ms: Option<f64>,
}

/// Read logged rows in insertion order, most recent `limit` rows if given.
///
/// Stored JSON columns are decoded; a column that is not valid JSON is returned
/// as a JSON string holding the raw text.
pub fn read_entries(path: &Path, limit: Option<usize>) -> Result<Vec<LoggedPrediction>> {
    if !path.exists() {
        return Err(HousingError::Database(format!(
            "prediction log {} does not exist",
            path.display()
        )));
    }

    let conn = Connection::open(path)?;
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let mut stmt = conn.prepare(
        "SELECT id, timestamp, request_data, prediction, status_code, process_time
         FROM (SELECT * FROM prediction_logs ORDER BY id DESC LIMIT ?1)
         ORDER BY id ASC",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok(LoggedPrediction {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            request_data: row.get::<_, Option<String>>(2)?.map(|s| decode_column(&s)),
            prediction: row.get::<_, Option<String>>(3)?.map(|s| decode_column(&s)),
            status_code: row.get(4)?,
            process_time_ms: row.get(5)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn decode_column(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn open_in(dir: &TempDir) -> PredictionLog {
        PredictionLog::open(&PredictionLogConfig {
            db_path: dir.path().join("nested").join("prediction_logs.db"),
            busy_timeout_ms: 1_000,
        })
        .unwrap()
    }

    #[test]
    fn test_open_creates_table_and_parent() {
        let dir = TempDir::new().unwrap();
        let log = open_in(&dir);
        assert!(log.path().exists());
        assert_eq!(log.count().unwrap(), 0);

        // Reopening an existing database keeps its rows
        log.record(&PredictionLogEntry::failure("{}".into(), 422, Duration::ZERO));
        let reopened = open_in(&dir);
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn test_rows_append_in_order() {
        let dir = TempDir::new().unwrap();
        let log = open_in(&dir);

        let body = json!({"median_income": 5.5}).to_string();
        let first = log
            .try_record(&PredictionLogEntry::success(body.clone(), vec![2.5], Duration::from_millis(3)))
            .unwrap();
        let second = log
            .try_record(&PredictionLogEntry::failure("not json".into(), 400, Duration::from_millis(1)))
            .unwrap();
        assert!(second > first);

        let rows = read_entries(log.path(), None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status_code, Some(200));
        assert_eq!(rows[0].request_data, Some(json!({"median_income": 5.5})));
        assert_eq!(rows[0].prediction, Some(json!([2.5])));
        assert!(rows[0].process_time_ms.unwrap() >= 3.0);
        assert_eq!(rows[1].status_code, Some(400));
        assert_eq!(rows[1].request_data, Some(json!("not json")));
        assert_eq!(rows[1].prediction, Some(json!([])));
    }

    #[test]
    fn test_read_limit_keeps_most_recent() {
        let dir = TempDir::new().unwrap();
        let log = open_in(&dir);
        for status in [200u16, 422, 500] {
            log.record(&PredictionLogEntry::failure("{}".into(), status, Duration::ZERO));
        }

        let rows = read_entries(log.path(), Some(2)).unwrap();
        let statuses: Vec<_> = rows.iter().map(|r| r.status_code.unwrap()).collect();
        assert_eq!(statuses, vec![422, 500]);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let log = open_in(&dir);
        fs::remove_file(log.path()).unwrap();
        fs::remove_dir(dir.path().join("nested")).unwrap();

        // Parent directory is gone, so the connection cannot be opened
        let entry = PredictionLogEntry::success("{}".into(), vec![1.0], Duration::ZERO);
        assert!(log.try_record(&entry).is_err());
        log.record(&entry);
    }

    #[test]
    fn test_concurrent_writers() {
        let dir = TempDir::new().unwrap();
        let log = open_in(&dir);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        log.try_record(&PredictionLogEntry::success(
                            format!("{{\"worker\": {}}}", i),
                            vec![i as f64],
                            Duration::ZERO,
                        ))
                        .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.count().unwrap(), 40);
    }

    #[test]
    fn test_read_missing_database() {
        let dir = TempDir::new().unwrap();
        assert!(read_entries(&dir.path().join("absent.db"), None).is_err());
    }
}
