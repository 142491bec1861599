//! Windowed document count job.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing;

use pipewatch_core::error::AppError;
use pipewatch_core::result::AppResult;
use pipewatch_core::traits::search::SearchBackend;

use crate::job::JobDescriptor;
use crate::registry::JobHandler;

const DEFAULT_WINDOW_SECONDS: u64 = 60;
const DEFAULT_TIMESTAMP_FIELD: &str = "@timestamp";

/// Counts the documents each index received in the window ending at the
/// descriptor's scheduled time.
///
/// Parameters:
/// - `es_indices` (required): indices to count
/// - `window_seconds` (default 60): window length
/// - `timestamp_field` (default `@timestamp`): field the window applies to
#[derive(Debug, Default)]
pub struct DocCountJobHandler;

impl DocCountJobHandler {
    /// Range query selecting `[end - window, end)` in epoch milliseconds.
    fn window_query(field: &str, end_ms: i64, window_seconds: u64) -> AppResult<Value> {
        let window_ms = i64::try_from(window_seconds)
            .ok()
            .and_then(|s| s.checked_mul(1_000))
            .ok_or_else(|| {
                AppError::validation(format!("window_seconds {window_seconds} is too large"))
            })?;

        Ok(json!({
            "range": {
                field: {
                    "gte": end_ms.saturating_sub(window_ms),
                    "lt": end_ms,
                    "format": "epoch_millis",
                }
            }
        }))
    }
}

#[async_trait]
impl JobHandler for DocCountJobHandler {
    fn name(&self) -> &str {
        "doc_count"
    }

    async fn run(&self, job: &JobDescriptor, backend: &dyn SearchBackend) -> AppResult<()> {
        let indices: Vec<String> = job.required_param("es_indices")?;
        let window_seconds = job
            .param::<u64>("window_seconds")?
            .unwrap_or(DEFAULT_WINDOW_SECONDS);
        let field = job
            .param::<String>("timestamp_field")?
            .unwrap_or_else(|| DEFAULT_TIMESTAMP_FIELD.to_string());

        if window_seconds == 0 {
            return Err(AppError::validation("window_seconds must be positive"));
        }

        let query = Self::window_query(&field, job.scheduled_time_ms(), window_seconds)?;

        for index in &indices {
            let count = backend
                .count(std::slice::from_ref(index), query.clone())
                .await?;

            tracing::info!(
                index = %index,
                count,
                window_seconds,
                "Index '{}' received {} document(s) in the last {}s",
                index,
                count,
                window_seconds
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::job::JobParams;
    use pipewatch_core::error::ErrorKind;

    #[derive(Debug, Default)]
    struct CountingBackend {
        requests: Mutex<Vec<(Vec<String>, Value)>>,
    }

    #[async_trait]
    impl SearchBackend for CountingBackend {
        fn backend_type(&self) -> &str {
            "counting"
        }

        async fn health_check(&self) -> AppResult<bool> {
            Ok(true)
        }

        async fn count(&self, indices: &[String], query: Value) -> AppResult<u64> {
            self.requests
                .lock()
                .unwrap()
                .push((indices.to_vec(), query));
            Ok(7)
        }

        async fn search(&self, _indices: &[String], _body: Value) -> AppResult<Value> {
            Ok(Value::Null)
        }
    }

    fn job(params: Value) -> JobDescriptor {
        let params: JobParams = serde_json::from_value(params).unwrap();
        JobDescriptor::new(
            "doc_count",
            "p1",
            Utc.timestamp_millis_opt(1_000_000).unwrap(),
            Arc::new(params),
        )
    }

    #[tokio::test]
    async fn test_counts_each_index_over_window() {
        let backend = CountingBackend::default();
        let descriptor = job(json!({"es_indices": ["a", "b"], "window_seconds": 30}));

        DocCountJobHandler.run(&descriptor, &backend).await.unwrap();

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0, vec!["a".to_string()]);
        assert_eq!(requests[1].0, vec!["b".to_string()]);
        assert_eq!(
            requests[0].1,
            json!({"range": {"@timestamp": {
                "gte": 970_000,
                "lt": 1_000_000,
                "format": "epoch_millis"
            }}})
        );
    }

    #[tokio::test]
    async fn test_missing_indices_is_validation_error() {
        let backend = CountingBackend::default();
        let err = DocCountJobHandler
            .run(&job(json!({})), &backend)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(backend.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_window_rejected() {
        let backend = CountingBackend::default();
        let err = DocCountJobHandler
            .run(&job(json!({"es_indices": ["a"], "window_seconds": 0})), &backend)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_window_query_custom_field() {
        let query = DocCountJobHandler::window_query("ts", 5_000, 2).unwrap();
        assert_eq!(query["range"]["ts"]["gte"], json!(3_000));
        assert_eq!(query["range"]["ts"]["lt"], json!(5_000));
    }
}
