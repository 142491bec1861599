//! Job descriptors passed from producers to consumers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use pipewatch_core::error::AppError;
use pipewatch_core::result::AppResult;

/// Job-specific arguments, opaque to the scheduler.
pub type JobParams = Map<String, Value>;

/// One unit of scheduled work.
///
/// Built by a producer at the start of a cycle and consumed exactly once.
/// There are no mutable accessors; `params` is shared behind an `Arc`, so
/// every descriptor of the same job spec points at the same map.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    /// Time-ordered identifier used in logs.
    id: Uuid,
    /// Registry name of the job function.
    name: String,
    /// Pipeline that produced this descriptor.
    pipeline: String,
    /// Start of the producing cycle, millisecond precision.
    scheduled_time: DateTime<Utc>,
    /// Arguments copied from the job spec.
    params: Arc<JobParams>,
}

impl JobDescriptor {
    /// Create a descriptor. `scheduled_time` is truncated to milliseconds.
    pub fn new(
        name: impl Into<String>,
        pipeline: impl Into<String>,
        scheduled_time: DateTime<Utc>,
        params: Arc<JobParams>,
    ) -> Self {
        let scheduled_time =
            DateTime::<Utc>::from_timestamp_millis(scheduled_time.timestamp_millis())
                .unwrap_or(scheduled_time);

        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            pipeline: pipeline.into(),
            scheduled_time,
            params,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn scheduled_time(&self) -> DateTime<Utc> {
        self.scheduled_time
    }

    /// Scheduled time as milliseconds since the Unix epoch.
    pub fn scheduled_time_ms(&self) -> i64 {
        self.scheduled_time.timestamp_millis()
    }

    pub fn params(&self) -> &JobParams {
        &self.params
    }

    /// Deserialize an optional parameter.
    ///
    /// Returns `Ok(None)` when the key is absent and a validation error when
    /// it is present with the wrong shape.
    pub fn param<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| {
                    AppError::validation(format!(
                        "Job '{}': invalid parameter '{}': {}",
                        self.name, key, e
                    ))
                }),
        }
    }

    /// Deserialize a parameter that must be present.
    pub fn required_param<T: DeserializeOwned>(&self, key: &str) -> AppResult<T> {
        self.param(key)?.ok_or_else(|| {
            AppError::validation(format!(
                "Job '{}': missing required parameter '{}'",
                self.name, key
            ))
        })
    }
}
